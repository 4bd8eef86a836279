use alloc::vec::Vec;

use crate::emitter::PageEmitter;
use crate::key::GroupKey;
use crate::{CollapseSet, GroupEntry, GroupRegistry, PageChange, ViewRange};

/// Local offsets `[start, end]` of `entry`'s items touched by `range`, or `None` when the range
/// does not intersect the group.
///
/// Offsets follow the data-source convention: the row right after the group row is offset 0 and
/// the window is shifted by one row, so `start = range.start - render_index + 1` and
/// `end = range.end - render_index + 1`, clamped to `[0, total - 1]`.
pub fn local_span(range: ViewRange, entry: GroupEntry) -> Option<(usize, usize)> {
    let start = range.start.saturating_add(1).saturating_sub(entry.render_index);
    let end = range.end.saturating_add(1).checked_sub(entry.render_index)?;
    let last = entry.total.checked_sub(1)?;
    let end = end.min(last);
    (start < entry.total).then_some((start, end))
}

/// Maps view-range changes to page requests per visible group.
#[derive(Clone, Debug)]
pub struct PageWatcher<G> {
    page_size: usize,
    last: Vec<PageChange<G>>,
    next: Vec<PageChange<G>>,
}

impl<G: GroupKey> PageWatcher<G> {
    pub fn new(page_size: usize) -> Self {
        debug_assert!(page_size > 0, "PageWatcher: page_size must be non-zero");
        Self {
            page_size: page_size.max(1),
            last: Vec::new(),
            next: Vec::new(),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Emits the page changes for `range`.
    ///
    /// Every group of `registry` that is not collapsed is checked; an empty registry is treated
    /// as a single ungrouped source of unbounded size. Returns the number of pages the range
    /// touches (including ones suppressed as repeats of the previous call).
    pub fn watch(
        &mut self,
        range: ViewRange,
        registry: &GroupRegistry<G>,
        collapsed: &CollapseSet<G>,
        emit: &mut dyn FnMut(PageChange<G>),
    ) -> usize {
        let page_size = self.page_size;
        let touched = {
            let mut e = PageEmitter::new(&self.last, &mut self.next, emit);

            if registry.is_empty() {
                let entry = GroupEntry {
                    render_index: 0,
                    total: usize::MAX,
                };
                if let Some((start, end)) = local_span(range, entry) {
                    e.emit_span(None, start, end, page_size);
                }
            } else {
                for (group, entry) in registry.iter() {
                    if collapsed.contains(group) {
                        continue;
                    }
                    if let Some((start, end)) = local_span(range, entry) {
                        e.emit_span(Some(group), start, end, page_size);
                    }
                }
            }
            e.emitted()
        };
        core::mem::swap(&mut self.last, &mut self.next);

        gtrace!(
            start = range.start,
            end = range.end,
            pages = touched,
            "PageWatcher::watch"
        );
        touched
    }

    /// Forgets the previous batch, so the next range change re-fires every page it touches.
    pub fn reset(&mut self) {
        self.last.clear();
        self.next.clear();
    }
}
