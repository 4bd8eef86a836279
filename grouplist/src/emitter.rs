use alloc::vec::Vec;

use crate::PageChange;

/// Helper that forwards page changes while enforcing the dedup contract:
/// - Pages below 1 are ignored (and debug-asserted).
/// - A `(group, page)` pair that was part of the previous batch is not re-fired.
/// - Duplicates within the current batch are ignored.
///
/// Every accepted or suppressed pair is recorded into `current`, which becomes the `previous`
/// batch of the next range change.
pub struct PageEmitter<'a, G> {
    previous: &'a [PageChange<G>],
    current: &'a mut Vec<PageChange<G>>,
    emit: &'a mut dyn FnMut(PageChange<G>),
}

impl<'a, G: PartialEq + Clone> PageEmitter<'a, G> {
    pub fn new(
        previous: &'a [PageChange<G>],
        current: &'a mut Vec<PageChange<G>>,
        emit: &'a mut dyn FnMut(PageChange<G>),
    ) -> Self {
        current.clear();
        Self {
            previous,
            current,
            emit,
        }
    }

    pub fn emit(&mut self, change: PageChange<G>) {
        if change.page == 0 {
            gwarn!("PageEmitter: pages are 1-based");
            debug_assert!(change.page > 0, "PageEmitter: pages are 1-based");
            return;
        }
        if self.current.contains(&change) {
            return;
        }
        let repeated = self.previous.contains(&change);
        self.current.push(change.clone());
        if !repeated {
            (self.emit)(change);
        }
    }

    /// Emits every page of `group` touched by the local offsets `[start, end]`.
    pub fn emit_span(&mut self, group: Option<&G>, start: usize, end: usize, page_size: usize) {
        let first = start / page_size + 1;
        let last = end / page_size + 1;
        for page in first..=last {
            self.emit(PageChange {
                group: group.cloned(),
                page,
            });
        }
    }

    pub fn emitted(&self) -> usize {
        self.current.len()
    }
}
