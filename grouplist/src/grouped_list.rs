use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::key::GroupKey;
use crate::watcher::PageWatcher;
use crate::{
    CollapseSet, ConfigError, GroupContext, GroupRegistry, GroupedListOptions, ItemContext,
    PageChange, Row, ViewRange, ViewState, VisibleListBuilder,
};

/// A headless grouped-list data source.
///
/// This type is UI-agnostic:
/// - Your adapter feeds it the raw row list (`set_items`) and the visible window
///   (`set_view_range`), and forwards collapse toggles.
/// - It exposes the rendered row order (collapsed sections removed, boundary groups kept sticky)
///   and emits page requests for what is visible through `on_page_change`.
///
/// Registry queries (`group_at`, `local_index`, ...) take indexes into the filtered list, i.e.
/// the list after collapsing and before the sticky reorder.
#[derive(Clone)]
pub struct GroupedList<T, G> {
    options: GroupedListOptions<T, G>,
    items: Vec<Row<T, G>>,
    collapsed: CollapseSet<G>,
    builder: VisibleListBuilder<G>,
    watcher: PageWatcher<G>,
    range: ViewRange,

    notify_depth: Cell<usize>,
    notify_pending: Cell<bool>,
}

impl<T, G: GroupKey> GroupedList<T, G> {
    /// Creates an empty list from options.
    pub fn new(options: GroupedListOptions<T, G>) -> Result<Self, ConfigError> {
        if options.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        gdebug!(page_size = options.page_size, "GroupedList::new");
        Ok(Self {
            watcher: PageWatcher::new(options.page_size),
            options,
            items: Vec::new(),
            collapsed: CollapseSet::new(),
            builder: VisibleListBuilder::new(),
            range: ViewRange::default(),
            notify_depth: Cell::new(0),
            notify_pending: Cell::new(false),
        })
    }

    pub fn options(&self) -> &GroupedListOptions<T, G> {
        &self.options
    }

    /// Replaces the options and rebuilds everything derived from them.
    pub fn set_options(&mut self, options: GroupedListOptions<T, G>) -> Result<(), ConfigError> {
        if options.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        let page_size_changed = options.page_size != self.options.page_size;
        let total_changed = !Arc::ptr_eq(&options.group_total, &self.options.group_total);
        self.options = options;
        gtrace!(
            page_size = self.options.page_size,
            page_size_changed,
            total_changed,
            "GroupedList::set_options"
        );

        if page_size_changed {
            self.watcher = PageWatcher::new(self.options.page_size);
        }
        if total_changed {
            self.rebuild();
        }
        if page_size_changed || total_changed {
            self.watch_pages();
        }
        self.notify();
        Ok(())
    }

    /// Clones the current options, applies `f`, then delegates to `set_options`.
    pub fn update_options(
        &mut self,
        f: impl FnOnce(&mut GroupedListOptions<T, G>),
    ) -> Result<(), ConfigError> {
        let mut next = self.options.clone();
        f(&mut next);
        self.set_options(next)
    }

    pub fn set_on_change(
        &mut self,
        on_change: Option<impl Fn(&GroupedList<T, G>) + Send + Sync + 'static>,
    ) {
        self.options.on_change = on_change.map(|f| Arc::new(f) as _);
    }

    fn notify_now(&self) {
        if let Some(cb) = &self.options.on_change {
            cb(self);
        }
    }

    fn notify(&self) {
        if self.notify_depth.get() > 0 {
            self.notify_pending.set(true);
            return;
        }
        self.notify_now();
    }

    /// Batches multiple updates into a single `on_change` notification.
    ///
    /// A typical adapter frame replaces the items and moves the window together; without
    /// batching each setter triggers `on_change`.
    pub fn batch_update(&mut self, f: impl FnOnce(&mut Self)) {
        let depth = self.notify_depth.get();
        self.notify_depth.set(depth.saturating_add(1));

        f(self);

        let depth = self.notify_depth.get();
        debug_assert!(depth > 0, "notify_depth underflow");
        let next = depth.saturating_sub(1);
        self.notify_depth.set(next);

        if next == 0 && self.notify_pending.replace(false) {
            self.notify_now();
        }
    }

    fn notify_collapsed(&self) {
        if let Some(cb) = &self.options.on_collapsed_change {
            cb(&self.collapsed);
        }
    }

    fn rebuild(&mut self) {
        self.builder
            .with_collapsed(&self.items, &self.collapsed, &*self.options.group_total);
        self.builder.always_with_groups(self.range);
    }

    fn watch_pages(&mut self) {
        self.watch_pages_with(&mut |_| {});
    }

    /// Runs the page watcher; every change goes to `sink` and to `on_page_change`.
    fn watch_pages_with(&mut self, sink: &mut dyn FnMut(PageChange<G>)) {
        let cb = self.options.on_page_change.clone();
        self.watcher.watch(
            self.range,
            self.builder.registry(),
            &self.collapsed,
            &mut |change: PageChange<G>| {
                if let Some(cb) = &cb {
                    cb(&change);
                }
                sink(change);
            },
        );
    }

    /// Replaces the raw row list (groups interleaved with their items).
    ///
    /// Collapsed groups that no longer appear in `items` are dropped from the collapsed set.
    /// Pages newly touched by the current window are requested.
    pub fn set_items(&mut self, items: Vec<Row<T, G>>) {
        gtrace!(len = items.len(), "GroupedList::set_items");
        let retained = self.collapsed.retained_in(&items);
        self.items = items;
        if retained != self.collapsed {
            gdebug!(
                before = self.collapsed.len(),
                after = retained.len(),
                "GroupedList: dropped collapsed groups no longer present"
            );
            self.collapsed = retained;
            self.notify_collapsed();
        }
        self.rebuild();
        self.watch_pages();
        self.notify();
    }

    /// The raw row list as last passed to `set_items`.
    pub fn items(&self) -> &[Row<T, G>] {
        &self.items
    }

    /// Applies a view-range update from your UI layer.
    ///
    /// Reorders the rendered rows for the new window and emits `on_page_change` for every page
    /// the window touches that the previous window did not.
    pub fn set_view_range(&mut self, range: ViewRange) {
        gtrace!(
            start = range.start,
            end = range.end,
            "GroupedList::set_view_range"
        );
        self.set_view_range_with(range, |_| {});
    }

    /// Like [`Self::set_view_range`], but also hands every page change to `f`.
    ///
    /// `on_page_change` still observes the changes.
    pub fn set_view_range_with(&mut self, range: ViewRange, mut f: impl FnMut(PageChange<G>)) {
        self.range = range;
        self.builder.always_with_groups(range);
        self.watch_pages_with(&mut f);
        self.notify();
    }

    pub fn view_range(&self) -> ViewRange {
        self.range
    }

    /// Forgets the pages requested so far and emits `on_page_change` again for every page the
    /// current window touches.
    ///
    /// Call this after the data source dropped its loaded pages, e.g. on a new filter or a
    /// reload.
    pub fn refresh_pages(&mut self) {
        gdebug!(
            start = self.range.start,
            end = self.range.end,
            "GroupedList::refresh_pages"
        );
        self.watcher.reset();
        self.watch_pages();
    }

    /// Collapses `group` if expanded, expands it if collapsed.
    ///
    /// Returns whether the group is collapsed afterwards. Groups that are not part of the
    /// current filtered list are left untouched.
    pub fn toggle(&mut self, group: &G) -> bool {
        if !self.builder.registry().contains(group) {
            gwarn!("GroupedList::toggle: unknown group");
            return self.collapsed.contains(group);
        }
        self.collapsed = self.collapsed.toggled(group);
        let collapsed = self.collapsed.contains(group);
        gtrace!(collapsed, "GroupedList::toggle");
        self.notify_collapsed();
        self.rebuild();
        self.watch_pages();
        self.notify();
        collapsed
    }

    /// Replaces the collapsed set. Groups absent from the raw list are dropped.
    pub fn set_collapsed(&mut self, collapsed: CollapseSet<G>) {
        let collapsed = collapsed.retained_in(&self.items);
        if collapsed == self.collapsed {
            return;
        }
        self.collapsed = collapsed;
        self.notify_collapsed();
        self.rebuild();
        self.watch_pages();
        self.notify();
    }

    pub fn collapsed(&self) -> &CollapseSet<G> {
        &self.collapsed
    }

    pub fn is_collapsed(&self, group: &G) -> bool {
        self.collapsed.contains(group)
    }

    /// Returns `true` for group rows of groups known to the registry.
    pub fn is_group(&self, row: &Row<T, G>) -> bool {
        row.as_group()
            .is_some_and(|g| self.builder.registry().contains(g))
    }

    pub fn registry(&self) -> &GroupRegistry<G> {
        self.builder.registry()
    }

    pub fn total(&self, group: &G) -> Option<usize> {
        self.registry().total(group)
    }

    pub fn group_start_index(&self, group: &G) -> Option<usize> {
        self.registry().group_start_index(group)
    }

    pub fn group_end_index(&self, group: &G) -> Option<usize> {
        self.registry().group_end_index(group)
    }

    pub fn group_scroll_index(&self, group: &G) -> Option<usize> {
        self.registry().group_scroll_index(group)
    }

    pub fn group_at(&self, item_index: usize) -> Option<&G> {
        self.registry().group_at(item_index)
    }

    pub fn local_index(&self, group: &G, item_index: usize) -> Option<usize> {
        self.registry().local_index(group, item_index)
    }

    /// Number of rendered rows.
    pub fn len(&self) -> usize {
        self.builder.order().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row at `render_index` of the rendered (sticky-reordered) list.
    pub fn row(&self, render_index: usize) -> Option<&Row<T, G>> {
        let pos = self.builder.raw_position(render_index)?;
        self.items.get(pos)
    }

    /// Iterates the rendered rows in render order.
    pub fn rows(&self) -> impl Iterator<Item = &Row<T, G>> {
        let visible = self.builder.visible();
        self.builder
            .order()
            .iter()
            .filter_map(move |&i| visible.get(i))
            .filter_map(|&p| self.items.get(p))
    }

    /// Iterates the rendered rows with their render index, without allocations.
    pub fn for_each_row(&self, mut f: impl FnMut(usize, &Row<T, G>)) {
        for (i, row) in self.rows().enumerate() {
            f(i, row);
        }
    }

    /// Collects the rendered rows into `out` (clears `out` first).
    pub fn collect_rows(&self, out: &mut Vec<Row<T, G>>)
    where
        T: Clone,
    {
        out.clear();
        out.reserve(self.len());
        out.extend(self.rows().cloned());
    }

    /// Number of rows in the filtered list.
    pub fn visible_len(&self) -> usize {
        self.builder.visible().len()
    }

    /// Row at `index` of the filtered list (collapsed sections removed, natural order).
    pub fn visible_row(&self, index: usize) -> Option<&Row<T, G>> {
        let &pos = self.builder.visible().get(index)?;
        self.items.get(pos)
    }

    /// Template context for a group row rendered at `render_index`.
    pub fn group_context<'a>(
        &'a self,
        group: &'a G,
        render_index: usize,
    ) -> Option<GroupContext<'a, G>> {
        let registry = self.registry();
        let entry = registry.entry(group)?;
        Some(GroupContext {
            group,
            collapsed: self.is_collapsed(group),
            index: registry.group_start_index(group)?,
            total: entry.total,
            render_index,
            render_total: self.len(),
            scroll_index: registry.group_scroll_index(group)?,
        })
    }

    /// Template context for the data row at `render_index`.
    ///
    /// Group membership is resolved against the filtered list. Rows inside the window keep their
    /// filtered position when rendered, so this matches what the adapter shows.
    pub fn item_context(&self, render_index: usize) -> ItemContext<'_, G> {
        let render_total = self.len();
        let group = self.group_at(render_index);
        let (index, total) = match group {
            Some(g) => (
                self.local_index(g, render_index).unwrap_or(0),
                self.total(g).unwrap_or(0),
            ),
            None => (render_index, render_total),
        };
        ItemContext {
            group,
            index,
            total,
            render_index,
            render_total,
        }
    }

    /// Returns a snapshot of the current window and collapsed groups.
    pub fn view_state(&self) -> ViewState<G> {
        ViewState {
            range: self.range,
            collapsed: self.collapsed.iter().cloned().collect(),
        }
    }

    /// Restores a snapshot captured with [`Self::view_state`].
    ///
    /// Collapsed groups missing from the current raw list are dropped.
    pub fn restore_view_state(&mut self, state: ViewState<G>) {
        self.batch_update(|list| {
            list.set_collapsed(state.collapsed.into_iter().collect());
            list.set_view_range(state.range);
        });
    }

    /// Tears down all derived state: rows, registry, collapsed groups, and page dedup.
    pub fn disconnect(&mut self) {
        gdebug!(
            items = self.items.len(),
            groups = self.registry().len(),
            "GroupedList::disconnect"
        );
        self.items.clear();
        self.builder.clear();
        self.watcher.reset();
        self.range = ViewRange::default();
        if !self.collapsed.is_empty() {
            self.collapsed = CollapseSet::new();
            self.notify_collapsed();
        }
        self.notify();
    }
}

impl<T, G> core::fmt::Debug for GroupedList<T, G>
where
    G: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GroupedList")
            .field("options", &self.options)
            .field("items", &self.items.len())
            .field("collapsed", &self.collapsed)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}
