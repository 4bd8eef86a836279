use alloc::sync::Arc;

use crate::grouped_list::GroupedList;
use crate::{CollapseSet, PageChange};

/// Default number of items per fetch page.
pub const DEFAULT_PAGE_SIZE: usize = 500;

/// Caller-supplied number of items in a group.
pub type GroupTotalFn<G> = Arc<dyn Fn(&G) -> usize + Send + Sync>;

/// A callback fired for every page change produced by a view-range update.
pub type OnPageChangeCallback<G> = Arc<dyn Fn(&PageChange<G>) + Send + Sync>;

/// A callback fired when the collapsed set changes, either through a toggle or because a
/// collapsed group disappeared from the raw list.
pub type OnCollapsedChangeCallback<G> = Arc<dyn Fn(&CollapseSet<G>) + Send + Sync>;

/// A callback fired when the rendered rows change.
pub type OnChangeCallback<T, G> = Arc<dyn Fn(&GroupedList<T, G>) + Send + Sync>;

/// Configuration for [`crate::GroupedList`].
///
/// Like the list itself this is cheap to clone: closures are stored in `Arc`s.
pub struct GroupedListOptions<T, G> {
    /// Number of items in a group. Only consulted for group rows.
    pub group_total: GroupTotalFn<G>,
    /// Items per page when mapping view ranges to page requests.
    pub page_size: usize,
    pub on_page_change: Option<OnPageChangeCallback<G>>,
    pub on_collapsed_change: Option<OnCollapsedChangeCallback<G>>,
    pub on_change: Option<OnChangeCallback<T, G>>,
}

impl<T, G> Clone for GroupedListOptions<T, G> {
    fn clone(&self) -> Self {
        Self {
            group_total: Arc::clone(&self.group_total),
            page_size: self.page_size,
            on_page_change: self.on_page_change.clone(),
            on_collapsed_change: self.on_collapsed_change.clone(),
            on_change: self.on_change.clone(),
        }
    }
}

impl<T, G> GroupedListOptions<T, G> {
    /// Creates options for a grouped source.
    ///
    /// `group_total(g)` must return the number of rows that follow the group row of `g` in the
    /// raw list. It is called on every rebuild, never cached across raw-list emissions.
    pub fn new(group_total: impl Fn(&G) -> usize + Send + Sync + 'static) -> Self {
        Self {
            group_total: Arc::new(group_total),
            page_size: DEFAULT_PAGE_SIZE,
            on_page_change: None,
            on_collapsed_change: None,
            on_change: None,
        }
    }

    /// Creates options for a source without group rows.
    pub fn ungrouped() -> Self {
        Self::new(|_| 0)
    }

    pub fn with_group_total(
        mut self,
        group_total: impl Fn(&G) -> usize + Send + Sync + 'static,
    ) -> Self {
        self.group_total = Arc::new(group_total);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_on_page_change(
        mut self,
        on_page_change: Option<impl Fn(&PageChange<G>) + Send + Sync + 'static>,
    ) -> Self {
        self.on_page_change = on_page_change.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_collapsed_change(
        mut self,
        on_collapsed_change: Option<impl Fn(&CollapseSet<G>) + Send + Sync + 'static>,
    ) -> Self {
        self.on_collapsed_change = on_collapsed_change.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_change(
        mut self,
        on_change: Option<impl Fn(&GroupedList<T, G>) + Send + Sync + 'static>,
    ) -> Self {
        self.on_change = on_change.map(|f| Arc::new(f) as _);
        self
    }
}

impl<T, G> core::fmt::Debug for GroupedListOptions<T, G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GroupedListOptions")
            .field("page_size", &self.page_size)
            .field("on_page_change", &self.on_page_change.is_some())
            .field("on_collapsed_change", &self.on_collapsed_change.is_some())
            .field("on_change", &self.on_change.is_some())
            .finish_non_exhaustive()
    }
}
