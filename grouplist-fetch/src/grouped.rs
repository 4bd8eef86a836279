use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{Stream, StreamExt};
use grouplist::{GroupKey, PageChange, Row};

use crate::paged::Fetcher;
use crate::{BuildError, FetchError, FetchState, PagedFetch, Paging, QueryChunk};

/// Fetch function of a grouped source: `(group, filter, ordering, paging) -> chunk`.
pub type GroupFetcher<T, G, F, O, E> =
    Arc<dyn Fn(&G, &F, &O, Paging) -> BoxFuture<'static, Result<QueryChunk<T>, E>> + Send + Sync>;

/// Called with a group's accumulated array every time that group updates.
///
/// Updates are the group's stream snapshots: chunks that land between two polls produce a
/// single call.
pub type ItemsChangeCallback<T, G> = Arc<dyn Fn(&G, &[Option<T>]) + Send + Sync>;

struct Lane<T, G, F, O, E> {
    group: G,
    fetch: PagedFetch<T, F, O, E>,
    /// `None` while the group shows its loading row.
    rows: Option<Vec<Option<T>>>,
    done: bool,
}

/// One [`PagedFetch`] per group, merged into a single row list in a fixed group order.
///
/// As a [`Stream`], the first poll yields a loading row (`[Group(g), Placeholder]`) for every
/// group; afterwards every update yields the merged list
/// `[Group(g1), ..g1 rows, Group(g2), ..g2 rows, ...]`. Group order is the order given to the
/// builder and never depends on which fetch lands first.
pub struct GroupedFetch<T, G, F, O, E> {
    lanes: Vec<Lane<T, G, F, O, E>>,
    items_change: Option<ItemsChangeCallback<T, G>>,
    page_size: usize,
    started: bool,
    dirty: bool,
    errors: VecDeque<FetchError<E>>,
    disconnected: bool,
}

// Fields are never pinned in place.
impl<T, G, F, O, E> Unpin for GroupedFetch<T, G, F, O, E> {}

/// Builder for [`GroupedFetch`].
pub struct GroupedFetchBuilder<T, G, F, O, E> {
    groups: Vec<G>,
    page_size: usize,
    fetch: Option<GroupFetcher<T, G, F, O, E>>,
    items_change: Option<ItemsChangeCallback<T, G>>,
}

impl<T, G, F, O, E> Default for GroupedFetchBuilder<T, G, F, O, E> {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            page_size: grouplist::DEFAULT_PAGE_SIZE,
            fetch: None,
            items_change: None,
        }
    }
}

impl<T, G, F, O, E> GroupedFetchBuilder<T, G, F, O, E>
where
    T: Send + 'static,
    G: GroupKey + Send + Sync + 'static,
    F: 'static,
    O: 'static,
    E: Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups in display order. Duplicates are ignored.
    pub fn groups(mut self, groups: impl IntoIterator<Item = G>) -> Self {
        for group in groups {
            if self.groups.contains(&group) {
                fwarn!("GroupedFetchBuilder: duplicate group ignored");
                continue;
            }
            self.groups.push(group);
        }
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn fetch<Fut>(
        mut self,
        fetch: impl Fn(&G, &F, &O, Paging) -> Fut + Send + Sync + 'static,
    ) -> Self
    where
        Fut: Future<Output = Result<QueryChunk<T>, E>> + Send + 'static,
    {
        let fetch: GroupFetcher<T, G, F, O, E> =
            Arc::new(move |g: &G, f: &F, o: &O, paging: Paging| fetch(g, f, o, paging).boxed());
        self.fetch = Some(fetch);
        self
    }

    pub fn items_change(mut self, f: impl Fn(&G, &[Option<T>]) + Send + Sync + 'static) -> Self {
        self.items_change = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Result<GroupedFetch<T, G, F, O, E>, BuildError> {
        let fetch = self.fetch.ok_or(BuildError::MissingFetch)?;
        if self.page_size == 0 {
            return Err(BuildError::ZeroPageSize);
        }

        let mut lanes = Vec::with_capacity(self.groups.len());
        for group in self.groups {
            let fetch = Arc::clone(&fetch);
            let key = group.clone();
            let per_group: Fetcher<T, F, O, E> =
                Arc::new(move |f: &F, o: &O, paging: Paging| fetch(&key, f, o, paging));
            lanes.push(Lane {
                group,
                fetch: PagedFetch::from_fetcher(self.page_size, per_group)?,
                rows: None,
                done: false,
            });
        }
        fdebug!(
            groups = lanes.len(),
            page_size = self.page_size,
            "GroupedFetchBuilder::build"
        );

        Ok(GroupedFetch {
            lanes,
            items_change: self.items_change,
            page_size: self.page_size,
            started: false,
            dirty: false,
            errors: VecDeque::new(),
            disconnected: false,
        })
    }
}

impl<T, G, F, O, E> GroupedFetch<T, G, F, O, E>
where
    T: Send + 'static,
    G: GroupKey,
    E: Send + 'static,
{
    pub fn builder() -> GroupedFetchBuilder<T, G, F, O, E> {
        GroupedFetchBuilder::default()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Groups in display order.
    pub fn groups(&self) -> impl Iterator<Item = &G> {
        self.lanes.iter().map(|lane| &lane.group)
    }

    fn lane(&self, group: &G) -> Option<&Lane<T, G, F, O, E>> {
        self.lanes.iter().find(|lane| &lane.group == group)
    }

    fn lane_mut(&mut self, group: &G) -> Option<&mut Lane<T, G, F, O, E>> {
        self.lanes.iter_mut().find(|lane| &lane.group == group)
    }

    /// The coordinator of `group`.
    pub fn group_fetch(&self, group: &G) -> Option<&PagedFetch<T, F, O, E>> {
        self.lane(group).map(|lane| &lane.fetch)
    }

    /// Accumulated array of `group`.
    pub fn rows_for(&self, group: &G) -> Option<&[Option<T>]> {
        self.lane(group).map(|lane| lane.fetch.accumulated())
    }

    pub fn state(&self, group: &G) -> Option<FetchState> {
        self.lane(group).map(|lane| lane.fetch.state())
    }

    /// `true` while any group has a fetch in flight.
    pub fn is_fetching(&self) -> bool {
        self.lanes
            .iter()
            .any(|lane| matches!(lane.fetch.state(), FetchState::Fetching { .. }))
    }

    /// Applies a shaping to every group.
    pub fn set_shaping(&mut self, filter: F, ordering: O)
    where
        F: Clone,
        O: Clone,
    {
        if self.disconnected {
            return;
        }
        fdebug!(groups = self.lanes.len(), "GroupedFetch::set_shaping");
        for lane in &mut self.lanes {
            lane.fetch.set_shaping(filter.clone(), ordering.clone());
        }
    }

    /// Routes a page change to its group. Ungrouped changes and unknown groups are ignored.
    ///
    /// Returns `true` if a fetch was issued.
    pub fn request(&mut self, change: &PageChange<G>) -> bool {
        let Some(group) = &change.group else {
            return false;
        };
        match self.lane_mut(group) {
            Some(lane) => lane.fetch.request_page(change.page),
            None => {
                fwarn!(page = change.page, "GroupedFetch::request: unknown group");
                false
            }
        }
    }

    /// Fetches page 1 of every group again.
    pub fn reload(&mut self) {
        for lane in &mut self.lanes {
            lane.fetch.reload();
        }
    }

    /// Disconnects every group and ends the stream.
    pub fn disconnect(&mut self) {
        fdebug!(groups = self.lanes.len(), "GroupedFetch::disconnect");
        for lane in &mut self.lanes {
            lane.fetch.disconnect();
            lane.rows = None;
            lane.done = true;
        }
        self.errors.clear();
        self.dirty = false;
        self.disconnected = true;
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    /// The current merged rows, loading rows included.
    pub fn merged(&self) -> Vec<Row<T, G>>
    where
        T: Clone,
    {
        let mut out = Vec::new();
        for lane in &self.lanes {
            out.push(Row::Group(lane.group.clone()));
            match &lane.rows {
                None => out.push(Row::Placeholder),
                Some(rows) => out.extend(rows.iter().cloned().map(Row::from)),
            }
        }
        out
    }
}

impl<T, G, F, O, E> Stream for GroupedFetch<T, G, F, O, E>
where
    T: Clone + Send + 'static,
    G: GroupKey,
    E: Send + 'static,
{
    type Item = Result<Vec<Row<T, G>>, FetchError<E>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.disconnected {
            return Poll::Ready(None);
        }
        if !this.started {
            this.started = true;
            this.dirty = true;
        }

        for lane in this.lanes.iter_mut().filter(|lane| !lane.done) {
            loop {
                match lane.fetch.poll_next_unpin(cx) {
                    Poll::Ready(Some(Ok(items))) => {
                        if let Some(cb) = &this.items_change {
                            cb(&lane.group, &items);
                        }
                        // An empty seed keeps the loading row.
                        if items.is_empty() && lane.rows.is_none() && !lane.fetch.has_landed() {
                            continue;
                        }
                        lane.rows = Some(items);
                        this.dirty = true;
                    }
                    Poll::Ready(Some(Err(err))) => this.errors.push_back(err),
                    Poll::Ready(None) => {
                        lane.done = true;
                        break;
                    }
                    Poll::Pending => break,
                }
            }
        }

        if this.dirty {
            this.dirty = false;
            return Poll::Ready(Some(Ok(this.merged())));
        }
        if let Some(err) = this.errors.pop_front() {
            return Poll::Ready(Some(Err(err)));
        }
        Poll::Pending
    }
}

impl<T, G, F, O, E> core::fmt::Debug for GroupedFetch<T, G, F, O, E>
where
    G: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GroupedFetch")
            .field("groups", &self.lanes.iter().map(|l| &l.group).collect::<Vec<_>>())
            .field("page_size", &self.page_size)
            .field("started", &self.started)
            .field("disconnected", &self.disconnected)
            .finish_non_exhaustive()
    }
}
