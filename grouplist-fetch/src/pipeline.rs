use std::collections::HashMap;
use std::future::poll_fn;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::task::{Context, Poll};
use std::vec::Vec;

use futures_util::stream::StreamExt;
use grouplist::{
    CollapseSet, ConfigError, GroupKey, GroupedList, GroupedListOptions, PageChange, Row,
    ViewRange,
};

use crate::{FetchError, GroupedFetch};

/// A framework-neutral pipeline that connects a [`GroupedList`] to a [`GroupedFetch`].
///
/// This type does not hold any UI objects. Adapters drive it by calling:
/// - `set_view_range` / `toggle` when UI events occur
/// - `set_shaping` when the filter or ordering changes
/// - `next_update` (or `poll_update`) from the task that owns the pipeline
///
/// Page changes of the list are forwarded to the fetch coordinator, and every merged update is
/// fed back into the list as its raw rows. Group sizes are taken from the fetched arrays.
pub struct Pipeline<T, G, F, O, E> {
    list: GroupedList<T, G>,
    fetch: GroupedFetch<T, G, F, O, E>,
    totals: Arc<RwLock<HashMap<G, usize>>>,
    outbox: Arc<Mutex<Vec<PageChange<G>>>>,
}

impl<T, G, F, O, E> Pipeline<T, G, F, O, E>
where
    T: Clone + Send + 'static,
    G: GroupKey + Send + Sync + 'static,
    E: Send + 'static,
{
    /// Wires `options` to `fetch`.
    ///
    /// `options.group_total` is replaced by the fetched group sizes and `options.page_size` by
    /// the page size of `fetch`; `options.on_page_change` still observes every page change.
    pub fn new(
        options: GroupedListOptions<T, G>,
        fetch: GroupedFetch<T, G, F, O, E>,
    ) -> Result<Self, ConfigError> {
        let totals: Arc<RwLock<HashMap<G, usize>>> = Arc::default();
        let outbox: Arc<Mutex<Vec<PageChange<G>>>> = Arc::default();

        let observer = options.on_page_change.clone();
        if options.page_size != fetch.page_size() {
            fdebug!(
                list = options.page_size,
                fetch = fetch.page_size(),
                "Pipeline::new: using the fetch page size"
            );
        }
        let options = options
            .with_page_size(fetch.page_size())
            .with_group_total({
                let totals = Arc::clone(&totals);
                move |g: &G| {
                    let totals = totals.read().unwrap_or_else(PoisonError::into_inner);
                    totals.get(g).copied().unwrap_or(0)
                }
            })
            .with_on_page_change(Some({
                let outbox = Arc::clone(&outbox);
                move |change: &PageChange<G>| {
                    if let Some(cb) = &observer {
                        cb(change);
                    }
                    outbox
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(change.clone());
                }
            }));

        Ok(Self {
            list: GroupedList::new(options)?,
            fetch,
            totals,
            outbox,
        })
    }

    pub fn list(&self) -> &GroupedList<T, G> {
        &self.list
    }

    pub fn fetch(&self) -> &GroupedFetch<T, G, F, O, E> {
        &self.fetch
    }

    pub fn fetch_mut(&mut self) -> &mut GroupedFetch<T, G, F, O, E> {
        &mut self.fetch
    }

    /// Forwards queued page changes to the fetch coordinator. Returns the number of fetches
    /// issued.
    fn forward(&mut self) -> usize {
        let changes =
            std::mem::take(&mut *self.outbox.lock().unwrap_or_else(PoisonError::into_inner));
        changes
            .iter()
            .filter(|change| self.fetch.request(change))
            .count()
    }

    /// Call this when the UI reports a new visible window.
    pub fn set_view_range(&mut self, range: ViewRange) -> usize {
        self.list.set_view_range(range);
        self.forward()
    }

    pub fn toggle(&mut self, group: &G) -> bool {
        let collapsed = self.list.toggle(group);
        self.forward();
        collapsed
    }

    pub fn set_collapsed(&mut self, collapsed: CollapseSet<G>) {
        self.list.set_collapsed(collapsed);
        self.forward();
    }

    /// Restarts fetching for a new filter + ordering.
    ///
    /// Every page the current window touches is requested again. Returns the number of fetches
    /// issued besides the first pages.
    pub fn set_shaping(&mut self, filter: F, ordering: O) -> usize
    where
        F: Clone,
        O: Clone,
    {
        self.fetch.set_shaping(filter, ordering);
        self.list.refresh_pages();
        self.forward()
    }

    /// Fetches page 1 of every group again, then the other pages of the current window.
    pub fn reload(&mut self) -> usize {
        self.fetch.reload();
        self.list.refresh_pages();
        self.forward()
    }

    fn apply(&mut self, rows: Vec<Row<T, G>>) {
        {
            let mut totals = self.totals.write().unwrap_or_else(PoisonError::into_inner);
            totals.clear();
            let mut current: Option<&G> = None;
            for row in &rows {
                match row {
                    Row::Group(g) => {
                        totals.entry(g.clone()).or_insert(0);
                        current = Some(g);
                    }
                    _ => {
                        if let Some(g) = current {
                            *totals.entry(g.clone()).or_insert(0) += 1;
                        }
                    }
                }
            }
        }
        self.list.set_items(rows);
        self.forward();
    }

    /// Polls the fetch coordinator and applies at most one update to the list.
    ///
    /// Returns `Ready(None)` once the pipeline is disconnected.
    pub fn poll_update(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<(), FetchError<E>>>> {
        match self.fetch.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(rows))) => {
                self.apply(rows);
                Poll::Ready(Some(Ok(())))
            }
            Poll::Ready(Some(Err(err))) => Poll::Ready(Some(Err(err))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }

    /// Waits for the next fetch update and applies it to the list.
    pub async fn next_update(&mut self) -> Option<Result<(), FetchError<E>>> {
        poll_fn(|cx| self.poll_update(cx)).await
    }

    /// Tears down the list and the fetch coordinator.
    pub fn disconnect(&mut self) {
        self.fetch.disconnect();
        self.list.disconnect();
        self.totals
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<T, G, F, O, E> std::fmt::Debug for Pipeline<T, G, F, O, E>
where
    G: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("list", &self.list)
            .field("fetch", &self.fetch)
            .finish_non_exhaustive()
    }
}
