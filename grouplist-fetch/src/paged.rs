use alloc::collections::{BTreeSet, VecDeque};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, Waker};

use futures_util::future::{Abortable, BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, Stream, StreamExt};

use crate::accumulate::{merge_chunk, seed};
use crate::pending::PendingPages;
use crate::{BuildError, FetchError, Paging, QueryChunk, Shaping};

/// Fetch function of a single source: `(filter, ordering, paging) -> chunk`.
pub type Fetcher<T, F, O, E> =
    Arc<dyn Fn(&F, &O, Paging) -> BoxFuture<'static, Result<QueryChunk<T>, E>> + Send + Sync>;

/// Coarse lifecycle of a [`PagedFetch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FetchState {
    /// Nothing in flight.
    Idle,
    /// `pages` fetches are in flight.
    Fetching { pages: usize },
    /// Torn down; the stream has ended.
    Disconnected,
}

struct Landed<T, E> {
    generation: u64,
    page: usize,
    ticket: u64,
    result: Result<QueryChunk<T>, E>,
}

type InFlight<T, E> = FuturesUnordered<Abortable<BoxFuture<'static, Landed<T, E>>>>;

/// Incremental, cancellable paged fetching for one source.
///
/// Each shaping (filter + ordering) starts a new generation: in-flight fetches are cancelled, the
/// accumulated array is replaced by placeholders sized to the previous total, and page 1 is
/// fetched. Further pages are fetched through [`Self::request_page`] and merged as they land,
/// in any order.
///
/// As a [`Stream`], yields a snapshot of the accumulated array after every change, and the error
/// of every failed fetch. Changes that land between two polls are coalesced.
pub struct PagedFetch<T, F, O, E> {
    fetch: Fetcher<T, F, O, E>,
    page_size: usize,
    shaping: Option<Shaping<F, O>>,
    generation: u64,

    requested: BTreeSet<usize>,
    pending: PendingPages,
    in_flight: InFlight<T, E>,

    accumulated: Vec<Option<T>>,
    landed: bool,
    dirty: bool,
    errors: VecDeque<FetchError<E>>,

    waker: Option<Waker>,
    disconnected: bool,
}

// Fields are never pinned in place.
impl<T, F, O, E> Unpin for PagedFetch<T, F, O, E> {}

impl<T, F, O, E> PagedFetch<T, F, O, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn new<Fut>(
        page_size: usize,
        fetch: impl Fn(&F, &O, Paging) -> Fut + Send + Sync + 'static,
    ) -> Result<Self, BuildError>
    where
        F: 'static,
        O: 'static,
        Fut: Future<Output = Result<QueryChunk<T>, E>> + Send + 'static,
    {
        let fetch: Fetcher<T, F, O, E> =
            Arc::new(move |f: &F, o: &O, paging: Paging| fetch(f, o, paging).boxed());
        Self::from_fetcher(page_size, fetch)
    }

    pub fn from_fetcher(page_size: usize, fetch: Fetcher<T, F, O, E>) -> Result<Self, BuildError> {
        if page_size == 0 {
            return Err(BuildError::ZeroPageSize);
        }
        Ok(Self {
            fetch,
            page_size,
            shaping: None,
            generation: 0,
            requested: BTreeSet::new(),
            pending: PendingPages::new(),
            in_flight: FuturesUnordered::new(),
            accumulated: Vec::new(),
            landed: false,
            dirty: false,
            errors: VecDeque::new(),
            waker: None,
            disconnected: false,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn shaping(&self) -> Option<&Shaping<F, O>> {
        self.shaping.as_ref()
    }

    /// Number of shaping changes seen so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The accumulated array of the current generation.
    pub fn accumulated(&self) -> &[Option<T>] {
        &self.accumulated
    }

    /// Whether a chunk has been merged since the last shaping change.
    pub fn has_landed(&self) -> bool {
        self.landed
    }

    pub fn is_requested(&self, page: usize) -> bool {
        self.requested.contains(&page)
    }

    pub fn is_in_flight(&self, page: usize) -> bool {
        self.pending.contains(page)
    }

    pub fn state(&self) -> FetchState {
        if self.disconnected {
            return FetchState::Disconnected;
        }
        match self.pending.len() {
            0 => FetchState::Idle,
            pages => FetchState::Fetching { pages },
        }
    }

    fn wake(&mut self) {
        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
    }

    /// Cancels everything in flight and forgets those pages.
    fn cancel_all(&mut self) {
        let cancelled = self.pending.cancel_all();
        for page in &cancelled {
            self.requested.remove(page);
        }
        self.in_flight = FuturesUnordered::new();
        if !cancelled.is_empty() {
            fdebug!(pages = ?cancelled, "PagedFetch: cancelled in-flight pages");
        }
    }

    /// Starts a new generation for `filter` + `ordering` and fetches page 1.
    ///
    /// The accumulated array is replaced by placeholders sized to the previous total, which keeps
    /// the scroll height stable while the first page loads.
    pub fn set_shaping(&mut self, filter: F, ordering: O) {
        if self.disconnected {
            fwarn!("PagedFetch::set_shaping after disconnect");
            return;
        }
        self.generation = self.generation.wrapping_add(1);
        self.cancel_all();
        self.requested.clear();

        let previous_total = self.accumulated.len();
        self.accumulated = seed(previous_total);
        self.landed = false;
        self.dirty = true;
        self.shaping = Some(Shaping::new(filter, ordering));
        fdebug!(
            generation = self.generation,
            previous_total,
            "PagedFetch::set_shaping"
        );

        self.requested.insert(1);
        self.issue(1);
    }

    /// Requests a 1-based `page` under the current shaping.
    ///
    /// Pages already requested in this generation are ignored. Page 1 restarts the generation's
    /// fetching: every other in-flight page is cancelled and forgotten. Any other page only
    /// supersedes a prior request for the same page.
    ///
    /// Returns `true` if a fetch was issued.
    pub fn request_page(&mut self, page: usize) -> bool {
        if self.disconnected || self.shaping.is_none() {
            return false;
        }
        if page == 0 {
            fwarn!("PagedFetch::request_page: pages are 1-based");
            return false;
        }
        if !self.requested.insert(page) {
            return false;
        }
        if page == 1 {
            self.cancel_all();
            self.requested.clear();
            self.requested.insert(1);
        }
        self.issue(page);
        true
    }

    /// Fetches page 1 again, keeping the accumulated array until it lands.
    pub fn reload(&mut self) -> bool {
        self.requested.remove(&1);
        self.request_page(1)
    }

    fn issue(&mut self, page: usize) {
        let Some(shaping) = &self.shaping else {
            return;
        };
        let paging = Paging::for_page(page, self.page_size);
        let (ticket, registration) = self.pending.insert(page);
        let generation = self.generation;

        let fetch = (self.fetch)(&shaping.filter, &shaping.ordering, paging);
        let landed = fetch
            .map(move |result| Landed {
                generation,
                page,
                ticket,
                result,
            })
            .boxed();
        self.in_flight.push(Abortable::new(landed, registration));

        ftrace!(
            generation,
            page,
            skip = paging.skip,
            take = paging.take,
            "PagedFetch: issued"
        );
        self.wake();
    }

    fn on_landed(&mut self, landed: Landed<T, E>) {
        let Landed {
            generation,
            page,
            ticket,
            result,
        } = landed;
        if generation != self.generation || !self.pending.settle(page, ticket) {
            fwarn!(page, generation, "PagedFetch: superseded completion dropped");
            return;
        }

        match result {
            Ok(chunk) => {
                ftrace!(
                    page,
                    items = chunk.items.len(),
                    total = ?chunk.total,
                    skipped = ?chunk.skipped,
                    "PagedFetch: merging chunk"
                );
                merge_chunk(&mut self.accumulated, chunk);
                self.landed = true;
                self.dirty = true;
            }
            Err(source) => {
                fdebug!(page, "PagedFetch: fetch failed");
                self.requested.remove(&page);
                self.errors.push_back(FetchError::Fetch { page, source });
            }
        }
    }

    /// Cancels everything, releases every handle and ends the stream.
    pub fn disconnect(&mut self) {
        fdebug!(
            generation = self.generation,
            in_flight = self.pending.len(),
            "PagedFetch::disconnect"
        );
        self.cancel_all();
        self.requested.clear();
        self.accumulated.clear();
        self.errors.clear();
        self.shaping = None;
        self.landed = false;
        self.dirty = false;
        self.disconnected = true;
        self.wake();
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl<T, F, O, E> Stream for PagedFetch<T, F, O, E>
where
    T: Clone + Send + 'static,
    E: Send + 'static,
{
    type Item = Result<Vec<Option<T>>, FetchError<E>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.disconnected {
            return Poll::Ready(None);
        }
        this.waker = Some(cx.waker().clone());

        while let Poll::Ready(Some(outcome)) = this.in_flight.poll_next_unpin(cx) {
            match outcome {
                Ok(landed) => this.on_landed(landed),
                // Cancelled before it settled.
                Err(_aborted) => {}
            }
        }

        if this.dirty {
            this.dirty = false;
            return Poll::Ready(Some(Ok(this.accumulated.clone())));
        }
        if let Some(err) = this.errors.pop_front() {
            return Poll::Ready(Some(Err(err)));
        }
        Poll::Pending
    }
}

impl<T, F, O, E> core::fmt::Debug for PagedFetch<T, F, O, E>
where
    F: core::fmt::Debug,
    O: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PagedFetch")
            .field("page_size", &self.page_size)
            .field("shaping", &self.shaping)
            .field("generation", &self.generation)
            .field("requested", &self.requested)
            .field("in_flight", &self.pending.len())
            .field("accumulated", &self.accumulated.len())
            .field("disconnected", &self.disconnected)
            .finish_non_exhaustive()
    }
}
