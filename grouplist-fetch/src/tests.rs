use crate::*;

use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::error::Error;
use core::future::Future;
use core::task::{Context, Poll};
use std::sync::Mutex;

use futures::channel::oneshot;
use futures::task::noop_waker_ref;
use futures::{FutureExt, Stream, StreamExt};
use grouplist::{PageChange, Row};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("backend unavailable")]
struct Backend;

type Reply = oneshot::Sender<Result<QueryChunk<u32>, Backend>>;

struct Call {
    group: Option<u32>,
    filter: u8,
    paging: Paging,
    reply: Reply,
}

impl Call {
    fn ok(self, chunk: QueryChunk<u32>) {
        let _ = self.reply.send(Ok(chunk));
    }
}

/// Records every fetch and lets the test resolve it later.
#[derive(Clone, Default)]
struct Server {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Server {
    fn call(
        &self,
        group: Option<u32>,
        filter: u8,
        paging: Paging,
    ) -> impl Future<Output = Result<QueryChunk<u32>, Backend>> + Send + use<> {
        let (reply, rx) = oneshot::channel();
        self.calls.lock().unwrap().push(Call {
            group,
            filter,
            paging,
            reply,
        });
        rx.map(|r| r.unwrap_or(Err(Backend)))
    }

    fn take(&self) -> Vec<Call> {
        core::mem::take(&mut *self.calls.lock().unwrap())
    }

    fn take_one(&self) -> Call {
        let mut calls = self.take();
        assert_eq!(calls.len(), 1, "expected exactly one fetch");
        calls.remove(0)
    }
}

fn paged(server: &Server, page_size: usize) -> PagedFetch<u32, u8, u8, Backend> {
    let server = server.clone();
    PagedFetch::new(page_size, move |f: &u8, _: &u8, paging| {
        server.call(None, *f, paging)
    })
    .unwrap()
}

fn grouped(server: &Server, groups: &[u32], page_size: usize) -> GroupedFetch<u32, u32, u8, u8, Backend> {
    let server = server.clone();
    GroupedFetch::builder()
        .groups(groups.iter().copied())
        .page_size(page_size)
        .fetch(move |g: &u32, f: &u8, _: &u8, paging| server.call(Some(*g), *f, paging))
        .build()
        .unwrap()
}

fn poll<S: Stream + Unpin>(s: &mut S) -> Poll<Option<S::Item>> {
    let mut cx = Context::from_waker(noop_waker_ref());
    s.poll_next_unpin(&mut cx)
}

fn ready_ok<S, V>(s: &mut S) -> V
where
    S: Stream<Item = Result<V, FetchError<Backend>>> + Unpin,
{
    match poll(s) {
        Poll::Ready(Some(Ok(v))) => v,
        Poll::Ready(Some(Err(err))) => panic!("unexpected error: {err}"),
        Poll::Ready(None) => panic!("stream ended"),
        Poll::Pending => panic!("no update"),
    }
}

fn items(range: core::ops::Range<u32>) -> Vec<u32> {
    range.collect()
}

#[test]
fn merge_replaces_slots_and_pads_to_total() {
    let mut acc: Vec<Option<u32>> = (0..150).map(Some).collect();
    let dropped = merge_chunk(&mut acc, QueryChunk::page(items(1000..1010), 200, 40));

    assert_eq!(dropped, 0);
    assert_eq!(acc.len(), 200);
    assert!(acc[..40].iter().zip(0..).all(|(v, i)| *v == Some(i)));
    assert_eq!(&acc[40..50], &items(1000..1010).into_iter().map(Some).collect::<Vec<_>>()[..]);
    assert!(acc[50..150].iter().zip(50..).all(|(v, i)| *v == Some(i)));
    assert!(acc[150..].iter().all(Option::is_none));
}

#[test]
fn merge_without_skipped_discards_previous_data() {
    let mut acc: Vec<Option<u32>> = (1..=5).map(Some).collect();
    merge_chunk(&mut acc, QueryChunk::refresh(vec![9], 3));
    assert_eq!(acc, vec![Some(9), None, None]);

    let mut acc: Vec<Option<u32>> = (1..=5).map(Some).collect();
    merge_chunk(&mut acc, QueryChunk::page(vec![9], 5, 0));
    assert_eq!(acc, vec![Some(9), Some(2), Some(3), Some(4), Some(5)]);
}

#[test]
fn merge_truncates_on_shrink_and_drops_overflow() {
    let mut acc: Vec<Option<u32>> = (0..10).map(Some).collect();
    merge_chunk(&mut acc, QueryChunk::page(vec![], 4, 0));
    assert_eq!(acc, vec![Some(0), Some(1), Some(2), Some(3)]);

    let mut acc = seed::<u32>(0);
    let dropped = merge_chunk(&mut acc, QueryChunk::page(vec![7, 8, 9], 3, 2));
    assert_eq!(dropped, 2);
    assert_eq!(acc, vec![None, None, Some(7)]);
}

#[test]
fn merge_with_indeterminate_total_grows_to_fit() {
    let mut acc = seed::<u32>(2);
    let chunk = QueryChunk {
        items: vec![1, 2, 3],
        total: None,
        skipped: Some(4),
    };
    merge_chunk(&mut acc, chunk);
    assert_eq!(acc, vec![None, None, None, None, Some(1), Some(2), Some(3)]);

    let chunk = QueryChunk {
        items: vec![5],
        total: None,
        skipped: Some(0),
    };
    merge_chunk(&mut acc, chunk);
    assert_eq!(acc.len(), 7);
    assert_eq!(acc[0], Some(5));
}

#[test]
fn paging_for_page() {
    assert_eq!(Paging::for_page(1, 50), Paging { skip: 0, take: 50 });
    assert_eq!(Paging::for_page(3, 50), Paging { skip: 100, take: 50 });
    assert_eq!(Paging::for_page(3, 50).page(50), 3);
}

#[test]
fn pending_pages_settle_once() {
    let mut pending = pending::PendingPages::new();
    let (stale, stale_reg) = pending.insert(2);
    let (current, _reg) = pending.insert(2);
    assert_eq!(pending.len(), 1);

    // The superseded registration was aborted.
    let aborted = futures::future::Abortable::new(futures::future::ready(1), stale_reg);
    assert!(matches!(aborted.now_or_never(), Some(Err(_))));

    assert!(!pending.settle(2, stale));
    assert!(pending.settle(2, current));
    assert!(!pending.settle(2, current));
    assert!(!pending.cancel(2));

    pending.insert(4);
    pending.insert(1);
    assert_eq!(pending.cancel_all(), vec![1, 4]);
    assert_eq!(pending.len(), 0);
}

#[test]
fn zero_page_size_is_rejected() {
    let fetch = PagedFetch::<u32, u8, u8, Backend>::new(0, |_: &u8, _: &u8, _| async {
        Ok(QueryChunk::refresh(Vec::new(), 0))
    });
    assert!(matches!(fetch, Err(BuildError::ZeroPageSize)));
}

#[test]
fn shaping_fetches_first_page_and_emits_seed() {
    let server = Server::default();
    let mut fetch = paged(&server, 10);
    assert_eq!(fetch.state(), FetchState::Idle);
    assert!(poll(&mut fetch).is_pending());
    assert!(!fetch.request_page(2));

    fetch.set_shaping(0, 0);
    assert_eq!(fetch.state(), FetchState::Fetching { pages: 1 });
    let first = server.take_one();
    assert_eq!(first.paging, Paging { skip: 0, take: 10 });
    assert_eq!(first.group, None);

    assert!(ready_ok(&mut fetch).is_empty());
    assert!(poll(&mut fetch).is_pending());

    first.ok(QueryChunk::refresh(items(0..10), 25));
    let acc = ready_ok(&mut fetch);
    assert_eq!(acc.len(), 25);
    assert_eq!(acc[9], Some(9));
    assert_eq!(acc[10], None);
    assert_eq!(fetch.state(), FetchState::Idle);
    assert!(fetch.has_landed());
    assert!(poll(&mut fetch).is_pending());
}

#[test]
fn requested_pages_are_not_reissued() {
    let server = Server::default();
    let mut fetch = paged(&server, 10);
    fetch.set_shaping(0, 0);
    server.take();

    assert!(fetch.request_page(2));
    assert!(!fetch.request_page(2));
    assert!(!fetch.request_page(1));
    assert!(fetch.request_page(3));
    assert!(!fetch.request_page(0));

    let skips: Vec<usize> = server.take().iter().map(|c| c.paging.skip).collect();
    assert_eq!(skips, vec![10, 20]);
    assert_eq!(fetch.state(), FetchState::Fetching { pages: 3 });
}

#[test]
fn first_page_cancels_pending_page_before_it_lands() {
    let server = Server::default();
    let mut fetch = paged(&server, 10);
    fetch.set_shaping(0, 0);
    server
        .take_one()
        .ok(QueryChunk::refresh(items(0..10), 100));
    ready_ok(&mut fetch);

    assert!(fetch.request_page(2));
    let page2 = server.take_one();
    assert_eq!(page2.paging, Paging { skip: 10, take: 10 });
    assert!(poll(&mut fetch).is_pending());

    assert!(fetch.reload());
    assert!(!fetch.is_in_flight(2));
    assert!(!fetch.is_requested(2));
    let reload = server.take_one();
    assert_eq!(reload.paging.skip, 0);

    page2.ok(QueryChunk::page(items(110..120), 100, 10));
    assert!(poll(&mut fetch).is_pending());
    assert!(fetch.accumulated()[10..20].iter().all(Option::is_none));

    reload.ok(QueryChunk::refresh(items(0..10), 100));
    let acc = ready_ok(&mut fetch);
    assert_eq!(acc.len(), 100);
    assert!(acc[10..20].iter().all(Option::is_none));
}

#[test]
fn first_page_cancels_settled_but_unpolled_page() {
    let server = Server::default();
    let mut fetch = paged(&server, 10);
    fetch.set_shaping(0, 0);
    server
        .take_one()
        .ok(QueryChunk::refresh(items(0..10), 100));
    ready_ok(&mut fetch);

    assert!(fetch.request_page(2));
    // Resolved before the coordinator ever polls it.
    server
        .take_one()
        .ok(QueryChunk::page(items(110..120), 100, 10));
    assert!(fetch.reload());
    let _reload = server.take_one();

    assert!(poll(&mut fetch).is_pending());
    assert!(fetch.accumulated()[10..20].iter().all(Option::is_none));
    assert_eq!(fetch.state(), FetchState::Fetching { pages: 1 });
}

#[test]
fn completions_merge_out_of_order() {
    let server = Server::default();
    let mut fetch = paged(&server, 10);
    fetch.set_shaping(0, 0);
    server.take_one().ok(QueryChunk::refresh(items(0..10), 30));
    ready_ok(&mut fetch);

    fetch.request_page(2);
    fetch.request_page(3);
    let mut calls = server.take().into_iter();
    let (page2, page3) = (calls.next().unwrap(), calls.next().unwrap());

    page3.ok(QueryChunk::page(items(20..30), 30, 20));
    let acc = ready_ok(&mut fetch);
    assert_eq!(acc[25], Some(25));
    assert_eq!(acc[15], None);

    page2.ok(QueryChunk::page(items(10..20), 30, 10));
    let acc = ready_ok(&mut fetch);
    assert_eq!(acc, items(0..30).into_iter().map(Some).collect::<Vec<_>>());
}

#[test]
fn failed_page_is_reported_and_can_be_requested_again() {
    let server = Server::default();
    let mut fetch = paged(&server, 10);
    fetch.set_shaping(0, 0);
    server.take_one().ok(QueryChunk::refresh(items(0..10), 30));
    ready_ok(&mut fetch);

    fetch.request_page(2);
    let _ = server.take_one().reply.send(Err(Backend));
    match poll(&mut fetch) {
        Poll::Ready(Some(Err(err))) => {
            assert_eq!(err.page(), 2);
            assert_eq!(err.to_string(), "fetching page 2 failed");
            assert!(err.source().is_some());
            assert_eq!(err.into_source(), Backend);
        }
        _ => panic!("expected a fetch error"),
    }
    assert!(poll(&mut fetch).is_pending());
    assert_eq!(fetch.accumulated().len(), 30);

    assert!(!fetch.is_requested(2));
    assert!(fetch.request_page(2));
    assert_eq!(server.take_one().paging.skip, 10);
}

#[test]
fn shaping_change_seeds_previous_total_and_drops_stale_pages() {
    let server = Server::default();
    let mut fetch = paged(&server, 10);
    fetch.set_shaping(0, 0);
    server.take_one().ok(QueryChunk::refresh(items(0..10), 30));
    ready_ok(&mut fetch);
    fetch.request_page(2);
    let stale = server.take_one();

    fetch.set_shaping(1, 0);
    assert_eq!(fetch.generation(), 2);
    assert_eq!(fetch.shaping(), Some(&Shaping::new(1, 0)));
    let first = server.take_one();
    assert_eq!((first.filter, first.paging.skip), (1, 0));

    stale.ok(QueryChunk::page(items(10..20), 30, 10));
    assert_eq!(ready_ok(&mut fetch), vec![None; 30]);
    assert!(!fetch.has_landed());
    assert!(poll(&mut fetch).is_pending());
    assert!(fetch.request_page(2));
}

#[test]
fn disconnect_releases_handles_and_ends_stream() {
    let server = Server::default();
    let mut fetch = paged(&server, 10);
    fetch.set_shaping(0, 0);
    let call = server.take_one();

    fetch.disconnect();
    assert_eq!(fetch.state(), FetchState::Disconnected);
    assert!(call.reply.is_canceled());
    assert!(matches!(poll(&mut fetch), Poll::Ready(None)));
    assert!(!fetch.request_page(2));
    assert!(fetch.accumulated().is_empty());

    fetch.set_shaping(1, 1);
    assert!(server.take().is_empty());
}

#[test]
fn grouped_emits_loading_rows_then_merges_in_fixed_order() {
    let server = Server::default();
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let sink_server = server.clone();
    let mut fetch = GroupedFetch::<u32, u32, u8, u8, Backend>::builder()
        .groups([1, 2])
        .page_size(10)
        .fetch(move |g: &u32, f: &u8, _: &u8, paging| sink_server.call(Some(*g), *f, paging))
        .items_change(move |g: &u32, items: &[Option<u32>]| {
            sink.lock().unwrap().push((*g, items.len()));
        })
        .build()
        .unwrap();

    fetch.set_shaping(0, 0);
    let mut calls = server.take().into_iter();
    let (g1, g2) = (calls.next().unwrap(), calls.next().unwrap());
    assert_eq!((g1.group, g2.group), (Some(1), Some(2)));

    assert_eq!(
        ready_ok(&mut fetch),
        vec![Row::Group(1), Row::Placeholder, Row::Group(2), Row::Placeholder]
    );
    assert!(poll(&mut fetch).is_pending());

    g2.ok(QueryChunk::refresh(vec![20, 21], 2));
    assert_eq!(
        ready_ok(&mut fetch),
        vec![
            Row::Group(1),
            Row::Placeholder,
            Row::Group(2),
            Row::Item(20),
            Row::Item(21)
        ]
    );

    g1.ok(QueryChunk::refresh(vec![10], 3));
    let rows = ready_ok(&mut fetch);
    assert_eq!(
        rows,
        vec![
            Row::Group(1),
            Row::Item(10),
            Row::Placeholder,
            Row::Placeholder,
            Row::Group(2),
            Row::Item(20),
            Row::Item(21)
        ]
    );
    assert_eq!(fetch.merged(), rows);
    assert_eq!(fetch.rows_for(&1).map(<[_]>::len), Some(3));
    assert_eq!(*log.lock().unwrap(), vec![(1, 0), (2, 0), (2, 2), (1, 3)]);
}

#[test]
fn grouped_empty_group_drops_loading_row_once_landed() {
    let server = Server::default();
    let mut fetch = grouped(&server, &[1], 10);
    fetch.set_shaping(0, 0);
    ready_ok(&mut fetch);

    server.take_one().ok(QueryChunk::refresh(Vec::new(), 0));
    assert_eq!(ready_ok(&mut fetch), vec![Row::Group(1)]);
}

#[test]
fn grouped_routes_page_changes_by_group() {
    let server = Server::default();
    let mut fetch = grouped(&server, &[1, 2], 5);
    fetch.set_shaping(0, 0);
    server.take();

    assert!(fetch.request(&PageChange {
        group: Some(2),
        page: 2
    }));
    assert!(!fetch.request(&PageChange {
        group: None,
        page: 2
    }));
    assert!(!fetch.request(&PageChange {
        group: Some(9),
        page: 1
    }));

    let call = server.take_one();
    assert_eq!(call.group, Some(2));
    assert_eq!(call.paging, Paging { skip: 5, take: 5 });
    assert_eq!(fetch.state(&2), Some(FetchState::Fetching { pages: 2 }));
    assert_eq!(fetch.state(&9), None);
    assert!(fetch.is_fetching());
}

#[test]
fn grouped_builder_validates_wiring() {
    let missing = GroupedFetch::<u32, u32, u8, u8, Backend>::builder()
        .groups([1])
        .build();
    assert!(matches!(missing, Err(BuildError::MissingFetch)));

    let zero = GroupedFetchBuilder::<u32, u32, u8, u8, Backend>::new()
        .page_size(0)
        .fetch(|_: &u32, _: &u8, _: &u8, _| async { Ok(QueryChunk::refresh(Vec::new(), 0)) })
        .build();
    assert!(matches!(zero, Err(BuildError::ZeroPageSize)));

    let server = Server::default();
    let fetch = grouped(&server, &[3, 1, 3, 2], 10);
    assert_eq!(fetch.groups().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
}

#[test]
fn grouped_disconnect_ends_stream() {
    let server = Server::default();
    let mut fetch = grouped(&server, &[1, 2], 10);
    fetch.set_shaping(0, 0);
    let calls = server.take();
    ready_ok(&mut fetch);

    fetch.disconnect();
    assert!(calls.iter().all(|c| c.reply.is_canceled()));
    assert!(matches!(poll(&mut fetch), Poll::Ready(None)));
    assert!(!fetch.request(&PageChange {
        group: Some(1),
        page: 2
    }));
}

#[cfg(feature = "std")]
#[test]
fn pipeline_feeds_fetched_rows_back_into_the_list() {
    use grouplist::{GroupedListOptions, ViewRange};

    let server = Server::default();
    let mut pipeline =
        Pipeline::new(GroupedListOptions::ungrouped(), grouped(&server, &[1, 2], 10)).unwrap();
    assert_eq!(pipeline.list().options().page_size, 10);
    let mut cx = Context::from_waker(noop_waker_ref());

    assert_eq!(pipeline.set_shaping(0, 0), 0);
    let mut calls = server.take().into_iter();
    let (g1, g2) = (calls.next().unwrap(), calls.next().unwrap());

    assert!(matches!(
        pipeline.poll_update(&mut cx),
        Poll::Ready(Some(Ok(())))
    ));
    assert_eq!(pipeline.list().items().len(), 4);
    assert_eq!(pipeline.list().total(&1), Some(1));

    g1.ok(QueryChunk::refresh(items(0..10), 40));
    g2.ok(QueryChunk::refresh(items(100..105), 5));
    let update = futures::executor::block_on(pipeline.next_update());
    assert!(matches!(update, Some(Ok(()))));
    assert_eq!(pipeline.list().items().len(), 47);
    assert_eq!(pipeline.list().total(&1), Some(40));
    assert_eq!(pipeline.list().total(&2), Some(5));

    // Pages 2 and 3 of group 1; page 1 is already loaded.
    assert_eq!(pipeline.set_view_range(ViewRange::new(0, 25)), 2);
    let skips: Vec<(Option<u32>, usize)> = server
        .take()
        .iter()
        .map(|c| (c.group, c.paging.skip))
        .collect();
    assert_eq!(skips, vec![(Some(1), 10), (Some(1), 20)]);

    assert!(pipeline.toggle(&1));
    assert_eq!(pipeline.list().len(), 7);

    pipeline.disconnect();
    assert!(pipeline.list().is_empty());
    assert!(matches!(pipeline.poll_update(&mut cx), Poll::Ready(None)));
}

#[cfg(feature = "std")]
#[test]
fn pipeline_refetches_visible_pages_after_shaping_change() {
    use futures::executor::block_on;
    use grouplist::{GroupedListOptions, ViewRange};

    fn requests(server: &Server) -> Vec<(Option<u32>, u8, usize)> {
        server
            .take()
            .iter()
            .map(|c| (c.group, c.filter, c.paging.skip))
            .collect()
    }

    fn visible_items(pipeline: &Pipeline<u32, u32, u8, u8, Backend>) -> Vec<u32> {
        pipeline.list().items()[1..26]
            .iter()
            .filter_map(|row| match row {
                Row::Item(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    let server = Server::default();
    let mut pipeline =
        Pipeline::new(GroupedListOptions::ungrouped(), grouped(&server, &[1, 2], 10)).unwrap();

    pipeline.set_shaping(0, 0);
    let mut calls = server.take().into_iter();
    let (g1, g2) = (calls.next().unwrap(), calls.next().unwrap());
    g1.ok(QueryChunk::refresh(items(0..10), 40));
    g2.ok(QueryChunk::refresh(items(100..105), 5));
    assert!(matches!(block_on(pipeline.next_update()), Some(Ok(()))));

    assert_eq!(pipeline.set_view_range(ViewRange::new(0, 25)), 2);
    let mut calls = server.take().into_iter();
    let (p2, p3) = (calls.next().unwrap(), calls.next().unwrap());
    p2.ok(QueryChunk::page(items(10..20), 40, 10));
    p3.ok(QueryChunk::page(items(20..30), 40, 20));
    assert!(matches!(block_on(pipeline.next_update()), Some(Ok(()))));
    assert_eq!(visible_items(&pipeline), items(0..25));

    // Pages 2 and 3 are still on screen and are fetched under the new filter.
    assert_eq!(pipeline.set_shaping(1, 0), 2);
    assert_eq!(
        requests(&server),
        vec![
            (Some(1), 1, 0),
            (Some(2), 1, 0),
            (Some(1), 1, 10),
            (Some(1), 1, 20)
        ]
    );

    // Page 1 of every group again, then the rest of the window.
    assert_eq!(pipeline.reload(), 2);
    let mut calls = server.take().into_iter();
    assert_eq!(calls.len(), 4);
    let (g1, g2) = (calls.next().unwrap(), calls.next().unwrap());
    let (p2, p3) = (calls.next().unwrap(), calls.next().unwrap());
    assert_eq!((g1.paging.skip, g2.group, p2.paging.skip, p3.paging.skip), (0, Some(2), 10, 20));

    g1.ok(QueryChunk::refresh(items(200..210), 40));
    g2.ok(QueryChunk::refresh(items(300..305), 5));
    assert!(matches!(block_on(pipeline.next_update()), Some(Ok(()))));
    p2.ok(QueryChunk::page(items(210..220), 40, 10));
    p3.ok(QueryChunk::page(items(220..230), 40, 20));
    assert!(matches!(block_on(pipeline.next_update()), Some(Ok(()))));
    assert_eq!(visible_items(&pipeline), items(200..225));
}
