// Example: incremental paged fetching for one source.
use futures::executor::block_on;
use futures::StreamExt;
use grouplist_fetch::{PagedFetch, Paging, QueryChunk};

/// A fake backend: 120 numbers, optionally keeping only even ones, ascending or descending.
async fn query(even_only: bool, descending: bool, paging: Paging) -> Result<QueryChunk<u32>, String> {
    let mut all: Vec<u32> = (0..120).filter(|n| !even_only || n % 2 == 0).collect();
    if descending {
        all.reverse();
    }
    let total = all.len();
    let items = all.into_iter().skip(paging.skip).take(paging.take).collect();
    Ok(QueryChunk::page(items, total, paging.skip))
}

fn main() {
    let Ok(mut fetch) = PagedFetch::new(25, |even: &bool, desc: &bool, paging| {
        query(*even, *desc, paging)
    }) else {
        return;
    };

    block_on(async {
        fetch.set_shaping(false, false);
        // The backend answers immediately, so the placeholder seed and page 1 arrive together.
        if let Some(Ok(items)) = fetch.next().await {
            report(&items);
        }

        fetch.request_page(3);
        if let Some(Ok(items)) = fetch.next().await {
            report(&items);
        }

        // New shaping: previously loaded pages are discarded.
        fetch.set_shaping(true, true);
        println!("seeded len={}", fetch.accumulated().len());
        if let Some(Ok(items)) = fetch.next().await {
            report(&items);
        }
    });
}

fn report(items: &[Option<u32>]) {
    let loaded = items.iter().filter(|i| i.is_some()).count();
    let head: Vec<_> = items.iter().take(5).collect();
    println!("len={} loaded={loaded} head={head:?}", items.len());
}
