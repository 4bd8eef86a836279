// Example: a grouped list wired to per-group paged fetching.
use futures::executor::block_on;
use grouplist::{GroupedList, GroupedListOptions, ViewRange};
use grouplist_fetch::{GroupedFetch, Paging, QueryChunk};

fn main() {
    let fetch = GroupedFetch::builder()
        .groups(["open", "closed"])
        .page_size(20)
        .fetch(|group: &&'static str, filter: &String, _ordering: &(), paging: Paging| {
            let group = *group;
            let filter = filter.clone();
            async move {
                let total = if group == "open" { 45 } else { 12 };
                let items: Vec<String> = (paging.skip..total.min(paging.skip + paging.take))
                    .map(|i| format!("{group} ticket {i} ({filter})"))
                    .collect();
                Ok::<_, std::convert::Infallible>(QueryChunk::page(items, total, paging.skip))
            }
        })
        .items_change(|group: &&'static str, items: &[Option<String>]| {
            println!("items_change {group}: {} slots", items.len());
        })
        .build();
    let Ok(fetch) = fetch else {
        return;
    };

    let Ok(mut pipeline) = grouplist_fetch::Pipeline::new(GroupedListOptions::ungrouped(), fetch)
    else {
        return;
    };

    block_on(async {
        pipeline.set_shaping("assigned to me".to_string(), ());
        // The backend answers immediately, so page 1 of every group replaces the loading rows
        // in the first update.
        let _ = pipeline.next_update().await;
        print_rows(pipeline.list());

        // Scrolling into "open" requests its second and third page.
        let issued = pipeline.set_view_range(ViewRange::new(15, 45));
        println!("issued {issued} fetches");
        let _ = pipeline.next_update().await;
        print_rows(pipeline.list());
    });
}

fn print_rows(list: &GroupedList<String, &'static str>) {
    let loaded = list.rows().filter(|r| r.is_item()).count();
    println!("rows={} loaded={loaded}", list.len());
    for g in list.registry().groups() {
        println!("  group {g}: total={:?}", list.total(g));
    }
}
