// Example: mapping view ranges to page requests.
use grouplist::{GroupedList, GroupedListOptions, PageChange, Row, ViewRange};

fn main() {
    let opts = GroupedListOptions::new(|_: &u32| 150)
        .with_page_size(50)
        .with_on_page_change(Some(|c: &PageChange<u32>| {
            println!("  fetch group={:?} page={}", c.group, c.page);
        }));
    let Ok(mut list) = GroupedList::new(opts) else {
        return;
    };

    // Three groups of 150 placeholder rows each.
    let mut rows = Vec::new();
    for g in 0..3u32 {
        rows.push(Row::<(), u32>::Group(g));
        rows.extend(std::iter::repeat_n(Row::Placeholder, 150));
    }

    println!("set_items");
    list.set_items(rows);

    for (start, end) in [(0, 30), (10, 40), (140, 170), (0, 30)] {
        println!("view {start}..{end}");
        list.set_view_range(ViewRange::new(start, end));
    }
}
