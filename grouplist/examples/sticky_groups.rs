// Example: sticky group rows and collapsing.
use grouplist::{GroupedList, GroupedListOptions, Row, ViewRange};

fn main() {
    let sizes = [("fruit", 40usize), ("vegetables", 25), ("grains", 60)];

    let mut rows = Vec::new();
    for (group, n) in sizes {
        rows.push(Row::Group(group));
        rows.extend((0..n).map(|i| Row::Item(format!("{group} #{i}"))));
    }

    let opts = GroupedListOptions::new(move |g: &&str| {
        sizes
            .iter()
            .find(|(name, _)| name == g)
            .map_or(0, |&(_, n)| n)
    });
    let Ok(mut list) = GroupedList::new(opts) else {
        return;
    };
    list.set_items(rows);

    // A UI showing 20 rows, scrolled into the middle of "fruit".
    list.set_view_range(ViewRange::new(30, 50));
    print_window(&list);

    // Collapsing "fruit" hides its 40 rows; the other groups move up.
    list.toggle(&"fruit");
    list.set_view_range(ViewRange::new(0, 20));
    print_window(&list);

    println!(
        "collapsed={:?} rows={} scroll_to(grains)={:?}",
        list.collapsed().iter().collect::<Vec<_>>(),
        list.len(),
        list.group_scroll_index(&"grains"),
    );
}

fn print_window(list: &GroupedList<String, &'static str>) {
    let range = list.view_range();
    println!("window {}..{}", range.start, range.end);
    for i in range.start..range.end.min(list.len()) {
        match list.row(i) {
            Some(Row::Group(g)) => println!("  [{i:>3}] == {g} =="),
            Some(Row::Item(item)) => println!("  [{i:>3}] {item}"),
            Some(Row::Placeholder) | None => println!("  [{i:>3}] ..."),
        }
    }
}
