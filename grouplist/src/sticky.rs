use alloc::vec::Vec;

use crate::ViewRange;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mark {
    Stay,
    Before,
    After,
}

/// Splits the sorted group indexes into the top-sticky run `groups[..before]` and the
/// bottom-sticky run `groups[after..]`.
///
/// The top run holds every group at or above `range.start`, extended with groups that would
/// otherwise be displaced in front of the run once it is placed at `start`. The bottom run holds
/// every group past `range.end`, extended the same way towards the window. A group is never in
/// both runs (`before <= after`).
pub fn sticky_runs(groups: &[usize], range: ViewRange) -> (usize, usize) {
    debug_assert!(
        groups.windows(2).all(|w| w[0] < w[1]),
        "sticky_runs: group indexes must be strictly increasing"
    );

    let mut before = groups.partition_point(|&g| g <= range.start);
    while before < groups.len() && groups[before] <= range.start.saturating_add(before) {
        before += 1;
    }

    let mut after = groups.partition_point(|&g| g <= range.end).max(before);
    while after > before {
        let run = groups.len() - after;
        let g = groups[after - 1];
        if g >= range.end.saturating_sub(run) && g <= range.end {
            after -= 1;
        } else {
            break;
        }
    }

    (before, after)
}

/// Computes the render order that keeps boundary groups visible at the window edges.
///
/// The order is a permutation of `0..len`: the top run is placed as a contiguous block starting
/// at `range.start`, the bottom run as a contiguous block ending at `range.end`. Non-group rows
/// keep their relative order. Targets past the end of the list are clamped to the end.
/// Buffers are reused across calls; each call is linear in `len`.
#[derive(Clone, Debug, Default)]
pub struct StickyOrder {
    order: Vec<usize>,
    scratch: Vec<usize>,
    marks: Vec<Mark>,
}

impl StickyOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the order for a list of `len` rows with group rows at `groups` (ascending).
    pub fn compute(&mut self, len: usize, groups: &[usize], range: ViewRange) -> &[usize] {
        self.order.clear();
        self.order.extend(0..len);

        let (before, after) = sticky_runs(groups, range);

        self.marks.clear();
        self.marks.resize(len, Mark::Stay);
        for &g in &groups[..before] {
            if let Some(m) = self.marks.get_mut(g) {
                *m = Mark::Before;
            }
        }
        for &g in &groups[after..] {
            if let Some(m) = self.marks.get_mut(g) {
                *m = Mark::After;
            }
        }

        if before > 0 {
            relocate(
                &mut self.order,
                &mut self.scratch,
                &self.marks,
                Mark::Before,
                range.start,
            );
        }
        let run = groups.len() - after;
        if run > 0 {
            // A window too short for both runs stacks the bottom run right under the top run.
            let to = range
                .end
                .saturating_sub(run)
                .max(range.start.saturating_add(before));
            relocate(
                &mut self.order,
                &mut self.scratch,
                &self.marks,
                Mark::After,
                to,
            );
        }

        gtrace!(
            len,
            top = before,
            bottom = run,
            start = range.start,
            end = range.end,
            "StickyOrder::compute"
        );
        &self.order
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.scratch.clear();
        self.marks.clear();
    }
}

/// Moves every entry marked `mark` into one block placed at `to` of the remaining entries.
fn relocate(
    order: &mut Vec<usize>,
    scratch: &mut Vec<usize>,
    marks: &[Mark],
    mark: Mark,
    to: usize,
) {
    scratch.clear();
    let mut rest = 0usize;
    let mut placed = false;
    for &i in order.iter() {
        if marks[i] == mark {
            continue;
        }
        if rest == to && !placed {
            scratch.extend(order.iter().copied().filter(|&j| marks[j] == mark));
            placed = true;
        }
        scratch.push(i);
        rest += 1;
    }
    if !placed {
        scratch.extend(order.iter().copied().filter(|&j| marks[j] == mark));
    }
    core::mem::swap(order, scratch);
}
