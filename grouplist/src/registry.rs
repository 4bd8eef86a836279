use alloc::vec::Vec;

use crate::key::{GroupKey, GroupSlotMap};
use crate::{GroupEntry, Row};

/// Per-group bookkeeping for the current filtered list.
///
/// Entries are kept in render order, so iteration order always matches the order in which the
/// group rows appear in the list and `render_index` is strictly increasing.
#[derive(Clone, Debug)]
pub struct GroupRegistry<G> {
    entries: Vec<(G, GroupEntry)>,
    slots: GroupSlotMap<G>,
}

impl<G: GroupKey> Default for GroupRegistry<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GroupKey> GroupRegistry<G> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            slots: GroupSlotMap::<G>::new(),
        }
    }

    /// Rebuilds the registry from `rows` in a single pass.
    ///
    /// `total` is the caller's group-size function; sibling rows are never counted.
    pub fn recompute<'a, T: 'a>(
        &mut self,
        rows: impl IntoIterator<Item = &'a Row<T, G>>,
        total: &dyn Fn(&G) -> usize,
    ) where
        G: 'a,
    {
        self.clear();
        for (render_index, row) in rows.into_iter().enumerate() {
            let Row::Group(group) = row else {
                continue;
            };
            if self.slots.contains_key(group) {
                gwarn!(render_index, "GroupRegistry: duplicate group row ignored");
                continue;
            }
            self.slots.insert(group.clone(), self.entries.len());
            self.entries.push((
                group.clone(),
                GroupEntry {
                    render_index,
                    total: total(group),
                },
            ));
        }
        gtrace!(groups = self.entries.len(), "GroupRegistry::recompute");
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, group: &G) -> bool {
        self.slots.contains_key(group)
    }

    pub fn entry(&self, group: &G) -> Option<GroupEntry> {
        self.slots.get(group).map(|&slot| self.entries[slot].1)
    }

    pub fn total(&self, group: &G) -> Option<usize> {
        self.entry(group).map(|e| e.total)
    }

    pub fn render_index(&self, group: &G) -> Option<usize> {
        self.entry(group).map(|e| e.render_index)
    }

    /// Position of `group` among all groups (0 for the first group).
    pub fn group_start_index(&self, group: &G) -> Option<usize> {
        self.slots.get(group).copied()
    }

    /// Distance of `group` from the last group (0 for the last group).
    pub fn group_end_index(&self, group: &G) -> Option<usize> {
        let start = self.group_start_index(group)?;
        Some(self.entries.len() - 1 - start)
    }

    /// Scroll target for `group`: its render index minus the number of group rows stacked above
    /// it while sticky.
    pub fn group_scroll_index(&self, group: &G) -> Option<usize> {
        let slot = *self.slots.get(group)?;
        Some(self.entries[slot].1.render_index.saturating_sub(slot))
    }

    /// Returns the group owning the data row at `item_index`.
    ///
    /// A row belongs to a group when `render_index < item_index <= render_index + total`.
    pub fn group_at(&self, item_index: usize) -> Option<&G> {
        // Last group whose row precedes `item_index`.
        let after = self
            .entries
            .partition_point(|(_, e)| e.render_index < item_index);
        let (group, entry) = self.entries.get(after.checked_sub(1)?)?;
        (item_index <= entry.render_index.saturating_add(entry.total)).then_some(group)
    }

    /// Zero-based position of the row at `item_index` inside `group`.
    pub fn local_index(&self, group: &G, item_index: usize) -> Option<usize> {
        let entry = self.entry(group)?;
        item_index.checked_sub(entry.render_index)?.checked_sub(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&G, GroupEntry)> {
        self.entries.iter().map(|(g, e)| (g, *e))
    }

    pub fn groups(&self) -> impl Iterator<Item = &G> {
        self.entries.iter().map(|(g, _)| g)
    }

    /// Render indexes of all groups, ascending.
    pub fn render_indexes(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|(_, e)| e.render_index)
    }
}
