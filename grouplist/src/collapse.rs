use alloc::vec::Vec;

use crate::Row;
use crate::key::GroupKey;

/// The set of collapsed groups, in the order they were collapsed.
///
/// Updates are immutable: [`CollapseSet::toggled`] and [`CollapseSet::retained_in`] return new
/// sets, which lets owners compare before/after and notify only on real changes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollapseSet<G> {
    groups: Vec<G>,
}

impl<G> Default for CollapseSet<G> {
    fn default() -> Self {
        Self { groups: Vec::new() }
    }
}

impl<G: GroupKey> CollapseSet<G> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, group: &G) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &G> {
        self.groups.iter()
    }

    /// Returns a new set with `group` added if absent, removed if present.
    pub fn toggled(&self, group: &G) -> Self {
        let mut groups = self.groups.clone();
        if let Some(pos) = groups.iter().position(|g| g == group) {
            groups.remove(pos);
        } else {
            groups.push(group.clone());
        }
        Self { groups }
    }

    /// Returns the subset of groups that still appear as group rows in `rows`.
    pub fn retained_in<T>(&self, rows: &[Row<T, G>]) -> Self {
        let groups = self
            .groups
            .iter()
            .filter(|&g| rows.iter().any(|r| r.as_group() == Some(g)))
            .cloned()
            .collect();
        Self { groups }
    }
}

impl<G: GroupKey> FromIterator<G> for CollapseSet<G> {
    fn from_iter<I: IntoIterator<Item = G>>(iter: I) -> Self {
        let mut set = Self::new();
        for group in iter {
            if !set.contains(&group) {
                set.groups.push(group);
            }
        }
        set
    }
}
