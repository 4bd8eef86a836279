use alloc::vec::Vec;

use crate::key::GroupKey;
use crate::{CollapseSet, GroupRegistry, Row, StickyOrder, ViewRange};

/// Turns a raw row list into the rendered row order.
///
/// Two stages, both index-based so rows are never cloned:
/// 1. [`Self::with_collapsed`] drops the item blocks of collapsed groups and rebuilds the
///    [`GroupRegistry`] against the filtered list.
/// 2. [`Self::always_with_groups`] reorders the filtered list for the current [`ViewRange`] so
///    boundary groups stay visible (see [`StickyOrder`]).
#[derive(Clone, Debug)]
pub struct VisibleListBuilder<G> {
    registry: GroupRegistry<G>,
    /// Raw positions of the rows that survive collapsing.
    visible: Vec<usize>,
    group_indexes: Vec<usize>,
    sticky: StickyOrder,
}

impl<G: GroupKey> Default for VisibleListBuilder<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GroupKey> VisibleListBuilder<G> {
    pub fn new() -> Self {
        Self {
            registry: GroupRegistry::new(),
            visible: Vec::new(),
            group_indexes: Vec::new(),
            sticky: StickyOrder::new(),
        }
    }

    /// Filters out the `total` rows that follow each collapsed group, then rebuilds the registry.
    pub fn with_collapsed<T>(
        &mut self,
        raw: &[Row<T, G>],
        collapsed: &CollapseSet<G>,
        total: &dyn Fn(&G) -> usize,
    ) {
        self.visible.clear();
        self.visible.reserve(raw.len());

        let mut i = 0usize;
        while i < raw.len() {
            self.visible.push(i);
            match &raw[i] {
                Row::Group(g) if !collapsed.is_empty() && collapsed.contains(g) => {
                    i = i.saturating_add(total(g)).saturating_add(1);
                }
                _ => i += 1,
            }
        }

        self.registry
            .recompute(self.visible.iter().map(|&p| &raw[p]), total);
        self.group_indexes.clear();
        self.group_indexes.extend(self.registry.render_indexes());

        gtrace!(
            raw = raw.len(),
            visible = self.visible.len(),
            collapsed = collapsed.len(),
            "VisibleListBuilder::with_collapsed"
        );
    }

    /// Reorders the filtered list for `range`. Returns positions into [`Self::visible`].
    pub fn always_with_groups(&mut self, range: ViewRange) -> &[usize] {
        self.sticky
            .compute(self.visible.len(), &self.group_indexes, range)
    }

    pub fn registry(&self) -> &GroupRegistry<G> {
        &self.registry
    }

    /// Raw positions of the filtered list.
    pub fn visible(&self) -> &[usize] {
        &self.visible
    }

    /// Positions into [`Self::visible`] in render order, as of the last
    /// [`Self::always_with_groups`] call.
    pub fn order(&self) -> &[usize] {
        self.sticky.order()
    }

    /// Raw position of the row rendered at `render_index`.
    pub fn raw_position(&self, render_index: usize) -> Option<usize> {
        let &filtered = self.sticky.order().get(render_index)?;
        self.visible.get(filtered).copied()
    }

    pub fn clear(&mut self) {
        self.registry.clear();
        self.visible.clear();
        self.group_indexes.clear();
        self.sticky.clear();
    }
}
