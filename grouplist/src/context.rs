/// Everything a group row template needs, computed at render time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupContext<'a, G> {
    pub group: &'a G,
    pub collapsed: bool,
    /// Position among groups.
    pub index: usize,
    /// Number of items in the group.
    pub total: usize,
    /// Index of the row in the rendered list.
    pub render_index: usize,
    /// Number of rows in the rendered list.
    pub render_total: usize,
    /// Scroll target that brings the group to the top below the stacked sticky rows above it.
    pub scroll_index: usize,
}

/// Everything a data row template needs, computed at render time.
///
/// When the row belongs to a group, `index`/`total` are local to that group; otherwise they
/// are the rendered index and count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemContext<'a, G> {
    pub group: Option<&'a G>,
    pub index: usize,
    pub total: usize,
    pub render_index: usize,
    pub render_total: usize,
}
