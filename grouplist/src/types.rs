/// One row of a grouped list: a group heading, a data item, or an unfetched slot.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Row<T, G> {
    Group(G),
    Item(T),
    /// A slot whose data has not been fetched yet.
    Placeholder,
}

impl<T, G> Row<T, G> {
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    pub fn is_item(&self) -> bool {
        matches!(self, Self::Item(_))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    pub fn as_group(&self) -> Option<&G> {
        match self {
            Self::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_item(&self) -> Option<&T> {
        match self {
            Self::Item(t) => Some(t),
            _ => None,
        }
    }
}

impl<T, G> From<Option<T>> for Row<T, G> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(item) => Self::Item(item),
            None => Self::Placeholder,
        }
    }
}

/// The index window of the rendered list currently shown by the UI.
///
/// The host decides whether `end` is inclusive or exclusive; all computations in this crate use
/// the raw numbers as given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewRange {
    pub start: usize,
    pub end: usize,
}

impl ViewRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// A unit of fetch demand: `page` (1-based) of `group`, or of the whole source when ungrouped.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageChange<G> {
    pub group: Option<G>,
    pub page: usize,
}

/// Registry record for one group of the filtered list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupEntry {
    /// Index of the group row in the filtered (collapsed sections removed) list.
    pub render_index: usize,
    /// Caller-reported number of items in the group.
    pub total: usize,
}
