use alloc::vec::Vec;

use crate::ViewRange;

/// A lightweight, serializable snapshot of the user-facing list state.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`. Fetched data is not
/// part of the snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewState<G> {
    pub range: ViewRange,
    /// Collapsed groups, in collapse order.
    pub collapsed: Vec<G>,
}

impl<G> Default for ViewState<G> {
    fn default() -> Self {
        Self {
            range: ViewRange::default(),
            collapsed: Vec::new(),
        }
    }
}
