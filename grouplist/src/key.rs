#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::HashMap;

/// Group identity → position in the registry's ordered entry list.
#[cfg(feature = "std")]
pub(crate) type GroupSlotMap<G> = HashMap<G, usize>;
#[cfg(not(feature = "std"))]
pub(crate) type GroupSlotMap<G> = BTreeMap<G, usize>;

/// Bound for group identities.
///
/// Groups are tracked by value, so a group must keep the same identity across emissions of the
/// raw list. Recreating group values with different identity on every emission breaks collapse
/// tracking and page routing.
#[cfg(feature = "std")]
pub trait GroupKey: core::hash::Hash + Eq + Clone {}
#[cfg(feature = "std")]
impl<G: core::hash::Hash + Eq + Clone> GroupKey for G {}

#[cfg(not(feature = "std"))]
pub trait GroupKey: Ord + Clone {}
#[cfg(not(feature = "std"))]
impl<G: Ord + Clone> GroupKey for G {}
