//! A headless grouped-list data source for virtualized views.
//!
//! For paged fetching of group items, see the `grouplist-fetch` crate.
//!
//! This crate focuses on the windowing side of a grouped list: hiding the items of collapsed
//! groups, keeping the group rows that own the visible rows on screen (sticky headers), and
//! mapping the visible window to `(group, page)` requests.
//!
//! It is UI-agnostic. A TUI/GUI layer is expected to provide:
//! - the raw row list (group rows followed by their items)
//! - the visible index window, re-reported on scroll and resize
//! - the number of items per group
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod builder;
mod collapse;
mod context;
mod emitter;
mod error;
mod grouped_list;
mod key;
mod options;
mod registry;
mod state;
mod sticky;
mod types;
mod watcher;


pub use builder::VisibleListBuilder;
pub use collapse::CollapseSet;
pub use context::{GroupContext, ItemContext};
pub use emitter::PageEmitter;
pub use error::ConfigError;
pub use grouped_list::GroupedList;
pub use key::GroupKey;
pub use options::{
    DEFAULT_PAGE_SIZE, GroupTotalFn, GroupedListOptions, OnChangeCallback,
    OnCollapsedChangeCallback, OnPageChangeCallback,
};
pub use registry::GroupRegistry;
pub use state::ViewState;
pub use sticky::{StickyOrder, sticky_runs};
pub use types::{GroupEntry, PageChange, Row, ViewRange};
pub use watcher::{PageWatcher, local_span};
