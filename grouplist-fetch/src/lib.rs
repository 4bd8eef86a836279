//! Paged fetch coordination for the `grouplist` crate.
//!
//! The `grouplist` crate maps the visible window to `(group, page)` requests. This crate turns
//! those requests into fetches and merges the results:
//!
//! - [`PagedFetch`]: one source, one shaping (filter + ordering) at a time. Pages are fetched
//!   through a caller-supplied async function, cancelled when superseded, and merged into one
//!   accumulated array as they land.
//! - [`GroupedFetch`]: one [`PagedFetch`] per group, merged into a single row list in a fixed
//!   group order.
//! - [`Pipeline`] (`std`): a [`grouplist::GroupedList`] wired to a [`GroupedFetch`].
//!
//! Both coordinators are `futures::Stream`s and are meant to be driven by a single task. The crate
//! does not spawn anything and has no runtime dependency.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod accumulate;
mod chunk;
mod error;
mod grouped;
mod paged;
mod pending;
#[cfg(feature = "std")]
mod pipeline;

#[cfg(test)]
mod tests;

pub use accumulate::{merge_chunk, seed};
pub use chunk::{Paging, QueryChunk, Shaping};
pub use error::{BuildError, FetchError};
pub use grouped::{GroupFetcher, GroupedFetch, GroupedFetchBuilder, ItemsChangeCallback};
pub use paged::{FetchState, Fetcher, PagedFetch};
#[cfg(feature = "std")]
pub use pipeline::Pipeline;
