use alloc::vec::Vec;

/// One fetch result: `items` starting at offset `skipped` of a collection of `total` items.
///
/// `total == None` means the backend cannot tell how many items exist. A missing `skipped` marks a
/// full refresh: previously accumulated data is discarded before the chunk is merged.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryChunk<T> {
    pub items: Vec<T>,
    pub total: Option<usize>,
    pub skipped: Option<usize>,
}

impl<T> QueryChunk<T> {
    /// A full-refresh chunk: `items` are the head of a collection of `total` items.
    pub fn refresh(items: Vec<T>, total: usize) -> Self {
        Self {
            items,
            total: Some(total),
            skipped: None,
        }
    }

    /// A page chunk: `items` start at offset `skipped`.
    pub fn page(items: Vec<T>, total: usize, skipped: usize) -> Self {
        Self {
            items,
            total: Some(total),
            skipped: Some(skipped),
        }
    }
}

/// Skip/take window handed to the fetch function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Paging {
    pub skip: usize,
    pub take: usize,
}

impl Paging {
    /// Window of the 1-based `page`.
    pub fn for_page(page: usize, page_size: usize) -> Self {
        Self {
            skip: page.saturating_sub(1).saturating_mul(page_size),
            take: page_size,
        }
    }

    /// 1-based page this window starts in.
    pub fn page(&self, page_size: usize) -> usize {
        self.skip / page_size.max(1) + 1
    }
}

/// A filter + ordering combination. Every shaping change restarts fetching from page 1.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shaping<F, O> {
    pub filter: F,
    pub ordering: O,
}

impl<F, O> Shaping<F, O> {
    pub fn new(filter: F, ordering: O) -> Self {
        Self { filter, ordering }
    }
}
