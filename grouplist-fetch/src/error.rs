/// Missing or invalid wiring, reported when a coordinator is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("a fetch function is required")]
    MissingFetch,
    #[error("page size must be at least 1")]
    ZeroPageSize,
}

/// A fetch that failed. No retries are attempted; the page may be requested again.
#[derive(Debug, thiserror::Error)]
pub enum FetchError<E> {
    #[error("fetching page {page} failed")]
    Fetch {
        page: usize,
        #[source]
        source: E,
    },
}

impl<E> FetchError<E> {
    pub fn page(&self) -> usize {
        match self {
            Self::Fetch { page, .. } => *page,
        }
    }

    pub fn into_source(self) -> E {
        match self {
            Self::Fetch { source, .. } => source,
        }
    }
}
