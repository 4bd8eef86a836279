use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use futures_util::future::{AbortHandle, AbortRegistration};

/// Cancellation handles of in-flight pages.
///
/// Each page holds at most one handle, tagged with a ticket. A handle is consumed exactly once:
/// by [`Self::cancel`]/[`Self::cancel_all`] or by [`Self::settle`] when its fetch completes.
#[derive(Debug, Default)]
pub(crate) struct PendingPages {
    pages: BTreeMap<usize, (u64, AbortHandle)>,
    next_ticket: u64,
}

impl PendingPages {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a new fetch of `page`, cancelling a prior one for the same page.
    pub(crate) fn insert(&mut self, page: usize) -> (u64, AbortRegistration) {
        self.cancel(page);
        let (handle, registration) = AbortHandle::new_pair();
        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.pages.insert(page, (ticket, handle));
        (ticket, registration)
    }

    pub(crate) fn cancel(&mut self, page: usize) -> bool {
        match self.pages.remove(&page) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancels every in-flight page and returns them in ascending order.
    pub(crate) fn cancel_all(&mut self) -> Vec<usize> {
        let pages = core::mem::take(&mut self.pages);
        pages
            .into_iter()
            .map(|(page, (_, handle))| {
                handle.abort();
                page
            })
            .collect()
    }

    /// Consumes the handle of a completed fetch. Returns `false` when the fetch was superseded.
    pub(crate) fn settle(&mut self, page: usize, ticket: u64) -> bool {
        match self.pages.get(&page) {
            Some(&(current, _)) if current == ticket => {
                self.pages.remove(&page);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.pages.len()
    }

    pub(crate) fn contains(&self, page: usize) -> bool {
        self.pages.contains_key(&page)
    }
}
