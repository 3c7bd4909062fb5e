//! enumerate: pages of the workspace, one listing batch at a time.
//!
//! The enumerator holds only the cursor, not the store, so the caller can walk each
//! batch's pages with the same store before asking for the next batch. Persisting
//! `PageBatch::next_cursor` after a batch is the caller's job (see `migrate`).

use anyhow::{Context, Result};
use log::debug;

use crate::store::{DocumentStore, PageRef};

/// One listing response.
#[derive(Clone, Debug)]
pub struct PageBatch {
    /// Cursor this batch was requested with (None = first batch).
    pub start_cursor: Option<String>,
    pub pages: Vec<PageRef>,
    /// Cursor of the following batch; None when this was the last one.
    pub next_cursor: Option<String>,
}

impl PageBatch {
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

#[derive(Debug)]
pub struct PageEnumerator {
    cursor: Option<String>,
    done: bool,
    batches: u64,
}

impl PageEnumerator {
    /// Start at `cursor` (None = beginning of the listing).
    pub fn new(cursor: Option<String>) -> Self {
        Self {
            cursor,
            done: false,
            batches: 0,
        }
    }

    /// Fetch the next batch; Ok(None) once the listing is exhausted.
    pub fn next_batch<S: DocumentStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Result<Option<PageBatch>> {
        if self.done {
            return Ok(None);
        }
        let start_cursor = self.cursor.clone();
        let listing = store.list_pages(start_cursor.as_deref()).with_context(|| {
            format!(
                "list pages (cursor {})",
                start_cursor.as_deref().unwrap_or("<start>")
            )
        })?;

        let next_cursor = if listing.continues() {
            listing.next_cursor
        } else {
            None
        };
        self.done = next_cursor.is_none();
        self.cursor = next_cursor.clone();
        self.batches += 1;
        debug!(
            "page batch #{}: {} page(s), next cursor {:?}",
            self.batches,
            listing.items.len(),
            next_cursor
        );

        Ok(Some(PageBatch {
            start_cursor,
            pages: listing.items,
            next_cursor,
        }))
    }

    pub fn batches_fetched(&self) -> u64 {
        self.batches
    }
}
