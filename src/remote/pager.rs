//! Lazy, restartable metadata listing
//!
//! The pager asks the store for one page per call to
//! [`MetadataPager::next_page`], following continuation tokens until the
//! store reports the last page. A failed call leaves the pager where it was,
//! so calling again continues from the same token.

use super::{MetadataPage, RemoteError, RemoteStore};
use std::sync::Arc;
use tracing::debug;

/// Page-by-page cursor over a recursive metadata listing
pub struct MetadataPager {
    store: Arc<dyn RemoteStore>,
    prefix: String,
    page_size: usize,
    token: Option<String>,
    finished: bool,
    pages: usize,
}

impl MetadataPager {
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>, prefix: impl Into<String>, page_size: usize) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            page_size,
            token: None,
            finished: false,
            pages: 0,
        }
    }

    /// Fetch the next page, or `None` once the listing is exhausted
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the store call fails or the store hands back
    /// the token it was given, which would never terminate.
    pub async fn next_page(&mut self) -> Result<Option<MetadataPage>, RemoteError> {
        if self.finished {
            return Ok(None);
        }

        let page = self
            .store
            .list_metadata_page(&self.prefix, self.page_size, self.token.clone())
            .await?;

        if page.next_token.is_some() && page.next_token == self.token {
            return Err(RemoteError::new("listing did not advance past its continuation token"));
        }

        self.pages += 1;
        debug!(
            prefix = %self.prefix,
            page = self.pages,
            entries = page.entries.len(),
            more = page.next_token.is_some(),
            "metadata page"
        );
        self.token.clone_from(&page.next_token);
        self.finished = self.token.is_none();
        Ok(Some(page))
    }

    /// Start over from the first page
    pub fn restart(&mut self) {
        self.token = None;
        self.finished = false;
        self.pages = 0;
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of pages fetched since the last (re)start
    #[must_use]
    pub const fn pages_fetched(&self) -> usize {
        self.pages
    }
}
