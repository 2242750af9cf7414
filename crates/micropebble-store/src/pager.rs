//! Cursor-based collection pagination with an append-only page cache.
//!
//! The store API paginates through opaque `nextPage` links, so pages can
//! only be fetched in order. Already-fetched pages are cached by index and
//! served without re-fetching when the user pages backwards (or forwards
//! over ground already covered).

use micropebble_core::prelude::*;

use crate::models::AppstoreCollectionPage;

/// Fetch seam for one paginated collection. Implemented by
/// [`crate::client::StoreClient`] in production and by scripted fakes in
/// tests.
#[trait_variant::make(CollectionFetch: Send)]
pub trait LocalCollectionFetch {
    /// Fetch the page at `url` (either the configured initial endpoint or a
    /// previously returned `nextPage` link).
    async fn fetch_page(&self, url: &str) -> Result<AppstoreCollectionPage>;
}

impl CollectionFetch for crate::client::StoreClient {
    async fn fetch_page(&self, url: &str) -> Result<AppstoreCollectionPage> {
        self.fetch_collection_page(url).await
    }
}

/// Pager over one remote collection.
pub struct CollectionPager<F> {
    fetcher: F,
    initial_url: String,
    pages: Vec<AppstoreCollectionPage>,
    current_page: usize,
    has_found_end: bool,
}

impl<F> CollectionPager<F>
where
    F: CollectionFetch + Sync,
{
    pub fn new(fetcher: F, initial_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            initial_url: initial_url.into(),
            pages: Vec::new(),
            current_page: 0,
            has_found_end: false,
        }
    }

    /// Zero-based cursor position.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Latched true once a fetched page carried no `nextPage` link.
    pub fn has_found_end(&self) -> bool {
        self.has_found_end
    }

    /// Number of cached pages.
    pub fn cached_pages(&self) -> usize {
        self.pages.len()
    }

    /// Bring the cursor's page into the cache and emit it.
    ///
    /// Emits `Progress(None)` before each network fetch and
    /// `Success(page)` once the target page is available. A fetch error is
    /// emitted as `Outcome::Error` and leaves the cache untouched, so a
    /// retry resumes where the last good page left off.
    pub async fn load(&mut self, emit: &impl Fn(Outcome<AppstoreCollectionPage>)) {
        while self.pages.len() <= self.current_page && !self.has_found_end {
            let url = match self.pages.last() {
                Some(prev) => match prev.next_page_token() {
                    Some(next) => next.to_string(),
                    // Unreachable while has_found_end stays in sync,
                    // but latch defensively rather than refetch.
                    None => {
                        self.has_found_end = true;
                        break;
                    }
                },
                None => self.initial_url.clone(),
            };

            emit(Outcome::busy());
            match self.fetcher.fetch_page(&url).await {
                Ok(page) => {
                    if page.next_page_token().is_none() {
                        self.has_found_end = true;
                    }
                    self.pages.push(page);
                }
                Err(e) => {
                    warn!("collection fetch failed: {e}");
                    emit(Outcome::failed(e));
                    return;
                }
            }
        }

        // Past the end: clamp the cursor onto the last real page.
        if self.current_page >= self.pages.len() {
            self.current_page = self.pages.len().saturating_sub(1);
        }

        if let Some(page) = self.pages.get(self.current_page) {
            emit(Outcome::Success(page.clone()));
        }
    }

    /// Advance the cursor and load. Never fetches beyond the cached set once
    /// the end has been found.
    pub async fn next_page(&mut self, emit: &impl Fn(Outcome<AppstoreCollectionPage>)) {
        if !(self.has_found_end && self.current_page + 1 >= self.pages.len()) {
            self.current_page += 1;
        }
        self.load(emit).await;
    }

    /// Step the cursor back and load from cache.
    pub async fn previous_page(&mut self, emit: &impl Fn(Outcome<AppstoreCollectionPage>)) {
        self.current_page = self.current_page.saturating_sub(1);
        self.load(emit).await;
    }

    /// Drop the whole cache and refetch from page 0.
    pub async fn reload(&mut self, emit: &impl Fn(Outcome<AppstoreCollectionPage>)) {
        self.pages.clear();
        self.current_page = 0;
        self.has_found_end = false;
        self.load(emit).await;
    }
}
