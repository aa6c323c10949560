use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::PageLoader;
use crate::error::ScraperError;

/// Serves canned HTML by URL. Unknown URLs fail the way an unreachable host
/// would, after no retries.
#[derive(Debug, Default)]
pub struct FixturePageLoader {
    pages: HashMap<String, String>,
    loads: AtomicUsize,
}

impl FixturePageLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_owned(), html.to_owned());
        self
    }

    /// Number of `load` calls served so far, including failed ones.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl PageLoader for FixturePageLoader {
    async fn load(&self, url: &str) -> Result<String, ScraperError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScraperError::Navigation {
                url: url.to_owned(),
                reason: "no fixture registered for URL".to_owned(),
            })
    }
}
