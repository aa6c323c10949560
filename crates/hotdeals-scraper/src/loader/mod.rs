//! Page loaders: turn a URL into the HTML the extractor reads.
//!
//! [`BrowserPageLoader`] renders the page in headless Chrome and expands the
//! hot-deals list by clicking "load more" until the control disappears.
//! [`HttpPageLoader`] fetches the static markup only. [`FixturePageLoader`]
//! serves canned HTML for tests.

mod browser;
mod expand;
mod fixture;
mod http;

use std::future::Future;

use hotdeals_core::{AppConfig, LoaderKind, ScraperConfig};

pub use browser::{BrowserPageLoader, BrowserSettings};
pub use expand::{expand_all, LoadMoreSurface};
pub use fixture::FixturePageLoader;
pub use http::HttpPageLoader;

use crate::error::ScraperError;

/// Anything that can produce a page's HTML.
pub trait PageLoader {
    /// Fetch `url` and return its fully loaded markup.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] when the page could not be loaded after the
    /// loader's own retries.
    fn load(&self, url: &str) -> impl Future<Output = Result<String, ScraperError>> + Send;
}

/// The loader picked at runtime from [`LoaderKind`].
#[derive(Debug)]
pub enum ConfiguredLoader {
    Browser(BrowserPageLoader),
    Http(HttpPageLoader),
}

impl ConfiguredLoader {
    /// Build the loader selected by `kind`, using the timing, retry and
    /// identity settings from `app` and the load-more selector from `scraper`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn from_config(
        kind: LoaderKind,
        app: &AppConfig,
        scraper: &ScraperConfig,
    ) -> Result<Self, ScraperError> {
        match kind {
            LoaderKind::Browser => Ok(Self::Browser(BrowserPageLoader::new(
                BrowserSettings::from_config(app, scraper),
            ))),
            LoaderKind::Http => Ok(Self::Http(HttpPageLoader::new(
                app.scraper_request_timeout_secs,
                &app.scraper_user_agent,
                app.scraper_max_retries,
                app.scraper_retry_backoff_base_secs,
            )?)),
        }
    }

    /// Stop an in-flight browser render. A no-op for the HTTP loader, whose
    /// requests end when the load future is dropped.
    pub fn cancel(&self) {
        if let Self::Browser(loader) = self {
            loader.cancel();
        }
    }
}

impl PageLoader for ConfiguredLoader {
    async fn load(&self, url: &str) -> Result<String, ScraperError> {
        match self {
            Self::Browser(loader) => loader.load(url).await,
            Self::Http(loader) => loader.load(url).await,
        }
    }
}
