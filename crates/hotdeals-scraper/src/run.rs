//! One scrape run from start to finish, minus persistence.
//!
//! ```text
//! ScrapeRun::begin  -> status running, scraper config loaded
//!   .collect        -> records
//!   .publish        -> latest_deals.json replaced
//! (caller persists)
//! drop              -> status idle
//! ```

use std::path::Path;

use hotdeals_core::{
    load_scraper_config, write_scraper_config, ConfigError, DataPaths, ProductRecord,
    ScraperConfig,
};

use crate::error::ScraperError;
use crate::export::write_json;
use crate::loader::PageLoader;
use crate::pipeline::{collect_deals, AllowList};
use crate::status::StatusGuard;

/// Load the scraper config, falling back to defaults.
///
/// A missing file is created with the defaults. An unreadable or invalid
/// file is left in place and the defaults are used for this run.
#[must_use]
pub fn load_or_init_scraper_config(path: &Path) -> ScraperConfig {
    let config = match load_scraper_config(path) {
        Ok(config) => config,
        Err(ConfigError::ConfigFileIo { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            let defaults = ScraperConfig::default();
            match write_scraper_config(path, &defaults) {
                Ok(()) => tracing::info!(path = %path.display(), "wrote default scraper config"),
                Err(e) => tracing::warn!(error = %e, "could not write default scraper config"),
            }
            defaults
        }
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "scraper config invalid, using defaults"
            );
            ScraperConfig::default()
        }
    };

    for name in config.empty_selectors() {
        tracing::warn!(selector = name, "selector is empty and will match nothing");
    }
    config
}

/// The config a run would use, without creating the file.
#[must_use]
pub fn active_scraper_config(path: &Path) -> ScraperConfig {
    match load_scraper_config(path) {
        Ok(config) => config,
        Err(ConfigError::ConfigFileIo { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            tracing::debug!(path = %path.display(), "no scraper config yet, using defaults");
            ScraperConfig::default()
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "scraper config invalid, using defaults"
            );
            ScraperConfig::default()
        }
    }
}

/// A run in progress. The status reads running for as long as this value
/// lives.
#[derive(Debug)]
pub struct ScrapeRun {
    _guard: StatusGuard,
    config: ScraperConfig,
    paths: DataPaths,
}

impl ScrapeRun {
    /// Mark the status running and load the scraper config.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::AlreadyRunning`] if another run holds the
    /// status, or [`ScraperError::Io`] if the status cannot be written.
    pub fn begin(paths: &DataPaths) -> Result<Self, ScraperError> {
        let guard = StatusGuard::acquire(&paths.status)?;
        let config = load_or_init_scraper_config(&paths.scraper_config);
        tracing::info!(url = %config.base_url, "scrape run started");
        Ok(Self {
            _guard: guard,
            config,
            paths: paths.clone(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub async fn collect<L: PageLoader>(
        &self,
        loader: &L,
        allow: &AllowList,
    ) -> Vec<ProductRecord> {
        collect_deals(loader, &self.config, allow).await
    }

    /// Replace the latest-deals document. An empty run leaves the previous
    /// document untouched and returns `false`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] if the document cannot be written.
    pub fn publish(&self, records: &[ProductRecord]) -> Result<bool, ScraperError> {
        if records.is_empty() {
            tracing::warn!("run produced no records, keeping previous latest deals");
            return Ok(false);
        }
        write_json(&self.paths.latest_deals, records, &self.config.json_keys)?;
        Ok(true)
    }
}
