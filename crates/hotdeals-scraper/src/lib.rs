pub mod error;
pub mod export;
pub mod extract;
pub mod loader;
pub mod merchant;
pub mod pipeline;
pub(crate) mod retry;
pub mod run;
pub mod selector;
pub mod status;

pub use error::ScraperError;
pub use extract::{extract, ExtractedProduct};
pub use loader::{
    BrowserPageLoader, BrowserSettings, ConfiguredLoader, FixturePageLoader, HttpPageLoader,
    PageLoader,
};
pub use pipeline::{collect_deals, parse_deals, AllowList};
pub use run::{active_scraper_config, load_or_init_scraper_config, ScrapeRun};
pub use status::{read_status, reset_status, StatusGuard};
