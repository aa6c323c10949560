pub mod app_config;
pub mod atomic;
pub mod config;
pub mod deals;
pub mod scraper_config;

pub use app_config::{AppConfig, DataPaths, Environment, LoaderKind};
pub use atomic::write_file_atomic;
pub use config::{
    build_app_config, load_app_config, load_app_config_from_env, parse_merchant_list,
    DEFAULT_USER_AGENT,
};
pub use deals::{DealsEnvelope, ProductField, ProductRecord, ScraperStatus};
pub use scraper_config::{
    load_scraper_config, write_scraper_config, AttrPredicate, JsonKeys, ScraperConfig,
    SelectorDescriptor, Selectors,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read or write config file {path}: {source}")]
    ConfigFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ConfigFileParse(#[from] serde_json::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}
