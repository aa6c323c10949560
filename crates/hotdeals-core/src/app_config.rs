use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which page loader drives a scrape run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderKind {
    /// Headless Chrome; clicks "load more" until the feed is exhausted.
    Browser,
    /// Plain HTTP GET; only sees the first page of items.
    Http,
}

impl std::fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderKind::Browser => write!(f, "browser"),
            LoaderKind::Http => write!(f, "http"),
        }
    }
}

impl std::str::FromStr for LoaderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browser" => Ok(LoaderKind::Browser),
            "http" => Ok(LoaderKind::Http),
            other => Err(format!("unknown loader '{other}'; expected 'browser' or 'http'")),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub data_dir: PathBuf,
    pub schedule: String,
    pub run_on_startup: bool,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub loader: LoaderKind,
    pub chrome_path: Option<PathBuf>,
    pub browser_initial_wait_ms: u64,
    pub load_more_settle_ms: u64,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_secs: u64,
    pub allowed_merchants: Vec<String>,
}

impl AppConfig {
    #[must_use]
    pub fn data_paths(&self) -> DataPaths {
        DataPaths::new(&self.data_dir)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("data_dir", &self.data_dir)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("schedule", &self.schedule)
            .field("run_on_startup", &self.run_on_startup)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("loader", &self.loader)
            .field("chrome_path", &self.chrome_path)
            .field("browser_initial_wait_ms", &self.browser_initial_wait_ms)
            .field("load_more_settle_ms", &self.load_more_settle_ms)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_secs",
                &self.scraper_retry_backoff_base_secs,
            )
            .field("allowed_merchants", &self.allowed_merchants)
            .finish()
    }
}

/// File locations inside the data directory shared by the server, the
/// scheduler, and the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub dir: PathBuf,
    pub latest_deals: PathBuf,
    pub status: PathBuf,
    pub scraper_config: PathBuf,
}

impl DataPaths {
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            latest_deals: dir.join("latest_deals.json"),
            status: dir.join("scraper_status.json"),
            scraper_config: dir.join("scraper_config.json"),
        }
    }
}
