use crate::app_config::{AppConfig, Environment, LoaderKind};
use crate::ConfigError;

/// Default browser identity sent by both page loaders.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let database_url = lookup("DATABASE_URL").ok().filter(|s| !s.trim().is_empty());
    let env = parse_environment(&or_default("HOTDEALS_ENV", "development"))?;

    let bind_addr = or_default("HOTDEALS_BIND_ADDR", "0.0.0.0:8000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("HOTDEALS_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("HOTDEALS_LOG_LEVEL", "info");
    let data_dir = PathBuf::from(or_default("HOTDEALS_DATA_DIR", "./data"));
    let schedule = or_default("HOTDEALS_SCHEDULE", "0 */30 * * * *");
    let run_on_startup = parse_bool("HOTDEALS_RUN_ON_STARTUP", "true")?;

    let db_max_connections = parse_u32("HOTDEALS_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("HOTDEALS_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("HOTDEALS_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let loader = or_default("HOTDEALS_LOADER", "browser")
        .parse::<LoaderKind>()
        .map_err(|reason| invalid("HOTDEALS_LOADER", reason))?;
    let chrome_path = lookup("HOTDEALS_CHROME_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    let browser_initial_wait_ms = parse_u64("HOTDEALS_BROWSER_INITIAL_WAIT_MS", "3000")?;
    let load_more_settle_ms = parse_u64("HOTDEALS_LOAD_MORE_SETTLE_MS", "2000")?;

    let scraper_request_timeout_secs = parse_u64("HOTDEALS_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default("HOTDEALS_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_max_retries = parse_u32("HOTDEALS_SCRAPER_MAX_RETRIES", "3")?;
    let scraper_retry_backoff_base_secs =
        parse_u64("HOTDEALS_SCRAPER_RETRY_BACKOFF_BASE_SECS", "1")?;

    let allowed_merchants = parse_merchant_list(&or_default("HOTDEALS_ALLOWED_MERCHANTS", ""));

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        data_dir,
        schedule,
        run_on_startup,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        loader,
        chrome_path,
        browser_initial_wait_ms,
        load_more_settle_ms,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
        allowed_merchants,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "HOTDEALS_ENV".to_string(),
            reason: format!(
                "unknown environment '{other}'; expected development, test, or production"
            ),
        }),
    }
}

/// Split a comma-separated merchant list, trimming and upper-casing entries.
#[must_use]
pub fn parse_merchant_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
