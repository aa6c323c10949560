//! `config` and `status` commands: inspect and seed the files in the data
//! directory.

use std::path::Path;

use hotdeals_core::{write_scraper_config, ScraperConfig};
use hotdeals_scraper::active_scraper_config;

/// Write the default scraper config to `path`.
///
/// # Errors
///
/// Returns an error if the file exists and `force` is not set, or if it
/// cannot be written.
pub(crate) fn init_scraper_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }
    write_scraper_config(path, &ScraperConfig::default())?;
    println!("wrote default scraper config to {}", path.display());
    Ok(())
}

/// # Errors
///
/// Returns an error if the config cannot be serialized.
pub(crate) fn show_scraper_config(path: &Path) -> anyhow::Result<()> {
    let config = active_scraper_config(path);
    println!("{}", serde_json::to_string_pretty(&config)?);
    for name in config.empty_selectors() {
        eprintln!("warning: selector {name} is empty and will match nothing");
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the status cannot be serialized.
pub(crate) fn print_status(path: &Path) -> anyhow::Result<()> {
    let status = hotdeals_scraper::read_status(path);
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

/// Force the status document to idle.
///
/// # Errors
///
/// Returns an error if the status file cannot be written.
pub(crate) fn reset_stale_status(path: &Path) -> anyhow::Result<()> {
    let was_running = hotdeals_scraper::read_status(path).is_scraping;
    hotdeals_scraper::reset_status(path)?;
    if was_running {
        tracing::warn!(path = %path.display(), "cleared a stale running status");
    }
    Ok(())
}
