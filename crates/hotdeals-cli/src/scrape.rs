//! The `scrape` command: one run, printed summary, optional exports and
//! persistence.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local};
use hotdeals_core::{AppConfig, LoaderKind, ProductRecord};
use hotdeals_scraper::export::{timestamped_file_name, write_csv, write_json};
use hotdeals_scraper::{AllowList, ConfiguredLoader, ScrapeRun, ScraperError};

/// Records shown in the post-run summary.
const SUMMARY_LIMIT: usize = 5;

#[derive(Debug)]
pub(crate) struct ScrapeOptions {
    pub merchants: Vec<String>,
    pub loader: LoaderKind,
    /// `Some(None)` exports under a timestamped name in the working directory.
    pub json: Option<Option<PathBuf>>,
    pub csv: Option<Option<PathBuf>>,
    pub persist: bool,
}

/// Run one scrape end to end.
///
/// The status document reads running until this returns. Ctrl-c stops the
/// browser at its next checkpoint and the status is reset before returning.
///
/// # Errors
///
/// Returns an error if another run is in progress, the loader cannot be
/// built, an export or the latest-deals document cannot be written, or the
/// database is unreachable while persisting.
pub(crate) async fn run_scrape(config: &AppConfig, options: ScrapeOptions) -> anyhow::Result<()> {
    let run = match ScrapeRun::begin(&config.data_paths()) {
        Ok(run) => run,
        Err(e @ ScraperError::AlreadyRunning { .. }) => {
            return Err(anyhow::Error::new(e).context(
                "cannot start a scrape; if none is running, clear the stale status with \
                 `hotdeals-cli status --reset`",
            ));
        }
        Err(e) => return Err(e.into()),
    };
    let loader = ConfiguredLoader::from_config(options.loader, config, run.config())
        .context("failed to build page loader")?;

    let allow = if options.merchants.is_empty() {
        AllowList::new(&config.allowed_merchants)
    } else {
        AllowList::new(&options.merchants)
    };
    if !allow.is_empty() {
        println!("merchant filter: {}", allow.merchants().join(", "));
    }

    let records = tokio::select! {
        records = run.collect(&loader, &allow) => records,
        _ = tokio::signal::ctrl_c() => {
            loader.cancel();
            anyhow::bail!("scrape interrupted");
        }
    };

    if records.is_empty() {
        println!("no deals collected");
        return Ok(());
    }

    run.publish(&records)?;
    for line in summary_lines(&records, SUMMARY_LIMIT) {
        println!("{line}");
    }

    let now = Local::now();
    let keys = &run.config().json_keys;
    if let Some(path) = &options.json {
        let path = export_path(path.as_deref(), "json", now);
        write_json(&path, &records, keys)?;
        println!("wrote {}", path.display());
    }
    if let Some(path) = &options.csv {
        let path = export_path(path.as_deref(), "csv", now);
        write_csv(&path, &records, keys)?;
        println!("wrote {}", path.display());
    }

    if options.persist {
        let pool = hotdeals_db::connect_from_app_config(config).await?;
        let summary = hotdeals_db::reconcile_deals(&pool, &records).await;
        println!(
            "database: {} inserted, {} updated, {} failed",
            summary.inserted, summary.updated, summary.failed
        );
    }

    drop(run);
    Ok(())
}

pub(crate) fn export_path(
    explicit: Option<&Path>,
    extension: &str,
    at: DateTime<Local>,
) -> PathBuf {
    explicit.map_or_else(|| timestamped_file_name(extension, at), Path::to_path_buf)
}

/// Header line plus the first `limit` records, one per line.
pub(crate) fn summary_lines(records: &[ProductRecord], limit: usize) -> Vec<String> {
    let mut lines = vec![format!("collected {} deals", records.len())];
    lines.extend(records.iter().take(limit).enumerate().map(|(i, record)| {
        let original = record
            .original_price
            .as_deref()
            .map(|p| format!(" (was {p})"))
            .unwrap_or_default();
        format!(
            "{:>2}. {} | {}{} | {}",
            i + 1,
            record.title,
            record.price,
            original,
            record.merchant.as_deref().unwrap_or("-"),
        )
    }));
    if records.len() > limit {
        lines.push(format!("... and {} more", records.len() - limit));
    }
    lines
}
