//! JSON and CSV exports of collected deals.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use hotdeals_core::{write_file_atomic, DealsEnvelope, JsonKeys, ProductField, ProductRecord};

use crate::error::ScraperError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// `hot_deals_20240501_093000.json` style file name.
#[must_use]
pub fn timestamped_file_name(extension: &str, at: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("hot_deals_{}.{extension}", at.format("%Y%m%d_%H%M%S")))
}

/// Write the envelope document for `records` as pretty UTF-8 JSON.
///
/// # Errors
///
/// Returns [`ScraperError`] if serialization or the write fails.
pub fn write_json(
    path: &Path,
    records: &[ProductRecord],
    keys: &JsonKeys,
) -> Result<DealsEnvelope, ScraperError> {
    let envelope = DealsEnvelope::now(records, keys);
    let body = serde_json::to_vec_pretty(&envelope)?;
    write_file_atomic(path, &body).map_err(|e| ScraperError::io(path, e))?;
    tracing::info!(path = %path.display(), count = records.len(), "wrote JSON export");
    Ok(envelope)
}

/// Read an envelope document.
///
/// # Errors
///
/// Returns [`ScraperError`] if the file cannot be read or is not an envelope.
pub fn read_json(path: &Path) -> Result<DealsEnvelope, ScraperError> {
    let content = std::fs::read(path).map_err(|e| ScraperError::io(path, e))?;
    Ok(serde_json::from_slice(&content)?)
}

/// Like [`read_json`], but a missing or unreadable file is an empty envelope.
#[must_use]
pub fn read_json_or_empty(path: &Path) -> DealsEnvelope {
    match read_json(path) {
        Ok(envelope) => envelope,
        Err(ScraperError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            DealsEnvelope::empty()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "latest deals file unreadable");
            DealsEnvelope::empty()
        }
    }
}

/// Write `records` as CSV with a UTF-8 byte-order mark so spreadsheet tools
/// detect the encoding. Column headers are the configured output keys.
///
/// # Errors
///
/// Returns [`ScraperError`] if encoding or the write fails.
pub fn write_csv(
    path: &Path,
    records: &[ProductRecord],
    keys: &JsonKeys,
) -> Result<(), ScraperError> {
    let body = encode_csv(records, keys)?;
    write_file_atomic(path, &body).map_err(|e| ScraperError::io(path, e))?;
    tracing::info!(path = %path.display(), count = records.len(), "wrote CSV export");
    Ok(())
}

fn encode_csv(records: &[ProductRecord], keys: &JsonKeys) -> Result<Vec<u8>, ScraperError> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    writer.write_record(ProductField::EXPORT_COLUMNS.iter().map(|f| keys.key(*f)))?;
    for record in records {
        writer.write_record(
            ProductField::EXPORT_COLUMNS
                .iter()
                .map(|f| record.get(*f).unwrap_or_default()),
        )?;
    }
    writer
        .into_inner()
        .map_err(|e| ScraperError::Io {
            path: "<csv buffer>".to_owned(),
            source: e.into_error(),
        })
}
