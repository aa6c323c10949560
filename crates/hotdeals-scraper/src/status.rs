//! The `{ "is_scraping": bool }` status document.
//!
//! A run holds a [`StatusGuard`] for its whole duration. Acquiring the guard
//! marks the status running; dropping it marks it idle again, including when
//! the run fails or unwinds.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

use hotdeals_core::{write_file_atomic, ScraperStatus};

use crate::error::ScraperError;

/// Status paths currently held by a guard in this process.
static HELD: LazyLock<Mutex<HashSet<PathBuf>>> = LazyLock::new(Mutex::default);

fn held() -> MutexGuard<'static, HashSet<PathBuf>> {
    HELD.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read the status document. Missing or malformed documents read as idle.
#[must_use]
pub fn read_status(path: &Path) -> ScraperStatus {
    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "status file malformed, treating as idle"
            );
            ScraperStatus::default()
        }),
        Err(_) => ScraperStatus::default(),
    }
}

/// Write the status document.
///
/// # Errors
///
/// Returns [`ScraperError::Io`] if the file cannot be written.
pub fn write_status(path: &Path, status: ScraperStatus) -> Result<(), ScraperError> {
    let body = serde_json::to_vec(&status)?;
    write_file_atomic(path, &body).map_err(|e| ScraperError::io(path, e))
}

/// Force the status to idle. Used at process start, where any `true` left
/// behind belongs to a run that no longer exists.
///
/// # Errors
///
/// Returns [`ScraperError::Io`] if the file cannot be written.
pub fn reset_status(path: &Path) -> Result<(), ScraperError> {
    write_status(path, ScraperStatus { is_scraping: false })
}

/// Proof that this process owns the running state.
#[derive(Debug)]
pub struct StatusGuard {
    path: PathBuf,
}

impl StatusGuard {
    /// Transition idle → running.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::AlreadyRunning`] if the status already says a
    /// run is in progress, or [`ScraperError::Io`] if it cannot be written.
    pub fn acquire(path: &Path) -> Result<Self, ScraperError> {
        let mut held = held();
        if held.contains(path) || read_status(path).is_scraping {
            return Err(ScraperError::AlreadyRunning {
                path: path.display().to_string(),
            });
        }
        write_status(path, ScraperStatus { is_scraping: true })?;
        held.insert(path.to_path_buf());
        tracing::debug!(path = %path.display(), "scrape status set to running");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for StatusGuard {
    fn drop(&mut self) {
        let mut held = held();
        held.remove(&self.path);
        match reset_status(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "scrape status set to idle"),
            Err(e) => tracing::error!(error = %e, "could not reset scrape status"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_status_reads_idle() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!read_status(&dir.path().join("scraper_status.json")).is_scraping);
    }

    #[test]
    fn guard_marks_running_then_idle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraper_status.json");

        let guard = StatusGuard::acquire(&path).unwrap();
        assert!(read_status(&path).is_scraping);
        drop(guard);
        assert!(!read_status(&path).is_scraping);
    }

    #[test]
    fn second_acquire_is_refused_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraper_status.json");

        let _guard = StatusGuard::acquire(&path).unwrap();
        let err = StatusGuard::acquire(&path).unwrap_err();
        assert!(matches!(err, ScraperError::AlreadyRunning { .. }));
    }

    #[test]
    fn guard_resets_status_on_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraper_status.json");
        let p = path.clone();

        let outcome = std::panic::catch_unwind(move || {
            let _guard = StatusGuard::acquire(&p).unwrap();
            panic!("extraction blew up");
        });

        assert!(outcome.is_err());
        assert!(!read_status(&path).is_scraping);
    }

    #[test]
    fn reset_clears_stale_running_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraper_status.json");
        std::fs::write(&path, r#"{"is_scraping": true}"#).unwrap();

        reset_status(&path).unwrap();
        assert!(StatusGuard::acquire(&path).is_ok());
    }

    #[test]
    fn malformed_status_reads_idle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraper_status.json");
        std::fs::write(&path, "yes").unwrap();
        assert!(!read_status(&path).is_scraping);
    }
}
