//! Exponential backoff for page loads.
//!
//! Transient failures (network errors, 429, 5xx, browser navigation
//! failures) are retried after `base * 2^attempt` seconds. A 429 waits at
//! least as long as its `Retry-After` asks, up to [`MAX_RETRY_AFTER_SECS`].
//! Everything else is returned to the caller on the first occurrence.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Upper bound on a server-requested `Retry-After` wait.
pub(crate) const MAX_RETRY_AFTER_SECS: u64 = 120;

/// Returns `true` if `err` is worth another attempt after a delay.
///
/// Browser launch failures are not retried.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. }
        | ScraperError::Http(_)
        | ScraperError::Navigation { .. } => true,
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Seconds to sleep after the failure of attempt number `attempt`.
pub(crate) fn retry_delay_secs(err: &ScraperError, attempt: u32, backoff_base_secs: u64) -> u64 {
    let backoff = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
    match err {
        ScraperError::RateLimited {
            retry_after_secs, ..
        } => backoff.max((*retry_after_secs).min(MAX_RETRY_AFTER_SECS)),
        _ => backoff,
    }
}

/// Runs `operation` until it succeeds, fails with a non-retriable error, or
/// `max_retries` additional attempts have been spent.
///
/// | Attempt | Sleep before next attempt (`backoff_base_secs = 1`) |
/// |---------|------------------------------------------------------|
/// | 0 | none |
/// | 1 | 1 s |
/// | 2 | 2 s |
/// | 3 | 4 s |
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let delay_secs = retry_delay_secs(&err, attempt, backoff_base_secs);
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "page load failed, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn server_error() -> ScraperError {
        ScraperError::UnexpectedStatus {
            status: 503,
            url: "https://deals.example.com/".to_owned(),
        }
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ScraperError>(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(server_error())
                } else {
                    Ok::<&str, ScraperError>("<html></html>")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "<html></html>");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<(), ScraperError>(ScraperError::Navigation {
                    url: "https://deals.example.com/".to_owned(),
                    reason: "net::ERR_CONNECTION_RESET".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ScraperError::Navigation { .. })));
    }

    #[tokio::test]
    async fn browser_launch_failure_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<(), ScraperError>(ScraperError::BrowserLaunch(
                    "could not find chrome".to_owned(),
                ))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ScraperError::BrowserLaunch(_))));
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&ScraperError::UnexpectedStatus {
            status: 404,
            url: "https://deals.example.com/".to_owned(),
        }));
        assert!(is_retriable(&ScraperError::RateLimited {
            url: "https://deals.example.com/".to_owned(),
            retry_after_secs: 1,
        }));
    }

    #[test]
    fn rate_limit_waits_for_retry_after() {
        let limited = |retry_after_secs| ScraperError::RateLimited {
            url: "https://deals.example.com/".to_owned(),
            retry_after_secs,
        };
        assert_eq!(retry_delay_secs(&limited(30), 0, 1), 30);
        assert_eq!(retry_delay_secs(&limited(1), 3, 1), 8);
        assert_eq!(retry_delay_secs(&limited(86_400), 0, 1), MAX_RETRY_AFTER_SECS);
        assert_eq!(retry_delay_secs(&server_error(), 2, 1), 4);
    }
}
