use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};
use hotdeals_core::{AppConfig, ScraperConfig};

use super::expand::{expand_all, settle_for, LoadMoreSurface};
use super::PageLoader;
use crate::error::ScraperError;
use crate::retry::retry_with_backoff;

const ACCEPT_LANGUAGE: &str = "th-TH,th;q=0.9,en-US;q=0.8,en;q=0.7";

/// Everything a browser session needs, owned so it can move into a
/// blocking task.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Chrome binary; auto-detected when `None`.
    pub chrome_path: Option<PathBuf>,
    pub user_agent: String,
    pub initial_wait: Duration,
    pub settle_interval: Duration,
    pub max_retries: u32,
    pub backoff_base_secs: u64,
    /// CSS form of the load-more selector. `None` skips expansion.
    pub load_more_css: Option<String>,
}

impl BrowserSettings {
    #[must_use]
    pub fn from_config(app: &AppConfig, scraper: &ScraperConfig) -> Self {
        Self {
            chrome_path: app.chrome_path.clone(),
            user_agent: app.scraper_user_agent.clone(),
            initial_wait: Duration::from_millis(app.browser_initial_wait_ms),
            settle_interval: Duration::from_millis(app.load_more_settle_ms),
            max_retries: app.scraper_max_retries,
            backoff_base_secs: app.scraper_retry_backoff_base_secs,
            load_more_css: scraper.selectors.load_more_button.to_css(),
        }
    }
}

/// Renders pages in headless Chrome.
///
/// Every attempt launches its own browser inside `spawn_blocking`; the
/// browser process is shut down when the attempt's `Browser` value drops,
/// whichever way the attempt ends.
///
/// Dropping a `load` future does not stop a render already running on the
/// blocking pool. [`cancel`](Self::cancel) does: the render gives up at its
/// next checkpoint, and every later load fails with
/// [`ScraperError::Cancelled`].
#[derive(Debug, Clone)]
pub struct BrowserPageLoader {
    settings: BrowserSettings,
    cancel: Arc<AtomicBool>,
}

impl BrowserPageLoader {
    #[must_use]
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

impl PageLoader for BrowserPageLoader {
    async fn load(&self, url: &str) -> Result<String, ScraperError> {
        let settings = &self.settings;
        retry_with_backoff(settings.max_retries, settings.backoff_base_secs, || {
            let settings = settings.clone();
            let cancel = Arc::clone(&self.cancel);
            let url = url.to_owned();
            async move {
                tokio::task::spawn_blocking(move || render(&settings, &url, &cancel)).await?
            }
        })
        .await
    }
}

fn check_cancelled(cancel: &AtomicBool) -> Result<(), ScraperError> {
    if cancel.load(Ordering::Relaxed) {
        return Err(ScraperError::Cancelled);
    }
    Ok(())
}

/// One full browser session: launch, navigate, expand, read the DOM.
fn render(
    settings: &BrowserSettings,
    url: &str,
    cancel: &AtomicBool,
) -> Result<String, ScraperError> {
    check_cancelled(cancel)?;
    let browser = launch(settings)?;
    let tab = browser
        .new_tab()
        .map_err(|e| ScraperError::Browser(format!("could not open tab: {e}")))?;
    tab.set_user_agent(&settings.user_agent, Some(ACCEPT_LANGUAGE), None)
        .map_err(|e| ScraperError::Browser(format!("could not set user agent: {e}")))?;

    tracing::info!(url, "navigating");
    let navigation_failed = |reason: String| ScraperError::Navigation {
        url: url.to_owned(),
        reason,
    };
    tab.navigate_to(url)
        .map_err(|e| navigation_failed(e.to_string()))?;
    tab.wait_until_navigated()
        .map_err(|e| navigation_failed(e.to_string()))?;
    settle_for(settings.initial_wait);

    match &settings.load_more_css {
        Some(css) => {
            let mut surface = TabSurface::new(&tab, css, settings.settle_interval);
            let clicks = expand_all(&mut surface, cancel);
            tracing::info!(url, clicks, "page expanded");
        }
        None => tracing::warn!("load more selector is empty, skipping expansion"),
    }
    check_cancelled(cancel)?;

    tab.get_content()
        .map_err(|e| ScraperError::Browser(format!("could not read page source: {e}")))
}

fn launch(settings: &BrowserSettings) -> Result<Browser, ScraperError> {
    let args = vec![
        OsStr::new("--disable-gpu"),
        OsStr::new("--disable-dev-shm-usage"),
        OsStr::new("--disable-blink-features=AutomationControlled"),
        OsStr::new("--window-size=1920,1080"),
        OsStr::new("--lang=th-TH"),
    ];
    let options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .path(settings.chrome_path.clone())
        .idle_browser_timeout(Duration::from_secs(120))
        .args(args)
        .build()
        .map_err(|e| ScraperError::BrowserLaunch(e.to_string()))?;

    Browser::new(options).map_err(|e| ScraperError::BrowserLaunch(e.to_string()))
}

/// Live tab adapter for the expansion loop. The click happens in page
/// script so a missing control is an ordinary `false`, not an error.
struct TabSurface<'a> {
    tab: &'a Arc<Tab>,
    click_script: String,
    settle_interval: Duration,
}

impl<'a> TabSurface<'a> {
    fn new(tab: &'a Arc<Tab>, css: &str, settle_interval: Duration) -> Self {
        let quoted = serde_json::Value::String(css.to_owned()).to_string();
        let click_script = format!(
            "(() => {{ const el = document.querySelector({quoted}); \
             if (!el) return false; el.scrollIntoView(); el.click(); return true; }})()"
        );
        Self {
            tab,
            click_script,
            settle_interval,
        }
    }
}

impl LoadMoreSurface for TabSurface<'_> {
    fn click_load_more(&mut self) -> Result<bool, ScraperError> {
        let result = self
            .tab
            .evaluate(&self.click_script, false)
            .map_err(|e| ScraperError::Browser(format!("load more script failed: {e}")))?;
        Ok(result
            .value
            .as_ref()
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false))
    }

    fn settle(&mut self) {
        settle_for(self.settle_interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> BrowserSettings {
        BrowserSettings {
            chrome_path: Some(PathBuf::from("/nonexistent/chrome")),
            user_agent: "hotdeals-test/0.1".to_owned(),
            initial_wait: Duration::ZERO,
            settle_interval: Duration::ZERO,
            max_retries: 2,
            backoff_base_secs: 0,
            load_more_css: Some(".load-more".to_owned()),
        }
    }

    #[tokio::test]
    async fn cancelled_loader_fails_without_launching() {
        let loader = BrowserPageLoader::new(settings());
        let clone = loader.clone();
        loader.cancel();

        let result = clone.load("https://www.priceza.com").await;
        assert!(matches!(result, Err(ScraperError::Cancelled)), "got: {result:?}");
    }
}
