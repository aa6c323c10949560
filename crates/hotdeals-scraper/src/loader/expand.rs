use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::ScraperError;

/// The slice of a live page the expansion loop needs.
pub trait LoadMoreSurface {
    /// Click the load-more control once. `Ok(false)` means the control is
    /// no longer on the page.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] if the page could not be queried.
    fn click_load_more(&mut self) -> Result<bool, ScraperError>;

    /// Wait for the content added by the last click to render.
    fn settle(&mut self);
}

/// Click load-more until the control disappears and return the number of
/// clicks. An error while locating or clicking ends the loop; whatever the
/// page holds at that point is still used. Setting `cancel` stops the loop
/// before the next click.
pub fn expand_all<S: LoadMoreSurface>(surface: &mut S, cancel: &AtomicBool) -> usize {
    let mut clicks = 0usize;
    loop {
        if cancel.load(Ordering::Relaxed) {
            tracing::info!(clicks, "load more cancelled");
            return clicks;
        }
        match surface.click_load_more() {
            Ok(true) => {
                clicks += 1;
                tracing::debug!(clicks, "clicked load more");
                surface.settle();
            }
            Ok(false) => {
                tracing::info!(clicks, "load more control gone, list fully expanded");
                return clicks;
            }
            Err(e) => {
                tracing::warn!(clicks, error = %e, "load more failed, keeping current page");
                return clicks;
            }
        }
    }
}

/// Sleep-based settle used by the real browser.
pub(crate) fn settle_for(interval: Duration) {
    if !interval.is_zero() {
        std::thread::sleep(interval);
    }
}
