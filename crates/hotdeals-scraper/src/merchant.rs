//! Merchant name inference.
//!
//! A listing names its merchant in up to three places. Each is read by its
//! own strategy and the first one that yields a name wins.

use std::sync::LazyLock;

use regex::Regex;

static TRAILING_VARIANT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)N\d+$").expect("valid variant suffix regex"));
static TRACKING_EVENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"addGAInteractionEvent\('MerchantProducts','([^']*)'\)")
        .expect("valid tracking regex")
});
static LOGO_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)logo").expect("valid logo regex"));

/// The raw merchant hints found on one product item.
#[derive(Debug, Clone, Copy, Default)]
pub struct MerchantSignals<'a> {
    /// Merchant image source, lazy-load attribute already preferred.
    pub image_src: Option<&'a str>,
    pub image_alt: Option<&'a str>,
    /// `onmousedown` of the product link.
    pub link_tracking: Option<&'a str>,
}

pub type MerchantStrategy = fn(&MerchantSignals<'_>) -> Option<String>;

/// Strategies in priority order.
pub const MERCHANT_STRATEGIES: &[(&str, MerchantStrategy)] = &[
    ("image_filename", from_image_filename),
    ("tracking_event", from_tracking_event),
    ("logo_alt", from_logo_alt),
];

/// Run the strategies in order and return the first name found.
#[must_use]
pub fn resolve_merchant(signals: &MerchantSignals<'_>) -> Option<String> {
    MERCHANT_STRATEGIES.iter().find_map(|(name, strategy)| {
        let merchant = strategy(signals)?;
        tracing::trace!(strategy = name, merchant = %merchant, "merchant resolved");
        Some(merchant)
    })
}

/// `.../lazadaN12.png` → `LAZADA`.
#[must_use]
pub fn from_image_filename(signals: &MerchantSignals<'_>) -> Option<String> {
    let src = signals.image_src?;
    let file = src.rsplit('/').next().unwrap_or(src);
    let stem = file.split('.').next().unwrap_or(file);
    normalize(&TRAILING_VARIANT_RE.replace(stem, ""))
}

/// `addGAInteractionEvent('MerchantProducts','Shopee')` → `SHOPEE`.
#[must_use]
pub fn from_tracking_event(signals: &MerchantSignals<'_>) -> Option<String> {
    let captures = TRACKING_EVENT_RE.captures(signals.link_tracking?)?;
    normalize(captures.get(1)?.as_str())
}

/// `"Lazada Logo"` → `LAZADA`. Alt text without the word "logo" is ignored.
#[must_use]
pub fn from_logo_alt(signals: &MerchantSignals<'_>) -> Option<String> {
    let alt = signals.image_alt?;
    if !LOGO_WORD_RE.is_match(alt) {
        return None;
    }
    normalize(&LOGO_WORD_RE.replace_all(alt, ""))
}

fn normalize(raw: &str) -> Option<String> {
    let name = raw.trim().to_uppercase();
    (!name.is_empty()).then_some(name)
}
