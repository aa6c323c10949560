//! Per-item field extraction.
//!
//! Each field rule is independent: a missing node or attribute leaves that
//! one field empty and the rest of the item is still read. Whether the item
//! is usable at all is decided later by [`ExtractedProduct::into_record`].

use std::sync::LazyLock;

use hotdeals_core::{ProductRecord, ScraperConfig, SelectorDescriptor};
use regex::Regex;
use scraper::ElementRef;

use crate::merchant::{resolve_merchant, MerchantSignals};
use crate::selector::find;

const TITLE_PREFIX: &str = "ราคา ";
const CURRENCY_GLYPH: char = '฿';

static REVIEWS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)\)").expect("valid reviews regex"));

/// Everything read from one product item, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedProduct {
    pub title: Option<String>,
    pub price: Option<String>,
    pub original_price: Option<String>,
    pub discount: Option<String>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub merchant: Option<String>,
    pub merchant_image: Option<String>,
    pub rating: Option<String>,
    pub reviews_count: Option<String>,
}

impl ExtractedProduct {
    /// Turn the extraction into a record. Items without both a title and a
    /// price are not deals and yield `None`.
    #[must_use]
    pub fn into_record(self) -> Option<ProductRecord> {
        Some(ProductRecord {
            title: self.title.filter(|s| !s.is_empty())?,
            price: self.price.filter(|s| !s.is_empty())?,
            original_price: self.original_price,
            discount: self.discount,
            image_url: self.image_url,
            product_url: self.product_url,
            merchant: self.merchant,
            merchant_image: self.merchant_image,
            rating: self.rating,
            reviews_count: self.reviews_count,
        })
    }
}

/// Read every field of `item` using the selectors in `config`.
#[must_use]
pub fn extract(item: ElementRef<'_>, config: &ScraperConfig) -> ExtractedProduct {
    let selectors = &config.selectors;
    let base_url = config.base_url.as_str();
    let mut product = ExtractedProduct::default();

    product.title = field(item, &selectors.title, "title").and_then(|el| {
        let title = el.value().attr("title")?.replace(TITLE_PREFIX, "");
        non_empty(title.trim())
    });

    product.original_price = field(item, &selectors.original_price, "original_price")
        .and_then(|el| non_empty(&strip_currency(&stripped_text(el, None))));

    product.price = field(item, &selectors.price, "price").and_then(|el| {
        let nested = find(el, &selectors.original_price);
        non_empty(&strip_currency(&stripped_text(el, nested)))
    });

    product.discount = field(item, &selectors.discount, "discount")
        .and_then(|el| non_empty(&stripped_text(el, None)));

    product.image_url = field(item, &selectors.image, "image")
        .and_then(lazy_src)
        .and_then(|src| join_url(base_url, src));

    let merchant_image = field(item, &selectors.merchant_image, "merchant_image");
    let merchant_src = merchant_image.and_then(lazy_src);
    product.merchant_image = merchant_src.and_then(|src| join_url(base_url, src));

    let link = field(item, &selectors.product_link, "product_link");
    product.product_url = link
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| join_url(base_url, href));

    product.merchant = resolve_merchant(&MerchantSignals {
        image_src: merchant_src,
        image_alt: merchant_image.and_then(|el| el.value().attr("alt")),
        link_tracking: link.and_then(|el| el.value().attr("onmousedown")),
    });
    if product.merchant.is_none() {
        tracing::debug!("no merchant signal matched");
    }

    let rating = field(item, &selectors.rating, "rating")
        .and_then(|el| non_empty(&stripped_text(el, None)));
    if let Some(rating) = rating {
        product.reviews_count = reviews_count(&rating);
        product.rating = Some(rating);
    }

    product
}

/// Digits of the first parenthesised count: `"4.5 (120)"` → `"120"`.
#[must_use]
pub fn reviews_count(rating: &str) -> Option<String> {
    REVIEWS_RE
        .captures(rating)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Every text node under `el` trimmed and concatenated, skipping anything
/// inside `exclude`.
fn stripped_text(el: ElementRef<'_>, exclude: Option<ElementRef<'_>>) -> String {
    let excluded_id = exclude.map(|e| e.id());
    el.descendants()
        .filter(|node| {
            excluded_id
                .is_none_or(|id| node.id() != id && !node.ancestors().any(|a| a.id() == id))
        })
        .filter_map(|node| node.value().as_text())
        .map(|text| text.trim())
        .collect()
}

fn field<'a>(
    item: ElementRef<'a>,
    descriptor: &SelectorDescriptor,
    name: &'static str,
) -> Option<ElementRef<'a>> {
    let found = find(item, descriptor);
    if found.is_none() {
        tracing::debug!(field = name, "selector matched nothing in item");
    }
    found
}

/// Lazy-loaded images keep the real URL in `data-original`.
fn lazy_src(el: ElementRef<'_>) -> Option<&str> {
    let attr = |name| el.value().attr(name).filter(|v| !v.trim().is_empty());
    attr("data-original").or_else(|| attr("src"))
}

fn join_url(base: &str, reference: &str) -> Option<String> {
    match reqwest::Url::parse(base).and_then(|b| b.join(reference.trim())) {
        Ok(url) => Some(url.into()),
        Err(e) => {
            tracing::debug!(base, reference, error = %e, "could not resolve URL");
            None
        }
    }
}

fn strip_currency(text: &str) -> String {
    text.replace(CURRENCY_GLYPH, "").trim().to_string()
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
