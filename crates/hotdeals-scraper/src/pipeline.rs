//! Load the hot-deals page and turn it into validated, filtered records.

use hotdeals_core::{ProductRecord, ScraperConfig};
use scraper::Html;

use crate::extract::extract;
use crate::loader::PageLoader;
use crate::selector::{find, find_all};

/// Upper-cased merchant names a run is restricted to. Empty allows all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList(Vec<String>);

impl AllowList {
    #[must_use]
    pub fn new<I, S>(merchants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            merchants
                .into_iter()
                .map(|m| m.as_ref().trim().to_uppercase())
                .filter(|m| !m.is_empty())
                .collect(),
        )
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn merchants(&self) -> &[String] {
        &self.0
    }

    /// A record passes when the list is empty or its merchant is listed.
    /// Records without a merchant never pass a non-empty list.
    #[must_use]
    pub fn permits(&self, merchant: Option<&str>) -> bool {
        self.0.is_empty()
            || merchant
                .is_some_and(|m| self.0.iter().any(|allowed| allowed.eq_ignore_ascii_case(m)))
    }
}

/// Load `config.base_url` and collect every valid deal on it, in page order.
///
/// Load failures and a missing container are logged and produce an empty
/// result rather than an error.
pub async fn collect_deals<L: PageLoader>(
    loader: &L,
    config: &ScraperConfig,
    allow: &AllowList,
) -> Vec<ProductRecord> {
    if allow.is_empty() {
        tracing::info!(url = %config.base_url, "collecting hot deals");
    } else {
        tracing::info!(
            url = %config.base_url,
            merchants = ?allow.merchants(),
            "collecting hot deals for selected merchants"
        );
    }

    let html = match loader.load(&config.base_url).await {
        Ok(html) => html,
        Err(e) => {
            tracing::error!(url = %config.base_url, error = %e, "could not load hot deals page");
            return Vec::new();
        }
    };

    let records = parse_deals(&html, config, allow);
    tracing::info!(count = records.len(), "hot deals collected");
    records
}

/// Synchronous half of [`collect_deals`]: parse, locate, extract, filter.
#[must_use]
pub fn parse_deals(html: &str, config: &ScraperConfig, allow: &AllowList) -> Vec<ProductRecord> {
    let document = Html::parse_document(html);
    let selectors = &config.selectors;

    let Some(container) = find(document.root_element(), &selectors.hot_deals_container) else {
        tracing::warn!("hot deals container not found on page");
        return Vec::new();
    };

    let items = find_all(container, &selectors.product_item);
    tracing::info!(items = items.len(), "product items found");

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let Some(record) = extract(item, config).into_record() else {
            tracing::warn!(position = index + 1, "skipping item without title or price");
            continue;
        };
        if !allow.permits(record.merchant.as_deref()) {
            tracing::debug!(
                position = index + 1,
                merchant = record.merchant.as_deref().unwrap_or(""),
                "merchant not in allow-list"
            );
            continue;
        }
        records.push(record);
    }
    records
}
