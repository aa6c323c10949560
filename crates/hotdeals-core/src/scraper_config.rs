//! Declarative scraper configuration: where to scrape, how to find each
//! field in the markup, and which output key each field is written under.
//!
//! The whole extraction schema is data. Changing a selector or an output key
//! never requires a code change, only a new `scraper_config.json`.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::deals::ProductField;
use crate::ConfigError;

/// Predicate applied to one attribute of a candidate element.
///
/// Serialized untagged so config files read naturally:
/// `{"href": true}` (present), `{"rel": false}` (absent),
/// `{"data-kind": "deal"}` (equal to a value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrPredicate {
    Present(bool),
    Equals(String),
}

impl AttrPredicate {
    /// Evaluate the predicate against the attribute value found on an element.
    #[must_use]
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            AttrPredicate::Present(true) => value.is_some(),
            AttrPredicate::Present(false) => value.is_none(),
            AttrPredicate::Equals(expected) => value == Some(expected.as_str()),
        }
    }
}

/// Declarative element match: tag name, class token, element id and
/// attribute predicates. Every set part must match.
///
/// A descriptor with nothing set matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub attrs: BTreeMap<String, AttrPredicate>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, AttrPredicate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, AttrPredicate>>::deserialize(deserializer)?.unwrap_or_default())
}

impl SelectorDescriptor {
    #[must_use]
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn with_attr(mut self, name: &str, predicate: AttrPredicate) -> Self {
        self.attrs.insert(name.to_string(), predicate);
        self
    }

    /// `true` when no part of the descriptor is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.class.is_none() && self.id.is_none() && self.attrs.is_empty()
    }

    /// Render the descriptor as a CSS selector for use inside a live browser
    /// page. Returns `None` for an empty descriptor.
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let mut css = self.tag.clone().unwrap_or_default();
        if let Some(class) = &self.class {
            for token in class.split_ascii_whitespace() {
                css.push('.');
                css.push_str(&css_escape_ident(token));
            }
        }
        if let Some(id) = &self.id {
            css.push('#');
            css.push_str(&css_escape_ident(id));
        }
        for (name, predicate) in &self.attrs {
            let name = css_escape_ident(name);
            match predicate {
                AttrPredicate::Present(true) => css.push_str(&format!("[{name}]")),
                AttrPredicate::Present(false) => css.push_str(&format!(":not([{name}])")),
                AttrPredicate::Equals(value) => {
                    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                    css.push_str(&format!("[{name}=\"{escaped}\"]"));
                }
            }
        }
        Some(css)
    }
}

/// Escape `value` for use as a CSS identifier, following `CSS.escape`.
fn css_escape_ident(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let starts_with_dash = value.starts_with('-');
    for (i, ch) in value.chars().enumerate() {
        match ch {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1F}' | '\u{7F}' => out.push_str(&format!("\\{:x} ", u32::from(ch))),
            '0'..='9' if i == 0 || (i == 1 && starts_with_dash) => {
                out.push_str(&format!("\\{:x} ", u32::from(ch)));
            }
            '-' if i == 0 && value.len() == 1 => out.push_str("\\-"),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out
}

/// One descriptor per field the extractor needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    pub load_more_button: SelectorDescriptor,
    pub hot_deals_container: SelectorDescriptor,
    pub product_item: SelectorDescriptor,
    pub title: SelectorDescriptor,
    pub original_price: SelectorDescriptor,
    pub price: SelectorDescriptor,
    pub discount: SelectorDescriptor,
    pub image: SelectorDescriptor,
    pub merchant_image: SelectorDescriptor,
    pub product_link: SelectorDescriptor,
    pub rating: SelectorDescriptor,
}

impl Selectors {
    /// Descriptors paired with their config names, in declaration order.
    #[must_use]
    pub fn named(&self) -> [(&'static str, &SelectorDescriptor); 11] {
        [
            ("load_more_button", &self.load_more_button),
            ("hot_deals_container", &self.hot_deals_container),
            ("product_item", &self.product_item),
            ("title", &self.title),
            ("original_price", &self.original_price),
            ("price", &self.price),
            ("discount", &self.discount),
            ("image", &self.image),
            ("merchant_image", &self.merchant_image),
            ("product_link", &self.product_link),
            ("rating", &self.rating),
        ]
    }
}

/// Output key name for every canonical product field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonKeys {
    pub title: String,
    pub price: String,
    pub original_price: String,
    pub discount: String,
    pub image_url: String,
    pub product_url: String,
    pub merchant: String,
    pub merchant_image: String,
    pub rating: String,
    pub reviews_count: String,
}

impl Default for JsonKeys {
    fn default() -> Self {
        Self {
            title: "title".to_string(),
            price: "price".to_string(),
            original_price: "original_price".to_string(),
            discount: "discount".to_string(),
            image_url: "image_url".to_string(),
            product_url: "product_url".to_string(),
            merchant: "merchant".to_string(),
            merchant_image: "merchant_image".to_string(),
            rating: "rating".to_string(),
            reviews_count: "reviews_count".to_string(),
        }
    }
}

impl JsonKeys {
    /// Output key configured for `field`.
    #[must_use]
    pub fn key(&self, field: ProductField) -> &str {
        match field {
            ProductField::Title => &self.title,
            ProductField::Price => &self.price,
            ProductField::OriginalPrice => &self.original_price,
            ProductField::Discount => &self.discount,
            ProductField::ImageUrl => &self.image_url,
            ProductField::ProductUrl => &self.product_url,
            ProductField::Merchant => &self.merchant,
            ProductField::MerchantImage => &self.merchant_image,
            ProductField::Rating => &self.rating,
            ProductField::ReviewsCount => &self.reviews_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub base_url: String,
    pub selectors: Selectors,
    pub json_keys: JsonKeys,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        let d = SelectorDescriptor::default;
        Self {
            base_url: "https://www.priceza.com".to_string(),
            selectors: Selectors {
                load_more_button: d().with_class("hotdeal-tab__load-more__btn"),
                hot_deals_container: d()
                    .with_tag("div")
                    .with_class("pz-pdb-section")
                    .with_id("home-specials"),
                product_item: d().with_tag("div").with_class("pz-pdb-item"),
                title: d().with_tag("h3").with_class("pz-pdb_name"),
                original_price: d().with_tag("del").with_class("pz-base-price"),
                price: d().with_tag("span").with_class("pz-pdb-price"),
                discount: d().with_tag("div").with_class("pz-label--discount"),
                image: d().with_tag("img").with_class("pz-pdb_media--img"),
                merchant_image: d().with_tag("img").with_class("pz-pdb_store--img"),
                product_link: d()
                    .with_tag("a")
                    .with_attr("href", AttrPredicate::Present(true))
                    .with_attr("onmousedown", AttrPredicate::Present(true)),
                rating: d().with_tag("div").with_class("pz-rating-score-text"),
            },
            json_keys: JsonKeys::default(),
        }
    }
}

impl ScraperConfig {
    /// Check the parts of the config that would make a run meaningless.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if `base_url` is not an absolute
    /// http(s) URL, or if any output key is blank or used twice.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.base_url).map_err(|e| {
            ConfigError::Validation(format!(
                "base_url '{}' is not a valid URL: {e}",
                self.base_url
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "base_url '{}' must use http or https",
                self.base_url
            )));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::Validation(format!(
                "base_url '{}' has no host",
                self.base_url
            )));
        }

        let mut seen = HashSet::new();
        for field in ProductField::ALL {
            let key = self.json_keys.key(field);
            if key.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "json key for '{}' must be non-empty",
                    field.name()
                )));
            }
            if !seen.insert(key) {
                return Err(ConfigError::Validation(format!(
                    "json key '{key}' is used by more than one field"
                )));
            }
        }

        Ok(())
    }

    /// Names of selectors that can never match anything.
    #[must_use]
    pub fn empty_selectors(&self) -> Vec<&'static str> {
        self.selectors
            .named()
            .into_iter()
            .filter(|(_, descriptor)| descriptor.is_empty())
            .map(|(name, _)| name)
            .collect()
    }
}

/// Load and validate the scraper configuration from a JSON file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_scraper_config(path: &Path) -> Result<ScraperConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ConfigFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let config: ScraperConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Validate and write the scraper configuration as pretty JSON, replacing
/// any existing file atomically.
///
/// # Errors
///
/// Returns `ConfigError` if validation fails or the file cannot be written.
pub fn write_scraper_config(path: &Path, config: &ScraperConfig) -> Result<(), ConfigError> {
    config.validate()?;
    let body = serde_json::to_vec_pretty(config)?;
    crate::atomic::write_file_atomic(path, &body).map_err(|e| ConfigError::ConfigFileIo {
        path: path.display().to_string(),
        source: e,
    })
}
