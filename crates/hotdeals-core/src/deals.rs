use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::scraper_config::JsonKeys;

/// Canonical product fields, independent of the output key they are written
/// under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductField {
    Title,
    Price,
    OriginalPrice,
    Discount,
    ImageUrl,
    ProductUrl,
    Merchant,
    MerchantImage,
    Rating,
    ReviewsCount,
}

impl ProductField {
    /// Record order.
    pub const ALL: [ProductField; 10] = [
        ProductField::Title,
        ProductField::Price,
        ProductField::OriginalPrice,
        ProductField::Discount,
        ProductField::ImageUrl,
        ProductField::ProductUrl,
        ProductField::Merchant,
        ProductField::MerchantImage,
        ProductField::Rating,
        ProductField::ReviewsCount,
    ];

    /// Column order of delimited exports.
    pub const EXPORT_COLUMNS: [ProductField; 10] = [
        ProductField::Title,
        ProductField::Price,
        ProductField::OriginalPrice,
        ProductField::Discount,
        ProductField::Merchant,
        ProductField::Rating,
        ProductField::ReviewsCount,
        ProductField::ImageUrl,
        ProductField::ProductUrl,
        ProductField::MerchantImage,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ProductField::Title => "title",
            ProductField::Price => "price",
            ProductField::OriginalPrice => "original_price",
            ProductField::Discount => "discount",
            ProductField::ImageUrl => "image_url",
            ProductField::ProductUrl => "product_url",
            ProductField::Merchant => "merchant",
            ProductField::MerchantImage => "merchant_image",
            ProductField::Rating => "rating",
            ProductField::ReviewsCount => "reviews_count",
        }
    }
}

/// One hot-deal listing as extracted from the page.
///
/// `title` and `price` are always non-empty; the scraper only builds a
/// record once both are known. Every other field is `None` when the page did
/// not provide it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: String,
    /// Currency glyph stripped, otherwise verbatim (e.g. `"1,290"`).
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<String>,
    /// Free text such as `"-20%"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    /// Upper-cased merchant name, e.g. `"LAZADA"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    /// Digits only, taken from the rating text (`"4.5 (120)"` → `"120"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews_count: Option<String>,
}

impl ProductRecord {
    /// Value of `field`, `None` when absent.
    #[must_use]
    pub fn get(&self, field: ProductField) -> Option<&str> {
        match field {
            ProductField::Title => Some(&self.title),
            ProductField::Price => Some(&self.price),
            ProductField::OriginalPrice => self.original_price.as_deref(),
            ProductField::Discount => self.discount.as_deref(),
            ProductField::ImageUrl => self.image_url.as_deref(),
            ProductField::ProductUrl => self.product_url.as_deref(),
            ProductField::Merchant => self.merchant.as_deref(),
            ProductField::MerchantImage => self.merchant_image.as_deref(),
            ProductField::Rating => self.rating.as_deref(),
            ProductField::ReviewsCount => self.reviews_count.as_deref(),
        }
    }

    /// Render the record under the configured output keys. Absent fields are
    /// written as empty strings so every object has the same shape.
    #[must_use]
    pub fn to_json_object(&self, keys: &JsonKeys) -> Map<String, Value> {
        ProductField::ALL
            .into_iter()
            .map(|field| {
                (
                    keys.key(field).to_string(),
                    Value::String(self.get(field).unwrap_or_default().to_string()),
                )
            })
            .collect()
    }

    /// Inverse of [`Self::to_json_object`]. Returns `None` when the object
    /// has no usable title or price.
    #[must_use]
    pub fn from_json_object(object: &Map<String, Value>, keys: &JsonKeys) -> Option<Self> {
        let read = |field: ProductField| -> Option<String> {
            object
                .get(keys.key(field))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Some(Self {
            title: read(ProductField::Title)?,
            price: read(ProductField::Price)?,
            original_price: read(ProductField::OriginalPrice),
            discount: read(ProductField::Discount),
            image_url: read(ProductField::ImageUrl),
            product_url: read(ProductField::ProductUrl),
            merchant: read(ProductField::Merchant),
            merchant_image: read(ProductField::MerchantImage),
            rating: read(ProductField::Rating),
            reviews_count: read(ProductField::ReviewsCount),
        })
    }
}

/// The persisted collection document: `{ timestamp, total_products, products }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealsEnvelope {
    /// ISO-8601 timestamp with offset, or empty for a document never written.
    pub timestamp: String,
    pub total_products: usize,
    pub products: Vec<Map<String, Value>>,
}

impl DealsEnvelope {
    #[must_use]
    pub fn new(records: &[ProductRecord], keys: &JsonKeys, at: DateTime<FixedOffset>) -> Self {
        Self {
            timestamp: at.to_rfc3339(),
            total_products: records.len(),
            products: records.iter().map(|r| r.to_json_object(keys)).collect(),
        }
    }

    /// Envelope stamped with the local time.
    #[must_use]
    pub fn now(records: &[ProductRecord], keys: &JsonKeys) -> Self {
        Self::new(records, keys, Local::now().fixed_offset())
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            timestamp: String::new(),
            total_products: 0,
            products: Vec::new(),
        }
    }

    /// Decode the products back into records, dropping entries without a
    /// title or price.
    #[must_use]
    pub fn records(&self, keys: &JsonKeys) -> Vec<ProductRecord> {
        self.products
            .iter()
            .filter_map(|object| ProductRecord::from_json_object(object, keys))
            .collect()
    }
}

/// The status document read by monitoring: `{ "is_scraping": bool }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScraperStatus {
    pub is_scraping: bool,
}
