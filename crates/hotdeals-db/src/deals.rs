//! Database operations for `deals`: reconciling a run's records into the
//! table and reading them back a page at a time.

use chrono::{DateTime, Utc};
use hotdeals_core::ProductRecord;
use sqlx::{PgConnection, PgPool};

use crate::merchants::upsert_merchant;
use crate::DbError;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

/// A row from `deals`, joined with its merchant name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredDealRow {
    pub id: i64,
    pub title: String,
    pub price: String,
    /// `''` when the listing showed no original price.
    pub original_price: String,
    pub discount: Option<String>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub merchant_id: Option<i64>,
    pub merchant: Option<String>,
    pub merchant_image: Option<String>,
    pub rating: Option<String>,
    pub reviews_count: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of times the deal was seen again after the first insert.
    pub duplicate_count: i32,
}

/// Outcome counts of one [`reconcile_deals`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Input filters for [`get_deals`].
///
/// `page` is 1-based; out-of-range values are clamped.
#[derive(Debug, Clone)]
pub struct DealFilters<'a> {
    pub page: i64,
    pub page_size: i64,
    /// Exact merchant name, case-insensitive.
    pub merchant: Option<&'a str>,
    /// Substring of the title, case-insensitive.
    pub title: Option<&'a str>,
}

impl Default for DealFilters<'_> {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            merchant: None,
            title: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DealsPage {
    pub total_products: i64,
    pub products: Vec<StoredDealRow>,
    pub page: i64,
    pub page_size: i64,
}

/// Upsert every record, each in its own transaction.
///
/// A deal is identified by `(title, original_price, merchant)`. The first
/// observation inserts it with `duplicate_count = 0`; each later observation
/// refreshes the mutable fields, bumps `updated_at` and increments
/// `duplicate_count`. A record that fails is rolled back and counted in
/// `failed`; the remaining records are still processed.
pub async fn reconcile_deals(pool: &PgPool, records: &[ProductRecord]) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();

    for record in records {
        match reconcile_one(pool, record).await {
            Ok(true) => summary.inserted += 1,
            Ok(false) => summary.updated += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::error!(title = %record.title, error = %e, "failed to store deal");
            }
        }
    }

    tracing::info!(
        inserted = summary.inserted,
        updated = summary.updated,
        failed = summary.failed,
        "deals reconciled"
    );
    summary
}

/// Returns `true` when the deal was newly inserted.
async fn reconcile_one(pool: &PgPool, record: &ProductRecord) -> Result<bool, DbError> {
    let mut tx = pool.begin().await?;
    let inserted = upsert_deal(&mut *tx, record).await?;
    tx.commit().await?;
    tracing::debug!(
        title = %record.title,
        rating = record.rating.as_deref().unwrap_or(""),
        reviews = record.reviews_count.as_deref().unwrap_or(""),
        inserted,
        "deal stored"
    );
    Ok(inserted)
}

async fn upsert_deal(conn: &mut PgConnection, record: &ProductRecord) -> Result<bool, DbError> {
    let merchant_id = match record.merchant.as_deref().filter(|m| !m.is_empty()) {
        Some(name) => Some(upsert_merchant(conn, name).await?),
        None => None,
    };

    let inserted = sqlx::query_scalar::<_, bool>(
        "INSERT INTO deals \
             (title, price, original_price, discount, image_url, product_url, \
              merchant_id, merchant_image, rating, reviews_count) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT ON CONSTRAINT deals_identity_key DO UPDATE SET \
             price           = EXCLUDED.price, \
             discount        = EXCLUDED.discount, \
             image_url       = EXCLUDED.image_url, \
             product_url     = EXCLUDED.product_url, \
             merchant_image  = EXCLUDED.merchant_image, \
             rating          = EXCLUDED.rating, \
             reviews_count   = EXCLUDED.reviews_count, \
             updated_at      = NOW(), \
             duplicate_count = deals.duplicate_count + 1 \
         RETURNING (xmax = 0)",
    )
    .bind(&record.title)
    .bind(&record.price)
    .bind(record.original_price.as_deref().unwrap_or(""))
    .bind(&record.discount)
    .bind(&record.image_url)
    .bind(&record.product_url)
    .bind(merchant_id)
    .bind(&record.merchant_image)
    .bind(&record.rating)
    .bind(&record.reviews_count)
    .fetch_one(&mut *conn)
    .await?;

    Ok(inserted)
}

/// One page of stored deals, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn get_deals(pool: &PgPool, filters: &DealFilters<'_>) -> Result<DealsPage, DbError> {
    let page = filters.page.max(1);
    let page_size = filters.page_size.clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1).saturating_mul(page_size);
    let merchant = filters.merchant.filter(|m| !m.trim().is_empty());
    let title = filters.title.filter(|t| !t.trim().is_empty());

    let total_products = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) \
         FROM deals d \
         LEFT JOIN merchants m ON m.id = d.merchant_id \
         WHERE ($1::TEXT IS NULL OR LOWER(m.name) = LOWER($1)) \
           AND ($2::TEXT IS NULL OR d.title ILIKE '%' || $2 || '%')",
    )
    .bind(merchant)
    .bind(title)
    .fetch_one(pool)
    .await?;

    let products = sqlx::query_as::<_, StoredDealRow>(
        "SELECT \
             d.id, d.title, d.price, d.original_price, d.discount, d.image_url, \
             d.product_url, d.merchant_id, m.name AS merchant, d.merchant_image, \
             d.rating, d.reviews_count, d.scraped_at, d.updated_at, d.duplicate_count \
         FROM deals d \
         LEFT JOIN merchants m ON m.id = d.merchant_id \
         WHERE ($1::TEXT IS NULL OR LOWER(m.name) = LOWER($1)) \
           AND ($2::TEXT IS NULL OR d.title ILIKE '%' || $2 || '%') \
         ORDER BY d.scraped_at DESC, d.id DESC \
         LIMIT $3 OFFSET $4",
    )
    .bind(merchant)
    .bind(title)
    .bind(page_size)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(DealsPage {
        total_products,
        products,
        page,
        page_size,
    })
}
