//! Live integration tests for hotdeals-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/hotdeals-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use hotdeals_core::ProductRecord;
use hotdeals_db::{get_deals, list_merchant_names, reconcile_deals, DealFilters, ReconcileSummary};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn record(title: &str, price: &str, merchant: Option<&str>) -> ProductRecord {
    ProductRecord {
        title: title.to_string(),
        price: price.to_string(),
        original_price: Some("2,590".to_string()),
        discount: Some("-50%".to_string()),
        image_url: Some("https://img.example.com/p.jpg".to_string()),
        product_url: Some("https://www.priceza.com/go/1".to_string()),
        merchant: merchant.map(str::to_string),
        merchant_image: None,
        rating: Some("4.5(120)".to_string()),
        reviews_count: Some("120".to_string()),
    }
}

async fn deal_count(pool: &sqlx::PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM deals")
        .fetch_one(pool)
        .await
        .expect("count deals")
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn first_observation_inserts_with_zero_duplicates(pool: sqlx::PgPool) {
    let summary = reconcile_deals(&pool, &[record("Kettle", "650", Some("LAZADA"))]).await;
    assert_eq!(
        summary,
        ReconcileSummary {
            inserted: 1,
            updated: 0,
            failed: 0
        }
    );

    let page = get_deals(&pool, &DealFilters::default())
        .await
        .expect("get_deals");
    assert_eq!(page.products.len(), 1);
    assert_eq!(page.products[0].duplicate_count, 0);
    assert_eq!(page.products[0].merchant.as_deref(), Some("LAZADA"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn repeat_observation_updates_and_counts_duplicate(pool: sqlx::PgPool) {
    reconcile_deals(&pool, &[record("Kettle", "650", Some("LAZADA"))]).await;
    let summary = reconcile_deals(&pool, &[record("Kettle", "599", Some("LAZADA"))]).await;
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.inserted, 0);

    assert_eq!(deal_count(&pool).await, 1);
    let page = get_deals(&pool, &DealFilters::default())
        .await
        .expect("get_deals");
    let row = &page.products[0];
    assert_eq!(row.duplicate_count, 1);
    assert_eq!(row.price, "599");
    assert!(row.updated_at >= row.scraped_at);
}

#[sqlx::test(migrations = "../../migrations")]
async fn merchant_less_deals_collide_on_repeat(pool: sqlx::PgPool) {
    let mut lamp = record("Desk Lamp", "399", None);
    lamp.original_price = None;

    reconcile_deals(&pool, std::slice::from_ref(&lamp)).await;
    reconcile_deals(&pool, std::slice::from_ref(&lamp)).await;

    assert_eq!(deal_count(&pool).await, 1);
    let page = get_deals(&pool, &DealFilters::default())
        .await
        .expect("get_deals");
    assert_eq!(page.products[0].original_price, "");
    assert_eq!(page.products[0].duplicate_count, 1);
    assert!(page.products[0].merchant_id.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn different_original_price_is_a_different_deal(pool: sqlx::PgPool) {
    let first = record("Kettle", "650", Some("LAZADA"));
    let mut second = first.clone();
    second.original_price = Some("1,000".to_string());

    let summary = reconcile_deals(&pool, &[first, second]).await;
    assert_eq!(summary.inserted, 2);
    assert_eq!(deal_count(&pool).await, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn failed_record_is_counted_and_the_rest_are_stored(pool: sqlx::PgPool) {
    // Postgres rejects NUL bytes in text columns.
    let records = [
        record("Kettle", "650", Some("LAZADA")),
        record("Broken\0Title", "100", Some("LAZADA")),
        record("Toaster", "890", Some("SHOPEE")),
    ];

    let summary = reconcile_deals(&pool, &records).await;
    assert_eq!(
        summary,
        ReconcileSummary {
            inserted: 2,
            updated: 0,
            failed: 1
        }
    );
    assert_eq!(deal_count(&pool).await, 2);
}

// ---------------------------------------------------------------------------
// Merchants
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn merchants_are_unique_case_insensitively(pool: sqlx::PgPool) {
    reconcile_deals(
        &pool,
        &[
            record("Kettle", "650", Some("Lazada")),
            record("Toaster", "890", Some("LAZADA")),
            record("Fan", "450", Some("SHOPEE")),
        ],
    )
    .await;

    let names = list_merchant_names(&pool).await.expect("list merchants");
    assert_eq!(names, vec!["Lazada".to_string(), "SHOPEE".to_string()]);

    let ids: Vec<Option<i64>> =
        sqlx::query_scalar("SELECT merchant_id FROM deals WHERE title IN ('Kettle', 'Toaster')")
            .fetch_all(&pool)
            .await
            .expect("merchant ids");
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], ids[1]);
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn get_deals_filters_by_merchant_and_title(pool: sqlx::PgPool) {
    reconcile_deals(
        &pool,
        &[
            record("Robot Vacuum X2", "4,990", Some("SHOPEE")),
            record("Robot Mop", "2,990", Some("LAZADA")),
            record("Air Fryer", "1,590", Some("LAZADA")),
        ],
    )
    .await;

    let by_merchant = get_deals(
        &pool,
        &DealFilters {
            merchant: Some("lazada"),
            ..DealFilters::default()
        },
    )
    .await
    .expect("merchant filter");
    assert_eq!(by_merchant.total_products, 2);

    let by_both = get_deals(
        &pool,
        &DealFilters {
            merchant: Some("LAZADA"),
            title: Some("robot"),
            ..DealFilters::default()
        },
    )
    .await
    .expect("merchant and title filter");
    assert_eq!(by_both.total_products, 1);
    assert_eq!(by_both.products[0].title, "Robot Mop");
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_deals_pages_results(pool: sqlx::PgPool) {
    let records: Vec<_> = (0..5)
        .map(|i| record(&format!("Item {i}"), "100", Some("LAZADA")))
        .collect();
    reconcile_deals(&pool, &records).await;

    let second = get_deals(
        &pool,
        &DealFilters {
            page: 2,
            page_size: 2,
            ..DealFilters::default()
        },
    )
    .await
    .expect("page 2");
    assert_eq!(second.total_products, 5);
    assert_eq!(second.products.len(), 2);
    assert_eq!(second.page, 2);
    assert_eq!(second.page_size, 2);

    let clamped = get_deals(
        &pool,
        &DealFilters {
            page: 0,
            page_size: 10_000,
            ..DealFilters::default()
        },
    )
    .await
    .expect("clamped");
    assert_eq!(clamped.page, 1);
    assert_eq!(clamped.page_size, 200);
    assert_eq!(clamped.products.len(), 5);
}
