//! Offline unit tests for hotdeals-db pool configuration and row types.
//! These tests do not require a live database connection.

use hotdeals_core::{AppConfig, Environment, LoaderKind};
use hotdeals_db::{DealFilters, PoolConfig, ReconcileSummary, StoredDealRow};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

fn app_config(database_url: Option<&str>) -> AppConfig {
    AppConfig {
        database_url: database_url.map(str::to_string),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8000),
        log_level: "info".to_string(),
        data_dir: PathBuf::from("./data"),
        schedule: "0 */30 * * * *".to_string(),
        run_on_startup: false,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        loader: LoaderKind::Http,
        chrome_path: None,
        browser_initial_wait_ms: 0,
        load_more_settle_ms: 0,
        scraper_request_timeout_secs: 30,
        scraper_user_agent: "ua".to_string(),
        scraper_max_retries: 3,
        scraper_retry_backoff_base_secs: 1,
        allowed_merchants: Vec::new(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config(Some("postgres://example")));
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[tokio::test]
async fn connect_without_database_url_fails_fast() {
    let result = hotdeals_db::connect_from_app_config(&app_config(None)).await;
    assert!(matches!(result, Err(hotdeals_db::DbError::MissingDatabaseUrl)));
}

#[test]
fn deal_filters_default_to_first_page_of_fifty() {
    let filters = DealFilters::default();
    assert_eq!(filters.page, 1);
    assert_eq!(filters.page_size, 50);
    assert!(filters.merchant.is_none());
    assert!(filters.title.is_none());
}

#[test]
fn reconcile_summary_starts_at_zero() {
    assert_eq!(
        ReconcileSummary::default(),
        ReconcileSummary {
            inserted: 0,
            updated: 0,
            failed: 0
        }
    );
}

/// Compile-time smoke test: confirm that [`StoredDealRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn stored_deal_row_has_expected_fields() {
    use chrono::Utc;

    let row = StoredDealRow {
        id: 1_i64,
        title: "Air Fryer 5L".to_string(),
        price: "1,590".to_string(),
        original_price: String::new(),
        discount: None,
        image_url: None,
        product_url: Some("https://www.priceza.com/go/1003".to_string()),
        merchant_id: None,
        merchant: None,
        merchant_image: None,
        rating: None,
        reviews_count: None,
        scraped_at: Utc::now(),
        updated_at: Utc::now(),
        duplicate_count: 0_i32,
    };

    assert_eq!(row.id, 1);
    assert!(row.original_price.is_empty());
    assert!(row.merchant.is_none());
    assert_eq!(row.duplicate_count, 0);
}
