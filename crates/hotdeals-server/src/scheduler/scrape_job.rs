//! The scrape job shared by the cron schedule, the startup run and
//! `POST /api/scrape`.

use std::sync::Arc;

use hotdeals_core::AppConfig;
use hotdeals_db::{reconcile_deals, ReconcileSummary};
use hotdeals_scraper::{AllowList, ConfiguredLoader, ScrapeRun, ScraperError};
use sqlx::PgPool;

/// What one run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub collected: usize,
    /// Whether the latest-deals document was replaced.
    pub published: bool,
    pub persisted: ReconcileSummary,
}

/// Start a run with the configured allow-list and log its outcome. A run
/// already in progress is skipped.
pub async fn run_scheduled_scrape(pool: PgPool, config: Arc<AppConfig>) {
    let run = match ScrapeRun::begin(&config.data_paths()) {
        Ok(run) => run,
        Err(ScraperError::AlreadyRunning { .. }) => {
            tracing::info!("scheduler: previous run still in progress, skipping");
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, "scheduler: could not start run");
            return;
        }
    };

    let allow = AllowList::new(&config.allowed_merchants);
    execute_run(run, &pool, &config, &allow).await;
}

/// Drive a begun run to completion: load the page, publish the latest-deals
/// document, then reconcile the records into the database. The status
/// returns to idle when the run is dropped at the end, whatever happened.
pub async fn execute_run(
    run: ScrapeRun,
    pool: &PgPool,
    config: &AppConfig,
    allow: &AllowList,
) -> RunOutcome {
    let loader = match ConfiguredLoader::from_config(config.loader, config, run.config()) {
        Ok(loader) => loader,
        Err(e) => {
            tracing::error!(loader = %config.loader, error = %e, "could not build page loader");
            return RunOutcome::default();
        }
    };

    let records = run.collect(&loader, allow).await;

    let published = match run.publish(&records) {
        Ok(published) => published,
        Err(e) => {
            tracing::error!(error = %e, "failed to write latest deals");
            false
        }
    };

    let persisted = if records.is_empty() {
        ReconcileSummary::default()
    } else {
        reconcile_deals(pool, &records).await
    };
    drop(run);

    let outcome = RunOutcome {
        collected: records.len(),
        published,
        persisted,
    };
    tracing::info!(
        collected = outcome.collected,
        published = outcome.published,
        inserted = outcome.persisted.inserted,
        updated = outcome.persisted.updated,
        failed = outcome.persisted.failed,
        "hot-deals run complete"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use hotdeals_core::{build_app_config, write_scraper_config, ScraperConfig};
    use hotdeals_scraper::{read_status, StatusGuard};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const FIXTURE: &str = include_str!("../../../hotdeals-scraper/tests/fixtures/hot_deals.html");

    fn http_config(data_dir: &std::path::Path) -> AppConfig {
        let dir = data_dir.display().to_string();
        let env: HashMap<&str, &str> = HashMap::from([
            ("HOTDEALS_DATA_DIR", dir.as_str()),
            ("HOTDEALS_LOADER", "http"),
            ("HOTDEALS_SCRAPER_MAX_RETRIES", "0"),
        ]);
        build_app_config(|key| {
            env.get(key)
                .map(|v| (*v).to_string())
                .ok_or(std::env::VarError::NotPresent)
        })
        .expect("test config")
    }

    async fn serve_fixture(data_dir: &std::path::Path) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FIXTURE))
            .mount(&server)
            .await;

        let scraper_config = ScraperConfig {
            base_url: server.uri(),
            ..ScraperConfig::default()
        };
        write_scraper_config(&data_dir.join("scraper_config.json"), &scraper_config)
            .expect("write scraper config");
        server
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn run_publishes_and_persists_collected_deals(pool: PgPool) {
        let dir = tempfile::tempdir().expect("tempdir");
        let _server = serve_fixture(dir.path()).await;
        let config = http_config(dir.path());

        let run = ScrapeRun::begin(&config.data_paths()).expect("begin");
        let outcome = execute_run(run, &pool, &config, &AllowList::default()).await;

        assert_eq!(outcome.collected, 4);
        assert!(outcome.published);
        assert_eq!(outcome.persisted.inserted, 4);
        assert!(config.data_paths().latest_deals.exists());
        assert!(!read_status(&config.data_paths().status).is_scraping);

        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM deals")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(stored, 4);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn second_run_counts_duplicates_instead_of_inserting(pool: PgPool) {
        let dir = tempfile::tempdir().expect("tempdir");
        let _server = serve_fixture(dir.path()).await;
        let config = http_config(dir.path());
        let allow = AllowList::new(["lazada"]);

        for _ in 0..2 {
            let run = ScrapeRun::begin(&config.data_paths()).expect("begin");
            execute_run(run, &pool, &config, &allow).await;
        }

        let (rows, duplicates): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(duplicate_count), 0)::BIGINT FROM deals",
        )
        .fetch_one(&pool)
        .await
        .expect("aggregate");
        assert_eq!(rows, 1);
        assert_eq!(duplicates, 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn failed_load_keeps_previous_latest_deals(pool: PgPool) {
        let dir = tempfile::tempdir().expect("tempdir");
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let scraper_config = ScraperConfig {
            base_url: server.uri(),
            ..ScraperConfig::default()
        };
        write_scraper_config(&dir.path().join("scraper_config.json"), &scraper_config)
            .expect("write scraper config");
        let config = http_config(dir.path());
        let latest = config.data_paths().latest_deals;
        std::fs::write(&latest, "previous").expect("seed latest");

        let run = ScrapeRun::begin(&config.data_paths()).expect("begin");
        let outcome = execute_run(run, &pool, &config, &AllowList::default()).await;

        assert_eq!(outcome, RunOutcome::default());
        assert_eq!(std::fs::read_to_string(&latest).expect("read"), "previous");
    }

    #[tokio::test]
    async fn scheduled_run_is_skipped_while_another_holds_the_status() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Arc::new(http_config(dir.path()));
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool");

        let guard = StatusGuard::acquire(&config.data_paths().status).expect("acquire");
        run_scheduled_scrape(pool, Arc::clone(&config)).await;

        assert!(read_status(&config.data_paths().status).is_scraping);
        assert!(!config.data_paths().latest_deals.exists());
        drop(guard);
    }
}
