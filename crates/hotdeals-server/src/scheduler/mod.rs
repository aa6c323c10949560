//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring hot-deals scrape.

mod scrape_job;

use std::sync::Arc;

use hotdeals_core::AppConfig;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

pub use scrape_job::{execute_run, run_scheduled_scrape};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the configured cron expression is invalid, or the scheduler fails to
/// start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_scrape_job(&scheduler, pool, config).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the recurring scrape on `config.schedule` (six-field cron,
/// seconds first; every 30 minutes by default).
async fn register_scrape_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<AppConfig>,
) -> Result<(), JobSchedulerError> {
    let schedule = config.schedule.clone();

    let job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
        let pool = pool.clone();
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!("scheduler: starting hot-deals run");
            run_scheduled_scrape(pool, config).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(%schedule, "scheduler: hot-deals job registered");
    Ok(())
}
