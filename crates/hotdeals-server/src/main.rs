mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, default_rate_limit_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(hotdeals_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let paths = config.data_paths();
    std::fs::create_dir_all(&paths.dir)
        .with_context(|| format!("creating data directory {}", paths.dir.display()))?;
    hotdeals_scraper::reset_status(&paths.status)?;

    let pool = hotdeals_db::connect_from_app_config(&config).await?;
    hotdeals_db::run_migrations(&pool).await?;

    let _scheduler = scheduler::build_scheduler(pool.clone(), Arc::clone(&config)).await?;

    if config.run_on_startup {
        tracing::info!("starting initial hot-deals run");
        tokio::spawn(scheduler::run_scheduled_scrape(
            pool.clone(),
            Arc::clone(&config),
        ));
    }

    let app = build_app(
        AppState {
            pool,
            config: Arc::clone(&config),
        },
        default_rate_limit_state(),
    )
    .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "hotdeals-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
