use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use hotdeals_core::{parse_merchant_list, write_scraper_config, ScraperConfig, ScraperStatus};
use hotdeals_scraper::{active_scraper_config, read_status, AllowList, ScrapeRun, ScraperError};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;
use crate::scheduler::execute_run;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeQuery {
    /// Comma-separated merchant names; the configured allow-list when absent.
    pub merchants: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ScrapeAccepted {
    started: bool,
    merchants: Vec<String>,
}

pub(super) async fn scraper_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ScraperStatus>> {
    Json(ApiResponse {
        data: read_status(&state.config.data_paths().status),
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn get_scraper_config(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ScraperConfig>> {
    Json(ApiResponse {
        data: active_scraper_config(&state.config.data_paths().scraper_config),
        meta: ResponseMeta::new(req_id.0),
    })
}

/// Replace the scraper config. Takes effect on the next run.
pub(super) async fn put_scraper_config(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(config): Json<ScraperConfig>,
) -> Result<Json<ApiResponse<ScraperConfig>>, ApiError> {
    if let Err(e) = config.validate() {
        return Err(ApiError::new(req_id.0, "validation_error", e.to_string()));
    }

    let path = state.config.data_paths().scraper_config;
    if let Err(e) = write_scraper_config(&path, &config) {
        tracing::error!(path = %path.display(), error = %e, "failed to write scraper config");
        return Err(ApiError::new(
            req_id.0,
            "internal_error",
            "failed to write scraper config",
        ));
    }

    for name in config.empty_selectors() {
        tracing::warn!(selector = name, "selector is empty and will match nothing");
    }
    tracing::info!(base_url = %config.base_url, "scraper config replaced");

    Ok(Json(ApiResponse {
        data: config,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Start a run in the background. The status reads running before this
/// returns, so a second trigger gets `409` until the run finishes.
pub(super) async fn trigger_scrape(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ScrapeQuery>,
) -> Result<(StatusCode, Json<ApiResponse<ScrapeAccepted>>), ApiError> {
    let run = match ScrapeRun::begin(&state.config.data_paths()) {
        Ok(run) => run,
        Err(ScraperError::AlreadyRunning { .. }) => {
            return Err(ApiError::new(req_id.0, "conflict", "a scrape is already running"));
        }
        Err(e) => {
            tracing::error!(error = %e, "could not start scrape run");
            return Err(ApiError::new(
                req_id.0,
                "internal_error",
                "could not start scrape run",
            ));
        }
    };

    let allow = match query.merchants.as_deref() {
        Some(raw) => AllowList::new(parse_merchant_list(raw)),
        None => AllowList::new(&state.config.allowed_merchants),
    };
    let merchants = allow.merchants().to_vec();

    let AppState { pool, config } = state;
    tokio::spawn(async move {
        execute_run(run, &pool, &config, &allow).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: ScrapeAccepted {
                started: true,
                merchants,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
