use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use hotdeals_core::DealsEnvelope;
use hotdeals_scraper::export::read_json_or_empty;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_page_size, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct DealItem {
    id: i64,
    title: String,
    price: String,
    original_price: String,
    discount: Option<String>,
    image_url: Option<String>,
    product_url: Option<String>,
    merchant: Option<String>,
    merchant_image: Option<String>,
    rating: Option<String>,
    reviews_count: Option<String>,
    scraped_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    duplicate_count: i32,
}

#[derive(Debug, Serialize)]
pub(super) struct DealsPageData {
    total_products: i64,
    page: i64,
    page_size: i64,
    products: Vec<DealItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DealsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub merchant: Option<String>,
    pub title: Option<String>,
}

pub(super) async fn list_deals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<DealsQuery>,
) -> Result<Json<ApiResponse<DealsPageData>>, ApiError> {
    let page = hotdeals_db::get_deals(
        &state.pool,
        &hotdeals_db::DealFilters {
            page: query.page.unwrap_or(1).max(1),
            page_size: normalize_page_size(query.page_size),
            merchant: query.merchant.as_deref(),
            title: query.title.as_deref(),
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let products = page
        .products
        .into_iter()
        .map(|row| DealItem {
            id: row.id,
            title: row.title,
            price: row.price,
            original_price: row.original_price,
            discount: row.discount,
            image_url: row.image_url,
            product_url: row.product_url,
            merchant: row.merchant,
            merchant_image: row.merchant_image,
            rating: row.rating,
            reviews_count: row.reviews_count,
            scraped_at: row.scraped_at,
            updated_at: row.updated_at,
            duplicate_count: row.duplicate_count,
        })
        .collect();

    Ok(Json(ApiResponse {
        data: DealsPageData {
            total_products: page.total_products,
            page: page.page,
            page_size: page.page_size,
            products,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_merchants(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let data = hotdeals_db::list_merchant_names(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// The document written by the most recent non-empty run, or an empty
/// envelope before the first one.
pub(super) async fn latest_deals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<DealsEnvelope>> {
    let data = read_json_or_empty(&state.config.data_paths().latest_deals);
    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}
