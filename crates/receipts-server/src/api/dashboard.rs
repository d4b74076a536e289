use axum::{
    extract::{Query, State},
    Extension, Json,
};
use receipts_core::{analytics, BrandPerformance, DatasetSummary, PricingDiscounts, ShoppingHabits};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{current_dataset, normalize_top, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct TabQuery {
    pub top: Option<usize>,
}

pub(super) async fn summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<DatasetSummary>>, ApiError> {
    let dataset = current_dataset(&state, &req_id.0).await?;
    Ok(Json(ApiResponse {
        data: analytics::summarize(&dataset),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn brands(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<TabQuery>,
) -> Result<Json<ApiResponse<BrandPerformance>>, ApiError> {
    let dataset = current_dataset(&state, &req_id.0).await?;
    let top = normalize_top(query.top, state.top_n);
    Ok(Json(ApiResponse {
        data: analytics::brand_performance(&dataset, top),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn habits(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<TabQuery>,
) -> Result<Json<ApiResponse<ShoppingHabits>>, ApiError> {
    let dataset = current_dataset(&state, &req_id.0).await?;
    let top = normalize_top(query.top, state.top_n);
    Ok(Json(ApiResponse {
        data: analytics::shopping_habits(&dataset, top),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn pricing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<TabQuery>,
) -> Result<Json<ApiResponse<PricingDiscounts>>, ApiError> {
    let dataset = current_dataset(&state, &req_id.0).await?;
    let top = normalize_top(query.top, state.top_n);
    Ok(Json(ApiResponse {
        data: analytics::pricing_discounts(&dataset, top),
        meta: ResponseMeta::new(req_id.0),
    }))
}
