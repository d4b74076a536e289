mod dashboard;
mod receipts;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use receipts_core::{Dataset, EXPECTED_FORMAT, REQUIRED_FIELDS};
use receipts_ingest::Session;
use serde::Serialize;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId};

const NO_DATASET_MESSAGE: &str = "Please upload a JSON file to get started";

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub top_n: usize,
}

impl AppState {
    #[must_use]
    pub fn new(top_n: usize) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new())),
            top_n,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    dataset: &'static str,
    records: Option<usize>,
}

#[derive(Debug, Serialize)]
struct FormatData {
    required_fields: [&'static str; 8],
    example: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "no_dataset" => StatusCode::NOT_FOUND,
            "bad_request" | "ingestion_error" => StatusCode::BAD_REQUEST,
            "payload_too_large" => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(50).clamp(1, 500)
}

pub(super) fn normalize_top(top: Option<usize>, default: usize) -> usize {
    top.unwrap_or(default).clamp(1, 100)
}

/// Clones the session's dataset out so the lock is held only briefly.
pub(super) async fn current_dataset(
    state: &AppState,
    request_id: &str,
) -> Result<Arc<Dataset>, ApiError> {
    state
        .session
        .lock()
        .await
        .dataset()
        .ok_or_else(|| ApiError::new(request_id, "no_dataset", NO_DATASET_MESSAGE))
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

fn receipts_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/receipts",
            get(receipts::list_receipts).post(receipts::upload_receipts),
        )
        .route(
            "/api/v1/receipts/upload",
            post(receipts::upload_receipts_multipart),
        )
        .route("/api/v1/dashboard/summary", get(dashboard::summary))
        .route("/api/v1/dashboard/brands", get(dashboard::brands))
        .route("/api/v1/dashboard/habits", get(dashboard::habits))
        .route("/api/v1/dashboard/pricing", get(dashboard::pricing))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

pub fn build_app(state: AppState, max_upload_bytes: usize) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/format", get(expected_format));

    Router::new()
        .merge(public_routes)
        .merge(receipts_router(max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let records = state.session.lock().await.dataset().map(|d| d.len());
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            dataset: if records.is_some() { "loaded" } else { "empty" },
            records,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

async fn expected_format(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse {
        data: FormatData {
            required_fields: REQUIRED_FIELDS,
            example: EXPECTED_FORMAT,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
