use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Multipart, Query, State},
    http::StatusCode,
    Extension, Json,
};
use receipts_core::{analytics, DatasetSummary, LineItem};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{current_dataset, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

/// Multipart field the upload form puts the file in.
const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub(super) struct UploadData {
    message: String,
    columns: Vec<String>,
    summary: DatasetSummary,
}

#[derive(Debug, Deserialize)]
pub(super) struct ReceiptsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct ReceiptPage {
    total: usize,
    columns: Vec<String>,
    items: Vec<LineItem>,
}

/// Accepts the receipts file as the raw request body.
pub(super) async fn upload_receipts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ApiResponse<UploadData>>, ApiError> {
    let body = body.map_err(|e| {
        tracing::warn!(error = %e, "upload body could not be read");
        ApiError::new(req_id.0.clone(), rejection_code(e.status()), e.body_text())
    })?;
    ingest(&state, req_id.0, body).await
}

/// Accepts the receipts file from a `multipart/form-data` form, in the
/// `file` field.
pub(super) async fn upload_receipts_multipart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadData>>, ApiError> {
    let mut file_data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&req_id.0, &e))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| multipart_error(&req_id.0, &e))?;
            file_data = Some(bytes);
        }
    }

    let Some(file_data) = file_data else {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            format!("no \"{UPLOAD_FIELD}\" field in upload"),
        ));
    };

    ingest(&state, req_id.0, file_data).await
}

pub(super) async fn list_receipts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ReceiptsQuery>,
) -> Result<Json<ApiResponse<ReceiptPage>>, ApiError> {
    let dataset = current_dataset(&state, &req_id.0).await?;
    let limit = normalize_limit(query.limit);

    Ok(Json(ApiResponse {
        data: ReceiptPage {
            total: dataset.len(),
            columns: dataset.columns().to_vec(),
            items: dataset.iter().take(limit).cloned().collect(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

async fn ingest(
    state: &AppState,
    request_id: String,
    raw: Bytes,
) -> Result<Json<ApiResponse<UploadData>>, ApiError> {
    // Parse off the async workers and without the session; the lock is
    // taken only to swap the result in.
    let result = tokio::task::spawn_blocking(move || receipts_ingest::normalize(&raw))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "normalize task failed");
            ApiError::new(request_id.clone(), "internal_error", "upload could not be processed")
        })?;
    let normalized = result.map_err(|e| {
        tracing::warn!(error = %e, "receipts upload rejected");
        ApiError::new(
            request_id.clone(),
            "ingestion_error",
            format!("Error processing file: {e}"),
        )
    })?;
    let dataset = state.session.lock().await.replace(normalized);

    Ok(Json(ApiResponse {
        data: UploadData {
            message: format!("Loaded {} records", dataset.len()),
            columns: dataset.columns().to_vec(),
            summary: analytics::summarize(&dataset),
        },
        meta: ResponseMeta::new(request_id),
    }))
}

fn multipart_error(request_id: &str, error: &axum::extract::multipart::MultipartError) -> ApiError {
    tracing::warn!(error = %error, "multipart upload could not be read");
    ApiError::new(request_id, rejection_code(error.status()), error.body_text())
}

fn rejection_code(status: StatusCode) -> &'static str {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        "payload_too_large"
    } else {
        "bad_request"
    }
}
