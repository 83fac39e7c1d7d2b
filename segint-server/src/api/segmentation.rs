//! Segmentation job endpoints
//!
//! Submission, progress polling and single-consumption result retrieval.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use segint_core::wire;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiErrorKind, ApiResult};
use crate::api::negotiate::{self, WireFormat};
use crate::service::segmentation_service::{self, SegmentationError};
use crate::state::AppState;

/// POST /api/v2/Model/{model_id}/segmentation
/// Validate the input payload, persist it, and enqueue the job.
pub async fn post_segmentation(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let format = WireFormat::from_headers(&headers);

    if !negotiate::is_binary_body(&headers) {
        return Err(ApiError::new(ApiErrorKind::UnsupportedMediaType).with_format(format));
    }

    tracing::info!("Segmentation submission for model: {}", model_id);

    let task = segmentation_service::submit(&state, &model_id, &body)
        .await
        .map_err(|e| map_error(e, format))?;

    Ok(negotiate::respond(format, StatusCode::OK, &task))
}

/// GET /api/v2/Model/{model_id}/segmentation/{segmentation_id}
/// Derived progress: 100 when the output exists, 0 otherwise.
pub async fn get_segmentation_progress(
    State(state): State<AppState>,
    Path((model_id, segmentation_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let format = WireFormat::from_headers(&headers);
    let job_id = parse_job_id(&segmentation_id, format)?;

    tracing::debug!("Progress query for job: {}", job_id);

    let progress = segmentation_service::progress(&state, &model_id, job_id)
        .await
        .map_err(|e| map_error(e, format))?;

    Ok(negotiate::respond(format, StatusCode::OK, &progress))
}

/// GET /api/v2/Model/{model_id}/segmentation/{segmentation_id}/result
/// Return the serialized result and delete the job record: a second read of
/// the same job answers "does not exist".
pub async fn get_segmentation_result(
    State(state): State<AppState>,
    Path((model_id, segmentation_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let format = WireFormat::from_headers(&headers);
    let job_id = parse_job_id(&segmentation_id, format)?;

    tracing::info!("Result retrieval for job: {}", job_id);

    let bytes = segmentation_service::retrieve_result(&state, &model_id, job_id)
        .await
        .map_err(|e| map_error(e, format))?;

    match format {
        WireFormat::Binary => Ok(negotiate::respond_raw(StatusCode::OK, bytes)),
        WireFormat::Json => {
            let output: wire::ModelOutput = wire::from_bytes(&bytes).map_err(|err| {
                tracing::error!("Stored result payload failed to decode: {}", err);
                ApiError::new(ApiErrorKind::JobReadFailed).with_format(format)
            })?;
            Ok(negotiate::respond(format, StatusCode::OK, &output))
        }
    }
}

fn parse_job_id(segmentation_id: &str, format: WireFormat) -> ApiResult<Uuid> {
    Uuid::parse_str(segmentation_id)
        .map_err(|_| ApiError::new(ApiErrorKind::JobNotFound).with_format(format))
}

fn map_error(err: SegmentationError, format: WireFormat) -> ApiError {
    let kind = match err {
        SegmentationError::MalformedInput => ApiErrorKind::MalformedInput,
        SegmentationError::ModelNotFound => ApiErrorKind::ModelNotFound,
        SegmentationError::JobNotFound => ApiErrorKind::JobNotFound,
        SegmentationError::StillProcessing => ApiErrorKind::JobStillProcessing,
        SegmentationError::ResultUnreadable => ApiErrorKind::JobReadFailed,
        SegmentationError::DatabaseError(e) => ApiErrorKind::DatabaseError(e),
        SegmentationError::StorageError(e) => ApiErrorKind::StorageError(e),
    };
    ApiError::new(kind).with_format(format)
}
