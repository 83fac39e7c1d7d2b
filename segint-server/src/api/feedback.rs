//! Segmentation feedback endpoint

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use segint_core::wire::{self, SegmentationFeedback};

use crate::api::error::{ApiError, ApiErrorKind, ApiResult};
use crate::api::negotiate::{self, WireFormat};
use crate::repository::feedback_repository;
use crate::state::AppState;

/// POST /api/v2/Feedback/segmentation
/// Store client feedback, including per-structure comments.
pub async fn post_feedback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let format = WireFormat::from_headers(&headers);

    if !negotiate::is_binary_body(&headers) {
        return Err(ApiError::new(ApiErrorKind::UnsupportedMediaType).with_format(format));
    }

    let feedback: SegmentationFeedback = wire::from_bytes(&body)
        .map_err(|_| ApiError::new(ApiErrorKind::MalformedInput).with_format(format))?;

    tracing::info!(
        "Feedback received for segmentation: {}",
        feedback.segmentation_id
    );

    feedback_repository::insert(&state.pool, &feedback).await?;

    Ok((StatusCode::OK, "POST successful.").into_response())
}
