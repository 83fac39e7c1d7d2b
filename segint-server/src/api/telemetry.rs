//! Segmentation telemetry endpoint

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use segint_core::wire::{self, SegmentationTelemetry};

use crate::api::error::{ApiError, ApiErrorKind, ApiResult};
use crate::api::negotiate::{self, WireFormat};
use crate::repository::telemetry_repository;
use crate::state::AppState;

/// POST /api/v2/Telemetry/segmentation
/// Store client-side timing and error telemetry.
pub async fn post_telemetry(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let format = WireFormat::from_headers(&headers);

    if !negotiate::is_binary_body(&headers) {
        return Err(ApiError::new(ApiErrorKind::UnsupportedMediaType).with_format(format));
    }

    let telemetry: SegmentationTelemetry = wire::from_bytes(&body)
        .map_err(|_| ApiError::new(ApiErrorKind::MalformedInput).with_format(format))?;

    tracing::info!(
        "Telemetry received for segmentation: {}",
        telemetry.segmentation_id
    );

    telemetry_repository::insert(&state.pool, &telemetry).await?;

    Ok((StatusCode::OK, "POST successful.").into_response())
}
