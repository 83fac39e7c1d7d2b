//! Model catalog endpoints

use axum::{extract::State, http::HeaderMap, http::StatusCode, response::Response};

use crate::api::error::{ApiError, ApiErrorKind, ApiResult};
use crate::api::negotiate::{self, WireFormat};
use crate::service::catalog_service;
use crate::state::AppState;

/// GET /api/v2/Model/
/// Enumerate all deployable model versions with their structures.
pub async fn get_models(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let format = WireFormat::from_headers(&headers);

    tracing::debug!("Listing model catalog");

    // Any failure while building the collection answers 406 (legacy).
    let collection = catalog_service::list_models(&state.pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to enumerate model catalog: {:?}", err);
            ApiError::new(ApiErrorKind::CatalogUnavailable).with_format(format)
        })?;

    Ok(negotiate::respond(format, StatusCode::OK, &collection))
}
