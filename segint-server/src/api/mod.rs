//! API Module
//!
//! HTTP API layer for the segmentation service.
//! Each submodule handles endpoints for a specific domain.
//!
//! Every method router carries a fallback so a wrong HTTP verb answers 403
//! with the negotiated error body (legacy convention, not 405).

pub mod error;
pub mod feedback;
pub mod model;
pub mod negotiate;
pub mod segmentation;
pub mod status;
pub mod telemetry;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use error::method_not_allowed;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Service information
        .route("/ping", get(status::ping).fallback(method_not_allowed))
        .route("/api/ping", get(status::ping).fallback(method_not_allowed))
        .route(
            "/api/v2/Credits",
            get(status::get_credits).fallback(method_not_allowed),
        )
        .route(
            "/api/v2/VendorStatus",
            get(status::get_vendor_status).fallback(method_not_allowed),
        )
        // Model catalog
        .route(
            "/api/v2/Model/",
            get(model::get_models).fallback(method_not_allowed),
        )
        // Segmentation job lifecycle
        .route(
            "/api/v2/Model/{model_id}/segmentation",
            post(segmentation::post_segmentation).fallback(method_not_allowed),
        )
        .route(
            "/api/v2/Model/{model_id}/segmentation/{segmentation_id}",
            get(segmentation::get_segmentation_progress).fallback(method_not_allowed),
        )
        .route(
            "/api/v2/Model/{model_id}/segmentation/{segmentation_id}/result",
            get(segmentation::get_segmentation_result).fallback(method_not_allowed),
        )
        // Feedback & telemetry ingestion
        .route(
            "/api/v2/Feedback/segmentation",
            post(feedback::post_feedback).fallback(method_not_allowed),
        )
        .route(
            "/api/v2/Telemetry/segmentation",
            post(telemetry::post_telemetry).fallback(method_not_allowed),
        )
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
