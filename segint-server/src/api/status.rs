//! Service information endpoints
//!
//! Ping, credits and vendor status. This is a research deployment, so credits
//! and vendor status are mocked; the wire shapes match the production API.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use segint_core::wire;

use crate::api::negotiate::{self, WireFormat};
use crate::state::AppState;

const API_VERSION: &str = "0.0.1 Research Server Development Test";

const MOCK_TOTAL_CREDITS: i64 = 100_000;
const MOCK_CREDITS_MESSAGE: &str = "Local Research Server - Credits will not apply.";

/// GET /ping
pub async fn ping(headers: HeaderMap) -> Response {
    let format = WireFormat::from_headers(&headers);
    let info = wire::ApiInformation {
        version: API_VERSION.to_string(),
    };
    negotiate::respond(format, StatusCode::OK, &info)
}

/// GET /api/v2/Credits
pub async fn get_credits(headers: HeaderMap) -> Response {
    let format = WireFormat::from_headers(&headers);
    let credits = wire::Credits {
        total_credits: MOCK_TOTAL_CREDITS,
        display_credits_warning: true,
        credits_warning_message: MOCK_CREDITS_MESSAGE.to_string(),
        language_code: "English".to_string(),
    };
    negotiate::respond(format, StatusCode::OK, &credits)
}

/// GET /api/v2/VendorStatus
pub async fn get_vendor_status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let format = WireFormat::from_headers(&headers);
    let status = wire::VendorStatus {
        total_credits: MOCK_TOTAL_CREDITS,
        low_credits_warning_message: MOCK_CREDITS_MESSAGE.to_string(),
        client_country_code: "US".to_string(),
        segmentation_service_status: wire::VENDOR_SERVICE_AVAILABLE,
        segmentation_service_url: state.service_url.clone(),
        available_segmentation_service_locations: vec!["US".to_string()],
        vendor_name: "Research Server".to_string(),
        vendor_description_html: String::new(),
        language_code: "en-US".to_string(),
    };
    negotiate::respond(format, StatusCode::OK, &status)
}
