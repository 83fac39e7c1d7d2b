//! Wire format negotiation
//!
//! Every endpoint speaks either the binary wire encoding or its JSON
//! projection. Responses follow the `accept` header; write endpoints require
//! the binary content type on the request body.

use axum::{
    Json,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use segint_core::wire;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Binary,
    Json,
}

impl WireFormat {
    /// Negotiates the response format from the `accept` header. Anything
    /// other than the binary content type gets the JSON projection.
    pub fn from_headers(headers: &HeaderMap) -> WireFormat {
        match headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) {
            Some(accept) if media_type(accept) == wire::CONTENT_TYPE_BINARY => WireFormat::Binary,
            _ => WireFormat::Json,
        }
    }
}

/// Checks that a write request carries the binary content type.
pub fn is_binary_body(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| media_type(ct) == wire::CONTENT_TYPE_BINARY)
        .unwrap_or(false)
}

/// Serializes a wire message in the negotiated format.
pub fn respond<T: Serialize>(format: WireFormat, status: StatusCode, msg: &T) -> Response {
    match format {
        WireFormat::Binary => match wire::to_bytes(msg) {
            Ok(bytes) => (
                status,
                [(header::CONTENT_TYPE, wire::CONTENT_TYPE_BINARY)],
                bytes,
            )
                .into_response(),
            Err(err) => {
                tracing::error!("Failed to encode response: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        },
        WireFormat::Json => (status, Json(msg)).into_response(),
    }
}

/// Raw result bytes, already serialized by the worker.
pub fn respond_raw(status: StatusCode, bytes: Vec<u8>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, wire::CONTENT_TYPE_BINARY)],
        bytes,
    )
        .into_response()
}

fn media_type(value: &str) -> &str {
    value.split(';').next().unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_accept_negotiation() {
        let mut headers = HeaderMap::new();
        assert_eq!(WireFormat::from_headers(&headers), WireFormat::Json);

        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        assert_eq!(WireFormat::from_headers(&headers), WireFormat::Json);

        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/x-protobuf"),
        );
        assert_eq!(WireFormat::from_headers(&headers), WireFormat::Binary);
    }

    #[test]
    fn test_binary_body_check() {
        let mut headers = HeaderMap::new();
        assert!(!is_binary_body(&headers));

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        assert!(!is_binary_body(&headers));

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-protobuf"),
        );
        assert!(is_binary_body(&headers));

        // Parameters after the media type are ignored.
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-protobuf; charset=binary"),
        );
        assert!(is_binary_body(&headers));
    }
}
