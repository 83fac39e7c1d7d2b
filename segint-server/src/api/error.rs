//! API Error Handling
//!
//! Unified error types and conversion for API responses.
//!
//! Error bodies are `BadRequestResponse` messages in the caller's negotiated
//! format, with fixed, non-specific detail strings; underlying causes are
//! logged, never echoed. Status codes follow the legacy convention: unknown
//! jobs and models answer 400 (not 404), wrong verbs 403, wrong content
//! types 415, catalog enumeration failures 406.

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use segint_core::storage::StorageError;
use segint_core::wire::BadRequestResponse;

use crate::api::negotiate::{self, WireFormat};

/// API error type
#[derive(Debug)]
pub enum ApiErrorKind {
    /// Request body does not parse as the expected message type.
    MalformedInput,
    /// Unknown segmentation job (legacy 400, not 404).
    JobNotFound,
    /// Result requested before the job reached 100% progress.
    JobStillProcessing,
    /// The job finished but its result payload cannot be read back.
    JobReadFailed,
    /// Unknown model version (legacy 400, not 404).
    ModelNotFound,
    /// Wrong content type on a write endpoint.
    UnsupportedMediaType,
    /// Wrong HTTP verb (legacy 403, not 405).
    MethodNotAllowed,
    /// Failure while enumerating the model catalog.
    CatalogUnavailable,
    DatabaseError(sqlx::Error),
    StorageError(StorageError),
}

/// An API error paired with the response format the caller negotiated.
#[derive(Debug)]
pub struct ApiError {
    kind: ApiErrorKind,
    format: WireFormat,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind) -> ApiError {
        ApiError {
            kind,
            format: WireFormat::Json,
        }
    }

    pub fn with_format(mut self, format: WireFormat) -> ApiError {
        self.format = format;
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, details) = match &self.kind {
            ApiErrorKind::MalformedInput => (
                StatusCode::BAD_REQUEST,
                "The posted message is not valid. It might have empty fields that are required.",
            ),
            ApiErrorKind::JobNotFound => {
                (StatusCode::BAD_REQUEST, "The segmentation job does not exist.")
            }
            ApiErrorKind::JobStillProcessing => (
                StatusCode::BAD_REQUEST,
                "The segmentation job is still processing.",
            ),
            ApiErrorKind::JobReadFailed => (
                StatusCode::BAD_REQUEST,
                "The segmentation job has encountered an error.",
            ),
            ApiErrorKind::ModelNotFound => {
                (StatusCode::BAD_REQUEST, "The requested model does not exist.")
            }
            ApiErrorKind::UnsupportedMediaType => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Content type invalid. This endpoint currently only accepts protobuf messages.",
            ),
            ApiErrorKind::MethodNotAllowed => (
                StatusCode::FORBIDDEN,
                "This endpoint does not allow the request method.",
            ),
            ApiErrorKind::CatalogUnavailable => {
                (StatusCode::NOT_ACCEPTABLE, "The request is not acceptable.")
            }
            ApiErrorKind::DatabaseError(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The server encountered an internal error.",
                )
            }
            ApiErrorKind::StorageError(err) => {
                tracing::error!("Blob store error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The server encountered an internal error.",
                )
            }
        };

        let body = BadRequestResponse {
            error_message: "Invalid request.".to_string(),
            exception_details: details.to_string(),
        };

        negotiate::respond(self.format, status, &body)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::new(ApiErrorKind::DatabaseError(err))
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::new(ApiErrorKind::StorageError(err))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Method-router fallback: wrong HTTP verb on a known path.
pub async fn method_not_allowed(headers: HeaderMap) -> ApiError {
    ApiError::new(ApiErrorKind::MethodNotAllowed).with_format(WireFormat::from_headers(&headers))
}
