//! Error types for vault-api
//!
//! Every handler returns [`ApiResult`]; store errors map onto HTTP status
//! codes through `From<vault_common::Error>`.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request, path, extension or stored format (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Upload exceeds the configured body limit (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Replace a store-level not-found message with an endpoint-specific one
    pub fn not_found_as(self, message: impl Into<String>) -> Self {
        match self {
            ApiError::NotFound(_) => ApiError::NotFound(message.into()),
            other => other,
        }
    }
}

impl From<vault_common::Error> for ApiError {
    fn from(err: vault_common::Error) -> Self {
        use vault_common::Error;

        match err {
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::Format(msg) => ApiError::BadRequest(format!("Invalid JSON format in {}", msg)),
            Error::NotFound(msg) => ApiError::NotFound(format!("File not found: {}", msg)),
            Error::Io(e) => {
                error!("Unexpected I/O error: {}", e);
                ApiError::Internal(format!("Unexpected error: {}", e))
            }
            Error::Config(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        match err.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(err.body_text()),
            _ => ApiError::BadRequest(format!("Malformed multipart body: {}", err.body_text())),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_code, message) = match self {
            ApiError::NotFound(msg) => ("NOT_FOUND", msg),
            ApiError::BadRequest(msg) => ("BAD_REQUEST", msg),
            ApiError::PayloadTooLarge(msg) => ("PAYLOAD_TOO_LARGE", msg),
            ApiError::Internal(msg) => ("INTERNAL_ERROR", msg),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
