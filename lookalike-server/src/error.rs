//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lookalike_core::{LookalikeError, StoreError};
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable - the record store cannot be reached
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Detection error from the core library
    #[error("Detection error: {0}")]
    Detection(#[from] LookalikeError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a service unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Detection(ref e) => match e {
                // Client-provided invalid input → 400
                LookalikeError::MalformedKey(_)
                | LookalikeError::IncompatibleSignature { .. }
                | LookalikeError::InvalidSignature(_)
                | LookalikeError::Validation(_) => StatusCode::BAD_REQUEST,

                // Store outage → 503, the client may retry
                LookalikeError::Store(StoreError::Unavailable(_)) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }

                // Internal processing failures → 500
                LookalikeError::Store(_) | LookalikeError::InvalidParameter(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Get the error code for programmatic error handling
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Detection(ref e) => match e {
                LookalikeError::MalformedKey(_) => "MALFORMED_KEY",
                LookalikeError::IncompatibleSignature { .. } => "INCOMPATIBLE_SIGNATURE",
                LookalikeError::InvalidSignature(_) => "INVALID_SIGNATURE",
                LookalikeError::Validation(_) => "INVALID_INPUT",
                LookalikeError::InvalidParameter(_) => "INVALID_PARAMETER",
                LookalikeError::Store(StoreError::Unavailable(_)) => "STORE_UNAVAILABLE",
                LookalikeError::Store(_) => "STORE_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            // Store failures may carry connection details; keep them in the logs
            Self::Detection(LookalikeError::Store(StoreError::Unavailable(_))) => {
                "Record store unavailable".to_string()
            }
            Self::Detection(LookalikeError::Store(_)) => "Record store error".to_string(),
            Self::Detection(ref e) => e.to_string(),
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Detection(LookalikeError::Store(_)) => "store",
            Self::Detection(_) => "detection",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_client_error() {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        } else if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Service unavailable"
            );
        } else {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                client_message = %client_message,
                "Server error"
            );
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_bad_requests() {
        let err = ApiError::from(LookalikeError::Validation("group_id is empty".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let err = ApiError::from(LookalikeError::IncompatibleSignature {
            expected: 128,
            got: 64,
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INCOMPATIBLE_SIGNATURE");
    }

    #[test]
    fn test_store_outage_is_unavailable() {
        let err = ApiError::from(LookalikeError::Store(StoreError::Unavailable(
            "connection refused to db.internal:5432".into(),
        )));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), "STORE_UNAVAILABLE");
        assert!(!err.client_message().contains("db.internal"));
    }

    #[test]
    fn test_store_query_failure_is_internal() {
        let err = ApiError::from(LookalikeError::Store(StoreError::Query("syntax".into())));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
