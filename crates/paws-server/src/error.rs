//! Server error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use paws_core::ErrorKind;
use serde::Serialize;
use thiserror::Error;

/// Structured error response for API clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    /// PAWS status code of the underlying failure
    pub status: i32,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Engine(#[from] paws_core::Error),

    #[error("Metrics recorder not installed")]
    MetricsDisabled,
}

impl ServerError {
    /// Get the error code for structured responses
    fn code(&self) -> &'static str {
        match self {
            ServerError::Engine(e) => match e.kind() {
                ErrorKind::Validation => "INVALID_VALUE",
                ErrorKind::Rejection => "REJECTED",
                ErrorKind::NotFound => "NOT_FOUND",
                ErrorKind::Infrastructure => "INTERNAL_ERROR",
            },
            ServerError::MetricsDisabled => "METRICS_DISABLED",
        }
    }

    /// Get the HTTP status code for this error
    fn status(&self) -> StatusCode {
        match self {
            ServerError::Engine(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Rejection => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::MetricsDisabled => StatusCode::NOT_FOUND,
        }
    }

    fn paws_status(&self) -> i32 {
        match self {
            ServerError::Engine(e) => e.status_code(),
            ServerError::MetricsDisabled => paws_core::codes::GENERIC_FAILURE,
        }
    }

    /// Message safe to show the caller; infrastructure detail stays in the log
    fn public_message(&self) -> String {
        match self {
            ServerError::Engine(e) => e.public_message(),
            ServerError::MetricsDisabled => self.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = ErrorResponse {
            error: self.public_message(),
            code: self.code(),
            status: self.paws_status(),
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_map_to_http() {
        let invalid = ServerError::from(paws_core::Error::invalid("regId", "is required"));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.paws_status(), -203);

        let store = ServerError::from(paws_core::Error::Store("disk full".into()));
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.public_message(), "Internal error");

        let missing = ServerError::from(paws_core::Error::NotFound("device acme:SN-9".into()));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.code(), "NOT_FOUND");
    }

    #[test]
    fn test_metrics_disabled_is_not_found() {
        let err = ServerError::MetricsDisabled;
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.paws_status(), paws_core::codes::GENERIC_FAILURE);
    }
}
