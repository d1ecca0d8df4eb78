//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.
//!
//! Error bodies are JSON: `{ "message": "..." }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::StoreError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::InvalidArgument(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Storage(_) | StoreError::PaymentGateway(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message returned to the client.
    ///
    /// Storage and internal details stay in the logs; processor messages are
    /// passed through so the checkout form can show them.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Store(StoreError::InvalidArgument(_)) => "Invalid parcel id".to_string(),
            Self::Store(StoreError::NotFound(_)) => "Parcel not found".to_string(),
            Self::Store(StoreError::Storage(_)) => "Database operation failed".to_string(),
            Self::Store(StoreError::PaymentGateway(err)) => err.client_message(),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Client error");
        }

        (status, Json(json!({ "message": self.client_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RepositoryError;
    use crate::services::GatewayError;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(StoreError::InvalidArgument("x".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(StoreError::NotFound("x".to_string()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(StoreError::Storage(RepositoryError::InvalidKey("x".to_string())).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(
                StoreError::PaymentGateway(GatewayError::Parse("x".to_string())).into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::BadRequest("x".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_processor_message_passes_through() {
        let err = AppError::from(StoreError::PaymentGateway(GatewayError::Api {
            status: 400,
            message: "Amount must be at least $0.50 usd".to_string(),
        }));
        assert_eq!(err.client_message(), "Amount must be at least $0.50 usd");
    }

    #[test]
    fn test_storage_details_are_hidden() {
        let err = AppError::from(StoreError::Storage(RepositoryError::InvalidKey(
            "invalid identifier: \"row 7\"".to_string(),
        )));
        assert!(!err.client_message().contains("row 7"));
    }
}
