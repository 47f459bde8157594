//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use applymate_infra::transport::TransportError;
use applymate_types::error::TurnError;

use crate::media::MediaError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Bad or missing request fields.
    Validation(String),
    /// Outbound transport is not configured or not ready.
    Unavailable(String),
    /// Media file handling failed.
    Media(MediaError),
    /// Outbound transport failed.
    Transport(TransportError),
    /// Generic internal error.
    Internal(String),
}

impl From<MediaError> for AppError {
    fn from(e: MediaError) -> Self {
        AppError::Media(e)
    }
}

impl From<TransportError> for AppError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::NotConfigured => {
                AppError::Unavailable("Chat transport is not ready yet".to_string())
            }
            TransportError::InvalidRecipient => {
                AppError::Validation(TransportError::InvalidRecipient.to_string())
            }
            other => AppError::Transport(other),
        }
    }
}

impl From<TurnError> for AppError {
    fn from(e: TurnError) -> Self {
        match e {
            TurnError::InvalidInput(msg) => AppError::Validation(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "TRANSPORT_UNAVAILABLE", msg.clone())
            }
            AppError::Media(MediaError::Io(e)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "MEDIA_ERROR", e.to_string())
            }
            AppError::Media(MediaError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "MEDIA_NOT_FOUND", self.message())
            }
            AppError::Media(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", self.message()),
            AppError::Transport(e) => (StatusCode::BAD_GATEWAY, "TRANSPORT_ERROR", e.to_string()),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Media(e) => e.to_string(),
            AppError::Transport(e) => e.to_string(),
            AppError::Validation(msg) | AppError::Unavailable(msg) | AppError::Internal(msg) => {
                msg.clone()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(%status, code, error = %message, "Request failed");
        }

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
