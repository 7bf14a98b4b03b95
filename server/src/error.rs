//! Unified error handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::remote::StoreError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Engine(#[from] banner_engine::Error),

    #[error("Remote store error: {0}")]
    Store(#[from] StoreError),
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        use banner_engine::Error;

        match self {
            AppError::Engine(e) => match e {
                Error::OperationConflict { .. } | Error::AlreadyActive(_) | Error::NotActive(_) => {
                    StatusCode::CONFLICT
                }
                Error::CapacityExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                Error::InvalidOrder(_) => StatusCode::BAD_REQUEST,
                Error::ItemNotFound(_) => StatusCode::NOT_FOUND,
                Error::RemoteWriteFailure { .. } => StatusCode::BAD_GATEWAY,
                Error::Disposed => StatusCode::SERVICE_UNAVAILABLE,
            },
            AppError::Store(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_message, details) = match &self {
            AppError::Engine(e) if e.is_rejection() => {
                tracing::debug!("Request rejected: {}", e);
                (e.to_string(), None)
            }
            AppError::Engine(e) => {
                tracing::warn!("Engine error: {:?}", e);
                (e.to_string(), None)
            }
            AppError::Store(e) => {
                tracing::error!("Remote store error: {:?}", e);
                ("Remote store error".to_string(), Some(e.to_string()))
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;
