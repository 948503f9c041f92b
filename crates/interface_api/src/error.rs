//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain_ledger::LedgerError;
use domain_occupancy::OccupancyError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(msg) => ApiError::NotFound(msg),
            LedgerError::Validation(msg) => ApiError::BadRequest(msg),
            LedgerError::Conflict(msg) => ApiError::Conflict(msg),
            LedgerError::Store(store) => {
                tracing::error!(error = %store, "store failure");
                ApiError::Internal("store failure".to_string())
            }
        }
    }
}

impl From<OccupancyError> for ApiError {
    fn from(err: OccupancyError) -> Self {
        match err {
            OccupancyError::NotFound(msg) => ApiError::NotFound(msg),
            OccupancyError::Validation(msg) => ApiError::BadRequest(msg),
            OccupancyError::Conflict(msg) => ApiError::Conflict(msg),
            OccupancyError::Store(store) => {
                tracing::error!(error = %store, "store failure");
                ApiError::Internal("store failure".to_string())
            }
        }
    }
}

impl From<core_kernel::StoreError> for ApiError {
    fn from(err: core_kernel::StoreError) -> Self {
        use core_kernel::StoreError;
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            StoreError::Validation { message } => ApiError::BadRequest(message),
            StoreError::Conflict { .. } | StoreError::VersionConflict { .. } => {
                ApiError::Conflict(err.to_string())
            }
            other => {
                tracing::error!(error = %other, "store failure");
                ApiError::Internal("store failure".to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
