// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
// endregion: --- Imports

// region:    --- Error Taxonomy

/// Central error type for the trade subsystem. Every failure is a value
/// returned to the caller; nothing in here crashes the process.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or out-of-range input, rejected before any state change.
    #[error("{0}")]
    Validation(String),

    /// A proposed reference price that is not a finite positive number.
    /// Carries the offending commodity name so the admin can fix the batch.
    #[error("invalid price {value} for '{name}'")]
    InvalidPrice { name: String, value: f64 },

    /// Referenced listing, bid or price entry is absent.
    #[error("{0} not found")]
    NotFound(String),

    /// The acting user does not own the resource.
    #[error("{0}")]
    NotOwner(String),

    /// Concurrent reconciliation collision.
    #[error("{0}")]
    Conflict(String),

    /// Persistence or network failure, retryable.
    #[error("transient I/O failure: {0}")]
    TransientIo(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("record".to_string()),
            other => AppError::TransientIo(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
            AppError::InvalidPrice { .. } => (StatusCode::BAD_REQUEST, "INVALID_PRICE"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::NotOwner(_) => (StatusCode::FORBIDDEN, "NOT_OWNER"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::TransientIo(_) => (StatusCode::SERVICE_UNAVAILABLE, "TRANSIENT_IO"),
        };

        let body = Json(json!({
            "error": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

// endregion: --- Error Taxonomy
