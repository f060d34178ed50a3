//! Error types for the smash cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Smash Error Enum ==
/// Unified error type for backends and the HTTP surface.
///
/// The facade never returns these to callers; it logs them and falls back
/// to the operation's empty result.
#[derive(Error, Debug)]
pub enum SmashError {
    /// Transient I/O or network failure talking to the store
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// File store object ceiling reached
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Prefix or tag delete requested on a backend that lacks it
    #[error("Unsupported capability: {0}")]
    UnsupportedCapability(String),

    /// Persisted counter state could not be parsed
    #[error("Malformed persisted state: {0}")]
    MalformedPersistedState(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key not present in the cache (HTTP surface only)
    #[error("Key not found: {0}")]
    NotFound(String),
}

impl From<std::io::Error> for SmashError {
    fn from(err: std::io::Error) -> Self {
        SmashError::BackendUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for SmashError {
    fn from(err: serde_json::Error) -> Self {
        SmashError::MalformedPersistedState(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for SmashError {
    fn into_response(self) -> Response {
        let status = match &self {
            SmashError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SmashError::CapacityExceeded(_) => StatusCode::INSUFFICIENT_STORAGE,
            SmashError::UnsupportedCapability(_) => StatusCode::NOT_IMPLEMENTED,
            SmashError::MalformedPersistedState(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SmashError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            SmashError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the smash cache.
pub type Result<T> = std::result::Result<T, SmashError>;
