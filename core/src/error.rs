//! Error types for the rewriteflow client.
//!
//! # Design
//! `NoToken` is the only local precondition failure and is raised before any
//! request is built. Every non-2xx response lands in `Remote`, whose display
//! text is the message extracted by the fetch wrapper so callers can show it
//! to a user as-is.

use thiserror::Error;

/// Errors returned by `FlowApi` parse methods and `RewriteFlow` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An operation that needs a session token was called without one.
    #[error("No token set")]
    NoToken,

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// The request could not be completed (connection refused, DNS, ...).
    #[error("{0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// HTTP status for `Remote` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// Errors raised by `TokenStore` implementations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no storage location available")]
    NoLocation,
}
