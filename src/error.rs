//! Error types for the sync tool.

use thiserror::Error;

/// Errors raised by the remote clients, the mirroring core and the reconciler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Remote returned {status} for {context}")]
    RemoteStatus { status: u16, context: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Missing field `{field}` in {record} record")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    #[error("Unknown module item type: {0}")]
    UnknownItemType(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Batch commit failed: {0}")]
    BatchCommit(String),
}

impl ApiError {
    /// True for failures that end the traversal of a whole container.
    pub fn is_container_fatal(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized(_) | ApiError::RemoteStatus { .. }
        )
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err.to_string())
    }
}
