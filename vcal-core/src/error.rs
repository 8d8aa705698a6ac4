//! Error types for vcal.

use thiserror::Error;

/// Errors that can occur in vcal operations.
#[derive(Error, Debug)]
pub enum VcalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Sync request timed out after {0}s")]
    Timeout(u64),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server error: {0}")]
    Remote(String),
}

impl From<serde_json::Error> for VcalError {
    fn from(err: serde_json::Error) -> Self {
        VcalError::Serialization(err.to_string())
    }
}

/// Result type alias for vcal operations.
pub type VcalResult<T> = Result<T, VcalError>;
