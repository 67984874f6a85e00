//! Error types for the netlock daemon

use thiserror::Error;

/// Result type alias for daemon operations
pub type Result<T> = std::result::Result<T, DaemonError>;

/// Errors that can occur in the daemon
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Core rule violation (bad input, conflict, not found)
    #[error("{0}")]
    Core(#[from] netlock_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Settings store error
    #[error("Store error: {0}")]
    Store(String),

    /// Encryption at rest failed
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller lacks admin privilege
    #[error("{0}")]
    Unauthorized(String),

    /// Malformed request body or parameter
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<serde_json::Error> for DaemonError {
    fn from(e: serde_json::Error) -> Self {
        DaemonError::Serialization(e.to_string())
    }
}
