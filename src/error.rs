//! Tidepool error types

use thiserror::Error;

/// Tidepool error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A session, tool, or object was not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A reference declaration could not be parsed
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Storage error on an existing record
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Tidepool operations
pub type Result<T> = std::result::Result<T, Error>;
