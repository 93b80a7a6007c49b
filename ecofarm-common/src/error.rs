//! Common error types for EcoFarm

use thiserror::Error;

/// Common result type for EcoFarm operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across EcoFarm crates
#[derive(Error, Debug)]
pub enum Error {
    /// Store rejected a read or write (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing credential or invalid configuration. Not retryable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Weather or language-model provider unreachable, timed out or
    /// answered with a non-success status
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Provider answered with a payload missing required fields
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

