//! Error types for the relay Lambda functions.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while relaying a request.
///
/// Upstream-reported non-2xx statuses are not errors; they are relayed
/// responses and never pass through this type.
#[derive(Error, Debug)]
pub enum Error {
    /// Client sent something we cannot work with (bad JSON, missing field)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Client used the wrong HTTP method
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Server-side configuration problem (e.g. missing credential)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport fault reaching the upstream
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::MethodNotAllowed(_) => 405,
            _ => 500,
        }
    }
}
