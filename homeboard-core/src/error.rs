//! Error types for the Homeboard ecosystem.

use thiserror::Error;

/// Errors that can occur in Homeboard operations.
#[derive(Error, Debug)]
pub enum HomeboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Encryption error: {0}")]
    Crypto(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for Homeboard operations.
pub type HomeboardResult<T> = Result<T, HomeboardError>;
