/// Unified error types for the CoreLink ID SDK
use thiserror::Error;

/// Main error type for the SDK
#[derive(Error, Debug)]
pub enum IdError {
    /// Plain key/value tier errors
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Expiring cache tier errors
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Resolution service replied with a non-success status
    #[error("Resolution service returned status {0}")]
    Status(u16),

    /// Response body did not match the documented shape
    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for SDK operations
pub type IdResult<T> = Result<T, IdError>;
