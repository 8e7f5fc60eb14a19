//! Errors raised while embedding text or touching the vector cache.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbeddingError>;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// No API key was found for the provider.
    #[error("embedding provider `{0}` has no API key")]
    ProviderNotConfigured(&'static str),

    /// The provider answered with a non-success status.
    #[error("embedding request failed: {0}")]
    ApiRequest(String),

    /// The provider answered 2xx but the body is unusable (wrong row count,
    /// missing data).
    #[error("malformed embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding provider rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Rows of one matrix, or a query and the matrix, disagree on width.
    #[error("vector width mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vector cache file could not be encoded or decoded.
    #[error("vector cache encoding: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
