//! Error types for the retrieval engine.

use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur in the retrieval engine.
///
/// None of these are retried internally; they surface to the caller that
/// needed the context.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The corpus could not be downloaded.
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Embedding provider or vector cache failure.
    #[error("embedding error: {0}")]
    Embedding(#[from] lore_embeddings::EmbeddingError),

    /// The caller passed an argument outside the contract.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// Documents and vectors disagree.
    #[error("index error: {0}")]
    Index(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
