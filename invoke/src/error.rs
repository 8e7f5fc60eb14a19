//! Error types for model invocation.

use thiserror::Error;

/// Result type alias for invocation operations.
pub type Result<T> = std::result::Result<T, InvokeError>;

/// Errors that can occur while talking to a model.
///
/// `Operation` and `Validation` are the per-attempt failures the retry loop
/// absorbs; the rest come from backend configuration and the chat client.
#[derive(Error, Debug)]
pub enum InvokeError {
    /// The wrapped operation failed.
    #[error("operation failed: {0}")]
    Operation(String),

    /// The response was rejected by the validator.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No backend family matches the model name.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// Backend requires an API key that is not set.
    #[error("missing API key: set {0}")]
    MissingApiKey(&'static str),

    /// Non-success answer from the model API.
    #[error("API error: {0}")]
    Api(String),

    /// The model returned no message content.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
