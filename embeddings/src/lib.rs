//! # Embeddings
//!
//! Dense-vector plumbing for the retrieval engine.
//!
//! ## Features
//!
//! - **Embedding Generation**: batch text-to-vector calls against an
//!   OpenAI-compatible endpoint
//! - **Similarity Search**: dot-product scoring with partial top-k selection
//! - **Caching**: the embedded corpus is persisted as a single blob keyed by
//!   corpus content and model
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedding ──► EmbeddingMatrix            │
//! │       │                                   │                     │
//! │       ▼                                   ▼                     │
//! │  OpenAI/Ollama                   top_k ◄──┴──► VectorCache      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod error;
pub mod matrix;
pub mod provider;
pub mod similarity;

pub use cache::{VectorCache, cache_key};
pub use error::{EmbeddingError, Result};
pub use matrix::EmbeddingMatrix;
pub use provider::{EmbeddingProvider, OpenAIProvider};
pub use similarity::{cosine_similarity, dot_product, normalize, top_k};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Default embedding model for the OpenAI provider.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";
