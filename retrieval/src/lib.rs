//! # Retrieval
//!
//! Top-k semantic retrieval over a small corpus:
//!
//! 1. the corpus is downloaded once and split before every heading,
//! 2. every chunk is embedded in one batch and the vectors cached on disk,
//! 3. a query is embedded, scored by dot product against every chunk, and the
//!    best `k` chunks are returned highest first.
//!
//! ```text
//!   corpus_url ──► swiss_faq.md ──► Documents ─┐
//!                                              ├──► VectorIndex ──► ScoredHit
//!   EmbeddingProvider ──► VectorCache ─────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lore_embeddings::OpenAIProvider;
//! use lore_retrieval::{RetrievalConfig, RetrievalService};
//!
//! let service = RetrievalService::new(RetrievalConfig::default(), Arc::new(OpenAIProvider::new()));
//! let hits = service.query("Can I bring my cat on board?", 2).await?;
//! ```

pub mod config;
pub mod corpus;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;

pub use config::RetrievalConfig;
pub use document::{Document, ScoredHit};
pub use engine::RetrievalService;
pub use error::{Result, RetrievalError};
pub use index::VectorIndex;

// Re-export from dependencies for convenience
pub use lore_embeddings::{EmbeddingProvider, OpenAIProvider};
