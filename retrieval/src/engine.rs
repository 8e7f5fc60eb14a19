//! Retrieval service: corpus download, vector build-or-load, and queries.

use std::sync::Arc;

use tokio::fs;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use lore_embeddings::{EmbeddingMatrix, EmbeddingProvider, VectorCache, cache_key};

use crate::config::RetrievalConfig;
use crate::corpus::{documents_from_text, fetch_if_missing};
use crate::document::{Document, ScoredHit};
use crate::error::{Result, RetrievalError};
use crate::index::VectorIndex;

/// Semantic retrieval over a single corpus.
///
/// The service is built from an explicit configuration and a shared
/// embedding provider. The index is built on first use and memoised for the
/// lifetime of the service; the embedded corpus is also persisted to the
/// vector cache so later processes skip the embedding call.
pub struct RetrievalService {
    /// Configuration.
    config: RetrievalConfig,

    /// Embedding provider, used for the corpus batch and for every query.
    provider: Arc<dyn EmbeddingProvider>,

    /// HTTP client for the corpus download.
    client: reqwest::Client,

    /// Persisted corpus vectors.
    cache: VectorCache,

    /// Lazily built index.
    index: OnceCell<VectorIndex>,
}

impl RetrievalService {
    /// Create a service. Nothing is downloaded or embedded until first use.
    pub fn new(config: RetrievalConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        let cache = VectorCache::new(&config.vectors_path);
        Self {
            config,
            provider,
            client: reqwest::Client::new(),
            cache,
            index: OnceCell::new(),
        }
    }

    /// Use a preconfigured HTTP client for the corpus download.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The service configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Download the corpus unless a local copy already exists.
    pub async fn ensure_corpus(&self) -> Result<()> {
        fetch_if_missing(&self.client, &self.config.corpus_url, &self.config.corpus_path).await?;
        Ok(())
    }

    /// Build the index, or return the one already built.
    ///
    /// The first call reads the corpus (downloading it if needed), then loads
    /// the vector cache or embeds every document in a single batch and
    /// persists the result.
    pub async fn ensure_vectors(&self) -> Result<&VectorIndex> {
        self.index.get_or_try_init(|| self.build_index()).await
    }

    /// Documents of the built index.
    pub async fn documents(&self) -> Result<&[Document]> {
        Ok(self.ensure_vectors().await?.documents())
    }

    /// The `k` most similar documents to `text`, highest similarity first.
    ///
    /// `k` of zero is rejected before any provider call; `k` larger than the
    /// corpus returns every document.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredHit>> {
        if k == 0 {
            return Err(RetrievalError::Validation(
                "k must be at least 1".to_string(),
            ));
        }

        let index = self.ensure_vectors().await?;
        let embedding = self.provider.embed(text).await?;
        let hits = index.search(&embedding, k)?;

        debug!("Query returned {} hits", hits.len());
        Ok(hits)
    }

    /// Query with the configured default `k`.
    pub async fn search(&self, text: &str) -> Result<Vec<ScoredHit>> {
        self.query(text, self.config.default_k).await
    }

    /// Consult the policy corpus: the best `lookup_k` chunks joined by a
    /// blank line, ready to be placed into a prompt.
    pub async fn lookup(&self, text: &str) -> Result<String> {
        let hits = self.query(text, self.config.lookup_k).await?;
        Ok(hits
            .into_iter()
            .map(|hit| hit.document.content)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    async fn build_index(&self) -> Result<VectorIndex> {
        self.ensure_corpus().await?;

        let corpus_path = &self.config.corpus_path;
        let text = fs::read_to_string(corpus_path).await?;
        let source = corpus_path.display().to_string();
        let documents = documents_from_text(&text, &self.config.heading_marker, &source);
        info!("Split corpus into {} documents", documents.len());

        let key = cache_key(&text, self.provider.model());
        let cached = self
            .cache
            .load(&key)
            .await?
            .filter(|matrix| {
                let fits = matrix.len() == documents.len();
                if !fits {
                    warn!(
                        "Cached vectors cover {} documents, corpus has {}",
                        matrix.len(),
                        documents.len()
                    );
                }
                fits
            });

        let matrix = match cached {
            Some(matrix) => matrix,
            None => {
                let matrix = self.embed_documents(&documents).await?;
                self.cache.store(&key, self.provider.model(), &matrix).await?;
                matrix
            }
        };

        VectorIndex::new(documents, matrix)
    }

    async fn embed_documents(&self, documents: &[Document]) -> Result<EmbeddingMatrix> {
        info!(
            "Embedding {} documents with {} ({})",
            documents.len(),
            self.provider.name(),
            self.provider.model()
        );

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let rows = self.provider.embed_batch(&texts).await?;

        if rows.len() != documents.len() {
            return Err(RetrievalError::Index(format!(
                "provider returned {} vectors for {} documents",
                rows.len(),
                documents.len()
            )));
        }

        Ok(EmbeddingMatrix::from_rows(rows)?)
    }
}
