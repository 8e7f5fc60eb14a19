//! Configuration for the retrieval service.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where the policy FAQ corpus is downloaded from by default.
pub const DEFAULT_CORPUS_URL: &str =
    "https://storage.googleapis.com/benchmarks-artifacts/travel-db/swiss_faq.md";

/// Configuration for the retrieval service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Remote location of the raw corpus.
    pub corpus_url: String,

    /// Local copy of the corpus.
    pub corpus_path: PathBuf,

    /// Vector cache file.
    pub vectors_path: PathBuf,

    /// Line prefix that starts a new document chunk.
    pub heading_marker: String,

    /// Number of hits returned when the caller does not choose.
    pub default_k: usize,

    /// Number of hits joined by the policy lookup tool.
    pub lookup_k: usize,
}

impl RetrievalConfig {
    /// Create a configuration keeping the corpus and cache under `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            corpus_url: DEFAULT_CORPUS_URL.to_string(),
            corpus_path: data_dir.join("swiss_faq.md"),
            vectors_path: data_dir.join("vectors.json"),
            heading_marker: "##".to_string(),
            default_k: 5,
            lookup_k: 2,
        }
    }

    /// Set the corpus URL.
    pub fn with_corpus_url(mut self, url: impl Into<String>) -> Self {
        self.corpus_url = url.into();
        self
    }

    /// Set the local corpus path.
    pub fn with_corpus_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.corpus_path = path.into();
        self
    }

    /// Set the vector cache path.
    pub fn with_vectors_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.vectors_path = path.into();
        self
    }

    /// Set the heading marker used to split the corpus.
    pub fn with_heading_marker(mut self, marker: impl Into<String>) -> Self {
        self.heading_marker = marker.into();
        self
    }

    /// Set the default number of hits.
    pub fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k;
        self
    }

    /// Set the number of hits used by the lookup tool.
    pub fn with_lookup_k(mut self, k: usize) -> Self {
        self.lookup_k = k;
        self
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self::new(dirs::data_dir().unwrap_or_default().join("lore"))
    }
}
