//! On-disk cache for an embedded corpus.
//!
//! The whole matrix is written as one JSON blob. Each blob carries a key
//! derived from the corpus text and the embedding model, so editing the
//! corpus or switching models invalidates it instead of silently serving
//! stale vectors. There is no file locking: two processes building the same
//! cache race and the last writer wins. Blobs are renamed into place, and a
//! blob that fails to decode is treated as a miss.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::matrix::EmbeddingMatrix;

/// Compute the cache key for a corpus embedded with `model`.
pub fn cache_key(corpus: &str, model: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update([0u8]);
    hasher.update(corpus.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Serialized form of the cache file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedVectors {
    key: String,
    model: String,
    matrix: EmbeddingMatrix,
}

/// A single-file vector cache.
#[derive(Debug, Clone)]
pub struct VectorCache {
    path: PathBuf,
}

impl VectorCache {
    /// Create a cache backed by the file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Location of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached matrix if present and stored under `expected_key`.
    ///
    /// Returns `Ok(None)` on a miss, including when the stored key differs or
    /// the blob cannot be decoded.
    pub async fn load(&self, expected_key: &str) -> Result<Option<EmbeddingMatrix>> {
        if !fs::try_exists(&self.path).await? {
            debug!("No vector cache at {}", self.path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await?;
        let cached: CachedVectors = match serde_json::from_str(&content) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(
                    "Vector cache at {} is unreadable ({e}), rebuilding",
                    self.path.display()
                );
                return Ok(None);
            }
        };

        if cached.key != expected_key {
            warn!(
                "Vector cache at {} is stale (model {}), rebuilding",
                self.path.display(),
                cached.model
            );
            return Ok(None);
        }

        info!(
            "Loaded {} cached vectors from {}",
            cached.matrix.len(),
            self.path.display()
        );
        Ok(Some(cached.matrix))
    }

    /// Persist `matrix` under `key`, replacing any previous blob.
    pub async fn store(&self, key: &str, model: &str, matrix: &EmbeddingMatrix) -> Result<()> {
        let cached = CachedVectors {
            key: key.to_string(),
            model: model.to_string(),
            matrix: matrix.clone(),
        };
        let content = serde_json::to_string(&cached)?;

        // Ensure parent directory exists
        if let Some(parent) = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            fs::create_dir_all(parent).await?;
        }

        // Write then rename so readers never see a partial blob.
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, &self.path).await?;
        info!("Saved {} vectors to {}", matrix.len(), self.path.display());
        Ok(())
    }

    /// Delete the cache file if it exists.
    pub async fn clear(&self) -> Result<()> {
        if fs::try_exists(&self.path).await? {
            fs::remove_file(&self.path).await?;
            info!("Cleared vector cache at {}", self.path.display());
        }
        Ok(())
    }
}
