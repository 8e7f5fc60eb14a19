//! Dense row-major embedding matrix.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::similarity::{dot_product, top_k};

/// An ordered stack of embeddings sharing one dimension.
///
/// Row `i` embeds whatever item sits at position `i` in the caller's own
/// sequence; the matrix itself carries no identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingMatrix {
    /// Dimension of every row.
    dimension: usize,

    /// The stored embeddings.
    rows: Vec<Embedding>,
}

impl EmbeddingMatrix {
    /// Stack embeddings into a matrix, checking they share a dimension.
    pub fn from_rows(rows: Vec<Embedding>) -> Result<Self> {
        let dimension = rows.first().map_or(0, Vec::len);

        if let Some(bad) = rows.iter().find(|row| row.len() != dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        Ok(Self { dimension, rows })
    }

    /// Dimension of the stored embeddings (0 for an empty matrix).
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Borrow a row.
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Dot product of `query` against every row, in row order.
    pub fn scores(&self, query: &[f32]) -> Result<Vec<f32>> {
        if !self.is_empty() && query.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        self.rows.iter().map(|row| dot_product(query, row)).collect()
    }

    /// The `k` best-scoring rows for `query`, highest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        let scores = self.scores(query)?;
        let hits = top_k(&scores, k);
        debug!("Selected {} of {} rows", hits.len(), scores.len());
        Ok(hits)
    }
}
