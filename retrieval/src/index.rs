//! Nearest-neighbour index over the corpus documents.

use lore_embeddings::EmbeddingMatrix;

use crate::document::{Document, ScoredHit};
use crate::error::{Result, RetrievalError};

/// Documents paired 1:1 with their embeddings.
///
/// `matrix.row(i)` embeds `documents[i]`; the constructor refuses anything
/// else.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    documents: Vec<Document>,
    matrix: EmbeddingMatrix,
}

impl VectorIndex {
    /// Pair documents with their embedding matrix.
    pub fn new(documents: Vec<Document>, matrix: EmbeddingMatrix) -> Result<Self> {
        if documents.len() != matrix.len() {
            return Err(RetrievalError::Index(format!(
                "{} documents but {} vectors",
                documents.len(),
                matrix.len()
            )));
        }

        Ok(Self { documents, matrix })
    }

    /// Indexed documents, in corpus order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// The embedding matrix.
    pub fn matrix(&self) -> &EmbeddingMatrix {
        &self.matrix
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The `k` documents with the highest dot product against `query`,
    /// highest first. `k` larger than the corpus returns every document.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredHit>> {
        if k == 0 {
            return Err(RetrievalError::Validation(
                "k must be at least 1".to_string(),
            ));
        }

        let hits = self
            .matrix
            .search(query, k)?
            .into_iter()
            .map(|(position, similarity)| ScoredHit {
                document: self.documents[position].clone(),
                similarity,
            })
            .collect();

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn policy_index() -> VectorIndex {
        let documents = vec![
            Document::new("Fruit policy"),
            Document::new("Pet policy"),
            Document::new("Baggage rules"),
        ];
        let matrix =
            EmbeddingMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]])
                .unwrap();
        VectorIndex::new(documents, matrix).unwrap()
    }

    #[test]
    fn test_search_example() {
        let hits = policy_index().search(&[0.9, 0.1], 2).unwrap();

        let contents: Vec<&str> = hits.iter().map(|h| h.document.content.as_str()).collect();
        assert_eq!(contents, vec!["Fruit policy", "Baggage rules"]);
        assert!((hits[0].similarity - 0.9).abs() < 1e-6);
        assert!((hits[1].similarity - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_k_beyond_corpus_returns_all_sorted() {
        let hits = policy_index().search(&[0.9, 0.1], 10).unwrap();

        let contents: Vec<&str> = hits.iter().map(|h| h.document.content.as_str()).collect();
        assert_eq!(contents, vec!["Fruit policy", "Baggage rules", "Pet policy"]);
    }

    #[test]
    fn test_zero_k_is_rejected() {
        let result = policy_index().search(&[0.9, 0.1], 0);
        assert!(matches!(result, Err(RetrievalError::Validation(_))));
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let matrix = EmbeddingMatrix::from_rows(vec![vec![1.0]]).unwrap();
        let result = VectorIndex::new(Vec::new(), matrix);
        assert!(matches!(result, Err(RetrievalError::Index(_))));
    }
}
