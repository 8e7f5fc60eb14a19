//! Similarity computation for embeddings.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use crate::error::{EmbeddingError, Result};

/// Compute the dot product between two embeddings.
///
/// This is the relevance score used by the retrieval engine. Provider
/// embeddings (OpenAI `text-embedding-3-*`) come back unit length, so the dot
/// product equals cosine similarity there.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0; zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    let dot = dot_product(a, b)?;
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (magnitude_a * magnitude_b))
}

/// Normalize an embedding to unit length.
pub fn normalize(embedding: &mut [f32]) {
    let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for x in embedding.iter_mut() {
            *x /= magnitude;
        }
    }
}

/// Select the `k` highest scores, returned as `(position, score)` pairs in
/// descending score order.
///
/// Selection is a partial quickselect over all scores followed by a sort of
/// the `k` winners only, so the cost is linear in `scores.len()` plus
/// `k log k`. When `k >= scores.len()` every position is returned. The order
/// among exactly equal scores is unspecified.
pub fn top_k(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    if k == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(usize, OrderedFloat<f32>)> = scores
        .iter()
        .copied()
        .map(OrderedFloat)
        .enumerate()
        .collect();

    if k < ranked.len() {
        ranked.select_nth_unstable_by_key(k - 1, |&(_, score)| Reverse(score));
        ranked.truncate(k);
    }
    ranked.sort_unstable_by_key(|&(_, score)| Reverse(score));

    ranked
        .into_iter()
        .map(|(position, score)| (position, score.into_inner()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dot_product() {
        let dot = dot_product(&[0.9, 0.1], &[0.7, 0.7]).unwrap();
        assert!((dot - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!(dot_product(&a, &b).is_err());
        assert!(cosine_similarity(&a, &b).is_err());
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[-2.0, 0.0, 0.0]).unwrap();
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let sim = cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap();
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_top_k_partial() {
        let scores = [0.1, 0.9, 0.4, 0.7, 0.2];
        let top = top_k(&scores, 3);
        let positions: Vec<usize> = top.iter().map(|(i, _)| *i).collect();
        assert_eq!(positions, vec![1, 3, 2]);
    }

    #[test]
    fn test_top_k_larger_than_input() {
        let scores = [0.3, 0.5, 0.1];
        let top = top_k(&scores, 10);
        let positions: Vec<usize> = top.iter().map(|(i, _)| *i).collect();
        assert_eq!(positions, vec![1, 0, 2]);
    }

    #[test]
    fn test_top_k_zero_and_empty() {
        assert!(top_k(&[0.5, 0.2], 0).is_empty());
        assert!(top_k(&[], 3).is_empty());
    }

    #[test]
    fn test_top_k_is_non_increasing() {
        let scores: Vec<f32> = (0..50).map(|i| ((i * 37) % 50) as f32 / 50.0).collect();
        for k in 1..=50 {
            let top = top_k(&scores, k);
            assert_eq!(top.len(), k);
            assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
        }
    }
}
