//! Descriptive statistics over embedding sets.

use serde::{Deserialize, Serialize};

use crate::Embedding;
use crate::error::Result;
use crate::similarity::cosine_similarity;

/// Aggregate statistics for a vector set.
///
/// Stats are advisory: an empty input yields an empty result rather than
/// an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingStats {
    /// Number of vectors.
    pub count: usize,

    /// Dimension of the vectors (0 when empty).
    pub dimension: usize,

    /// Mean L2 norm.
    pub mean_norm: f32,

    /// Standard deviation of the L2 norms.
    pub std_norm: f32,

    /// Distribution of pairwise similarities, absent below two vectors.
    pub similarity: Option<SimilarityStats>,
}

/// Distribution of pairwise cosine similarities, excluding self-pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityStats {
    /// Mean pairwise similarity.
    pub mean: f32,

    /// Standard deviation of pairwise similarities.
    pub std: f32,

    /// Lowest pairwise similarity.
    pub min: f32,

    /// Highest pairwise similarity.
    pub max: f32,
}

/// Compute aggregate statistics over a vector set.
pub fn embedding_stats(vectors: &[Embedding]) -> Result<EmbeddingStats> {
    if vectors.is_empty() {
        return Ok(EmbeddingStats::default());
    }

    let norms: Vec<f32> = vectors
        .iter()
        .map(|v| v.iter().map(|x| x * x).sum::<f32>().sqrt())
        .collect();
    let (mean_norm, std_norm) = mean_and_std(&norms);

    // All off-diagonal pairs; cosine similarity is symmetric, so each
    // unordered pair is computed once.
    let mut similarities = Vec::new();
    for i in 0..vectors.len() {
        for j in (i + 1)..vectors.len() {
            similarities.push(cosine_similarity(&vectors[i], &vectors[j])?);
        }
    }

    let similarity = if similarities.is_empty() {
        None
    } else {
        let (mean, std) = mean_and_std(&similarities);
        let min = similarities.iter().copied().fold(f32::INFINITY, f32::min);
        let max = similarities
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        Some(SimilarityStats {
            mean,
            std,
            min,
            max,
        })
    };

    Ok(EmbeddingStats {
        count: vectors.len(),
        dimension: vectors[0].len(),
        mean_norm,
        std_norm,
        similarity,
    })
}

fn mean_and_std(values: &[f32]) -> (f32, f32) {
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_input_is_empty_result() {
        let stats = embedding_stats(&[]).unwrap();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.dimension, 0);
        assert!(stats.similarity.is_none());
    }

    #[test]
    fn test_single_vector_has_no_similarity() {
        let stats = embedding_stats(&[vec![3.0, 4.0]]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.dimension, 2);
        assert!((stats.mean_norm - 5.0).abs() < 1e-6);
        assert_eq!(stats.std_norm, 0.0);
        assert!(stats.similarity.is_none());
    }

    #[test]
    fn test_orthogonal_pair() {
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let stats = embedding_stats(&vectors).unwrap();

        let similarity = stats.similarity.unwrap();
        assert!((similarity.mean - 0.0).abs() < 1e-6);
        assert!((similarity.min - 0.0).abs() < 1e-6);
        assert!((similarity.max - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_min_max_spread() {
        let vectors = vec![
            vec![1.0, 0.0],  // vs [2,0]: 1.0, vs [-1,0]: -1.0
            vec![2.0, 0.0],  // vs [-1,0]: -1.0
            vec![-1.0, 0.0],
        ];
        let stats = embedding_stats(&vectors).unwrap();

        let similarity = stats.similarity.unwrap();
        assert!((similarity.max - 1.0).abs() < 1e-6);
        assert!((similarity.min - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_mixed_dimensions_rejected() {
        let vectors = vec![vec![1.0, 0.0], vec![1.0]];
        assert!(embedding_stats(&vectors).is_err());
    }
}
