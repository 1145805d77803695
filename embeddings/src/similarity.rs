//! Similarity computation for embeddings.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal vectors
/// - -1.0 means opposite direction
///
/// A zero-norm input yields 0.0, never NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (magnitude_a * magnitude_b))
}

/// Compute the euclidean distance between two embeddings.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let sum: f32 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();

    Ok(sum.sqrt())
}

/// A similarity search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Index of the matched candidate in the input list.
    pub index: usize,

    /// Similarity score.
    pub score: f32,
}

impl SimilarityResult {
    /// Create a new similarity result.
    pub fn new(index: usize, score: f32) -> Self {
        Self { index, score }
    }
}

/// Find the top-k candidates most similar to the query.
///
/// Candidates scoring below `threshold` are dropped. Results are ordered by
/// score descending with ties broken by ascending candidate index, so the
/// ranking is deterministic.
pub fn top_k(
    query: &Embedding,
    candidates: &[Embedding],
    k: usize,
    threshold: f32,
) -> Result<Vec<SimilarityResult>> {
    let mut scores: Vec<(OrderedFloat<f32>, usize)> = Vec::with_capacity(candidates.len());

    for (index, embedding) in candidates.iter().enumerate() {
        let score = cosine_similarity(query, embedding)?;
        if score >= threshold {
            scores.push((OrderedFloat(score), index));
        }
    }

    // Score descending, index ascending.
    scores.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let results: Vec<SimilarityResult> = scores
        .into_iter()
        .take(k)
        .map(|(score, index)| SimilarityResult::new(index, score.0))
        .collect();

    Ok(results)
}

/// Normalize an embedding to unit length.
pub fn normalize(embedding: &mut Embedding) {
    let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for x in embedding.iter_mut() {
            *x /= magnitude;
        }
    }
}

/// Compute the average of multiple embeddings.
pub fn average(embeddings: &[Embedding]) -> Result<Embedding> {
    if embeddings.is_empty() {
        return Ok(Vec::new());
    }

    let dim = embeddings[0].len();
    for e in embeddings {
        if e.len() != dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dim,
                actual: e.len(),
            });
        }
    }

    let n = embeddings.len() as f32;
    let mut result = vec![0.0f32; dim];

    for embedding in embeddings {
        for (i, val) in embedding.iter().enumerate() {
            result[i] += val / n;
        }
    }

    Ok(result)
}
