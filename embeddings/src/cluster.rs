//! K-means clustering over embedding sets.
//!
//! Partitions a vector set into k groups and reports per-vector labels,
//! cluster centers, and inertia (sum of squared distances to the assigned
//! center; lower is tighter). Runs with a fixed seed so identical input
//! always produces identical output.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::similarity::average;

/// Fixed seed for reproducible center initialization.
pub const KMEANS_SEED: u64 = 42;

/// Iteration cap for Lloyd's algorithm.
const MAX_ITERATIONS: usize = 100;

/// Result of a clustering operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// Cluster label per input vector, in input order.
    pub labels: Vec<usize>,

    /// Cluster centers, one per cluster.
    pub centers: Vec<Embedding>,

    /// Sum of squared distances of each vector to its assigned center.
    pub inertia: f32,

    /// Number of clusters actually produced. Smaller than requested when
    /// the input has fewer vectors than k, or 1 on a degraded fallback.
    pub n_clusters: usize,

    /// True when clustering failed numerically and the result is the
    /// single-cluster fallback rather than a real partition.
    pub degraded: bool,
}

impl ClusterAssignment {
    /// Indices of the vectors assigned to the given cluster.
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|&(_, &label)| label == cluster)
            .map(|(index, _)| index)
            .collect()
    }
}

/// Cluster a vector set into at most `k` groups.
///
/// The effective cluster count is `min(k, vectors.len())`. An empty input
/// is an error; a numerical failure degrades to a single all-inclusive
/// cluster with `degraded = true` instead of failing the caller.
pub fn kmeans(vectors: &[Embedding], k: usize) -> Result<ClusterAssignment> {
    if vectors.is_empty() {
        return Err(EmbeddingError::EmptyInput);
    }
    if k == 0 {
        return Err(EmbeddingError::InvalidClusterCount);
    }

    let dim = vectors[0].len();
    for v in vectors {
        if v.len() != dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dim,
                actual: v.len(),
            });
        }
    }

    let k = k.min(vectors.len());

    match lloyd(vectors, k, dim) {
        Some(assignment) => Ok(assignment),
        None => {
            warn!("k-means failed numerically, returning single-cluster fallback");
            Ok(single_cluster_fallback(vectors, dim))
        }
    }
}

/// Lloyd's algorithm with seeded initialization. Returns `None` when the
/// computation turns non-finite.
fn lloyd(vectors: &[Embedding], k: usize, dim: usize) -> Option<ClusterAssignment> {
    let mut rng = StdRng::seed_from_u64(KMEANS_SEED);
    let mut centers: Vec<Embedding> = sample(&mut rng, vectors.len(), k)
        .iter()
        .map(|i| vectors[i].clone())
        .collect();

    let mut labels = vec![0usize; vectors.len()];

    for iteration in 0..MAX_ITERATIONS {
        // Assign each vector to its nearest center.
        let mut changed = false;
        for (i, vector) in vectors.iter().enumerate() {
            let mut best = 0;
            let mut best_dist = f32::INFINITY;
            for (c, center) in centers.iter().enumerate() {
                let dist = squared_distance(vector, center);
                if !dist.is_finite() {
                    return None;
                }
                if dist < best_dist {
                    best_dist = dist;
                    best = c;
                }
            }
            if labels[i] != best {
                labels[i] = best;
                changed = true;
            }
        }

        // Recompute centers as the mean of their members. An empty cluster
        // keeps its previous center.
        for c in 0..k {
            let mut count = 0usize;
            let mut mean = vec![0.0f32; dim];
            for (vector, &label) in vectors.iter().zip(&labels) {
                if label == c {
                    count += 1;
                    for (m, x) in mean.iter_mut().zip(vector) {
                        *m += x;
                    }
                }
            }
            if count > 0 {
                for m in &mut mean {
                    *m /= count as f32;
                    if !m.is_finite() {
                        return None;
                    }
                }
                centers[c] = mean;
            }
        }

        if !changed {
            debug!("k-means converged after {iteration} iterations");
            break;
        }
    }

    let mut inertia = 0.0f32;
    for (vector, &label) in vectors.iter().zip(&labels) {
        inertia += squared_distance(vector, &centers[label]);
    }
    if !inertia.is_finite() {
        return None;
    }

    Some(ClusterAssignment {
        labels,
        centers,
        inertia,
        n_clusters: k,
        degraded: false,
    })
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn single_cluster_fallback(vectors: &[Embedding], dim: usize) -> ClusterAssignment {
    let center = average(vectors)
        .ok()
        .filter(|c| c.iter().all(|x| x.is_finite()))
        .unwrap_or_else(|| vec![0.0; dim]);

    ClusterAssignment {
        labels: vec![0; vectors.len()],
        centers: vec![center],
        inertia: 0.0,
        n_clusters: 1,
        degraded: true,
    }
}
