//! Dimensionality reduction for visualization.
//!
//! Projects high-dimensional embeddings onto their principal components.
//! The projection approximately preserves pairwise distances; exactness is
//! not guaranteed. When fewer informative components exist than requested,
//! the remaining coordinates are zero-filled and the result is tagged
//! degraded — callers always get output of the requested shape and can
//! always tell a real projection from a fallback.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Power-iteration rounds per component.
const MAX_ITERATIONS: usize = 200;

/// Convergence threshold on the change of direction between rounds.
const CONVERGENCE: f64 = 1e-10;

/// A low-dimensional projection of a vector set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    /// One point per input vector, in input order, each of the requested
    /// dimensionality.
    pub points: Vec<Vec<f32>>,

    /// Number of informative components actually found.
    pub components_found: usize,

    /// True when fewer components were found than requested and the
    /// missing coordinates are zero-filled.
    pub degraded: bool,
}

/// Project a vector set onto its top `target_dims` principal components.
///
/// An empty input yields an empty projection (not an error). Output length
/// and order match the input exactly.
pub fn pca(vectors: &[Embedding], target_dims: usize) -> Result<Projection> {
    if vectors.is_empty() {
        return Ok(Projection {
            points: Vec::new(),
            components_found: 0,
            degraded: false,
        });
    }

    let n = vectors.len();
    let dim = vectors[0].len();
    for v in vectors {
        if v.len() != dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dim,
                actual: v.len(),
            });
        }
    }

    // Center the data (f64 accumulation for stability).
    let mut mean = vec![0.0f64; dim];
    for vector in vectors {
        for (m, x) in mean.iter_mut().zip(vector) {
            *m += f64::from(*x);
        }
    }
    for m in &mut mean {
        *m /= n as f64;
    }

    let centered: Vec<Vec<f64>> = vectors
        .iter()
        .map(|v| {
            v.iter()
                .zip(&mean)
                .map(|(x, m)| f64::from(*x) - m)
                .collect()
        })
        .collect();

    // Rank of centered data is at most min(n - 1, dim).
    let max_components = target_dims.min(dim).min(n.saturating_sub(1));

    let mut components: Vec<Vec<f64>> = Vec::with_capacity(max_components);
    for _ in 0..max_components {
        match principal_component(&centered, &components, dim) {
            Some(component) => components.push(component),
            None => break,
        }
    }

    let found = components.len();
    let degraded = found < target_dims;
    if degraded {
        warn!(
            "projection found {found} of {target_dims} requested components, \
             zero-filling the rest"
        );
    }

    let points = centered
        .iter()
        .map(|row| {
            let mut point = vec![0.0f32; target_dims];
            for (coord, component) in point.iter_mut().zip(&components) {
                let value: f64 = row.iter().zip(component).map(|(x, c)| x * c).sum();
                *coord = value as f32;
            }
            point
        })
        .collect();

    Ok(Projection {
        points,
        components_found: found,
        degraded,
    })
}

/// Extract the next principal component by power iteration, deflating
/// against the components already found. Returns `None` when no informative
/// direction remains.
///
/// Each canonical basis axis is tried in turn as the starting direction:
/// an axis whose residual lies in the data's null space produces a zero
/// iterate, which only rules out that axis, not the component.
fn principal_component(
    centered: &[Vec<f64>],
    found: &[Vec<f64>],
    dim: usize,
) -> Option<Vec<f64>> {
    'axes: for axis in 0..dim {
        let mut w = vec![0.0f64; dim];
        w[axis] = 1.0;
        orthogonalize(&mut w, found);

        let norm = l2_norm(&w);
        if norm < 1e-9 {
            continue;
        }
        for x in &mut w {
            *x /= norm;
        }

        for _ in 0..MAX_ITERATIONS {
            // w <- X^T (X w), i.e. one covariance multiplication without
            // materializing the covariance matrix.
            let mut next = vec![0.0f64; dim];
            for row in centered {
                let projection: f64 = row.iter().zip(&w).map(|(x, c)| x * c).sum();
                for (n, x) in next.iter_mut().zip(row) {
                    *n += projection * x;
                }
            }

            orthogonalize(&mut next, found);

            let norm = l2_norm(&next);
            if !norm.is_finite() {
                return None;
            }
            if norm < CONVERGENCE {
                // Starting axis fell in the null space; try the next one.
                continue 'axes;
            }
            for x in &mut next {
                *x /= norm;
            }

            let alignment: f64 = next.iter().zip(&w).map(|(a, b)| a * b).sum();
            w = next;
            if (alignment.abs() - 1.0).abs() < CONVERGENCE {
                break;
            }
        }

        // Canonical sign: largest-magnitude entry positive, so repeated
        // runs produce identical output.
        if let Some(pivot) = w
            .iter()
            .cloned()
            .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        {
            if pivot < 0.0 {
                for x in &mut w {
                    *x = -*x;
                }
            }
        }

        return Some(w);
    }
    None
}

/// Gram-Schmidt: remove the projections of `w` onto each found component.
fn orthogonalize(w: &mut [f64], found: &[Vec<f64>]) {
    for component in found {
        let projection: f64 = w.iter().zip(component).map(|(a, b)| a * b).sum();
        for (x, c) in w.iter_mut().zip(component) {
            *x -= projection * c;
        }
    }
}

fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}
