//! Bulk export and import of vector sets.
//!
//! A portable, versioned binary format for backing up or analyzing an
//! entire vector set offline:
//!
//! ```text
//! magic   b"NEMB"        4 bytes
//! version u16 LE         currently 1
//! count   u32 LE         number of vectors
//! dim     u32 LE         dimension of every vector
//! payload count * dim    f32 LE values, row-major
//! ```

use std::path::Path;

use tokio::fs;
use tracing::info;

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

const MAGIC: &[u8; 4] = b"NEMB";
const VERSION: u16 = 1;
const HEADER_LEN: usize = 4 + 2 + 4 + 4;

/// Save a vector set to a file.
///
/// All vectors must share one dimension; ragged input is rejected before
/// anything is written.
pub async fn save_embeddings(path: impl AsRef<Path>, vectors: &[Embedding]) -> Result<()> {
    let dim = vectors.first().map_or(0, Vec::len);
    for v in vectors {
        if v.len() != dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dim,
                actual: v.len(),
            });
        }
    }

    let mut buf = Vec::with_capacity(HEADER_LEN + vectors.len() * dim * 4);
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.extend_from_slice(&(vectors.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(dim as u32).to_le_bytes());
    for vector in vectors {
        for value in vector {
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }

    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&path, buf).await?;

    info!("Saved {} embeddings to {}", vectors.len(), path.as_ref().display());
    Ok(())
}

/// Load a vector set from a file written by [`save_embeddings`].
pub async fn load_embeddings(path: impl AsRef<Path>) -> Result<Vec<Embedding>> {
    let data = fs::read(&path).await?;

    if data.len() < HEADER_LEN {
        return Err(EmbeddingError::PersistFormat("truncated header".to_string()));
    }
    if &data[0..4] != MAGIC {
        return Err(EmbeddingError::PersistFormat("bad magic".to_string()));
    }

    let version = u16::from_le_bytes([data[4], data[5]]);
    if version != VERSION {
        return Err(EmbeddingError::PersistFormat(format!(
            "unsupported version {version}"
        )));
    }

    let count = u32::from_le_bytes([data[6], data[7], data[8], data[9]]) as usize;
    let dim = u32::from_le_bytes([data[10], data[11], data[12], data[13]]) as usize;

    // Header counts are untrusted; reject sizes the platform cannot even
    // represent instead of overflowing.
    let expected_len = count
        .checked_mul(dim)
        .and_then(|values| values.checked_mul(4))
        .and_then(|payload| payload.checked_add(HEADER_LEN))
        .ok_or_else(|| {
            EmbeddingError::PersistFormat(format!("implausible header: {count} x {dim} vectors"))
        })?;
    if data.len() != expected_len {
        return Err(EmbeddingError::PersistFormat(format!(
            "expected {expected_len} bytes, got {}",
            data.len()
        )));
    }

    let mut vectors = Vec::with_capacity(count);
    let mut offset = HEADER_LEN;
    for _ in 0..count {
        let mut vector = Vec::with_capacity(dim);
        for _ in 0..dim {
            let bytes = [
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ];
            vector.push(f32::from_le_bytes(bytes));
            offset += 4;
        }
        vectors.push(vector);
    }

    info!("Loaded {count} embeddings from {}", path.as_ref().display());
    Ok(vectors)
}
