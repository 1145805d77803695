//! Cache-backed embedding generation.
//!
//! The generator wraps a text-encoding model behind the cache: every lookup
//! goes through [`CacheStore`] first, and only the misses are sent to the
//! model, in a single batch inference call. Cache failures never abort a
//! request; they degrade to a miss and the vector is computed anyway.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::Embedding;
use crate::cache::{CacheKey, CacheStore};
use crate::config::EmbeddingConfig;
use crate::error::{EmbeddingError, Result};
use crate::model::EmbeddingModel;
use crate::similarity::{SimilarityResult, cosine_similarity, top_k};

/// Generates embeddings for text, backed by a cache.
///
/// Both collaborators are injected, so tests can substitute a deterministic
/// model or a misbehaving store.
pub struct EmbeddingGenerator {
    model: Arc<dyn EmbeddingModel>,
    cache: Arc<dyn CacheStore>,
    config: EmbeddingConfig,
}

impl EmbeddingGenerator {
    /// Create a new generator.
    pub fn new(
        model: Arc<dyn EmbeddingModel>,
        cache: Arc<dyn CacheStore>,
        config: EmbeddingConfig,
    ) -> Self {
        Self {
            model,
            cache,
            config,
        }
    }

    /// The cache backing this generator.
    pub fn cache(&self) -> Arc<dyn CacheStore> {
        Arc::clone(&self.cache)
    }

    /// The generator configuration.
    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Generate an embedding for a single text.
    pub async fn encode_one(&self, text: &str) -> Result<Embedding> {
        let mut embeddings = self.encode_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty batch result".to_string()))
    }

    /// Generate embeddings for a batch of texts.
    ///
    /// The output has the same length and order as the input regardless of
    /// which entries were cache hits. The model is invoked at most once, for
    /// the sublist of cache misses; if it fails, the whole call fails and no
    /// partial result is returned (entries cached before the failure stay
    /// valid).
    pub async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let keys: Vec<CacheKey> = texts.iter().map(|t| CacheKey::for_text(t)).collect();

        // One result slot per input, pre-filled from the cache. A cache
        // failure is a miss, not an error (fail-open).
        let mut slots: Vec<Option<Embedding>> = Vec::with_capacity(texts.len());
        let mut miss_indices: Vec<usize> = Vec::new();

        for (i, key) in keys.iter().enumerate() {
            match self.cache.get(key).await {
                Ok(Some(embedding)) => slots.push(Some(embedding)),
                Ok(None) => {
                    slots.push(None);
                    miss_indices.push(i);
                }
                Err(err) => {
                    warn!("cache lookup failed, treating as miss: {err}");
                    slots.push(None);
                    miss_indices.push(i);
                }
            }
        }

        debug!(
            "encode_batch: {} texts, {} cache hits, {} misses",
            texts.len(),
            texts.len() - miss_indices.len(),
            miss_indices.len()
        );

        if !miss_indices.is_empty() {
            let miss_texts: Vec<String> =
                miss_indices.iter().map(|&i| texts[i].clone()).collect();

            let computed = self.model.embed_batch(&miss_texts).await?;

            if computed.len() != miss_indices.len() {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "model returned {} embeddings for {} texts",
                    computed.len(),
                    miss_indices.len()
                )));
            }

            let ttl = self.config.cache_ttl;
            for (&i, embedding) in miss_indices.iter().zip(computed) {
                if embedding.len() != self.config.dimension {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: self.config.dimension,
                        actual: embedding.len(),
                    });
                }

                // Write-through; a failed write only costs a recompute later.
                if let Err(err) = self
                    .cache
                    .set(keys[i].clone(), embedding.clone(), ttl)
                    .await
                {
                    warn!("cache write failed: {err}");
                }

                slots[i] = Some(embedding);
            }
        }

        let mut result = Vec::with_capacity(slots.len());
        for slot in slots {
            match slot {
                Some(embedding) => result.push(embedding),
                None => {
                    return Err(EmbeddingError::InvalidResponse(
                        "unresolved embedding slot".to_string(),
                    ));
                }
            }
        }
        Ok(result)
    }

    /// Cosine similarity between the embeddings of two texts.
    pub async fn text_similarity(&self, a: &str, b: &str) -> Result<f32> {
        let embeddings = self.encode_batch(&[a.to_string(), b.to_string()]).await?;
        cosine_similarity(&embeddings[0], &embeddings[1])
    }

    /// Rank candidate embeddings against a query text.
    ///
    /// Convenience for callers that hold already-computed document vectors
    /// and only need the query side encoded.
    pub async fn search(
        &self,
        query: &str,
        candidates: &[Embedding],
        k: usize,
        threshold: f32,
    ) -> Result<Vec<SimilarityResult>> {
        let query_embedding = self.encode_one(query).await?;
        top_k(&query_embedding, candidates, k, threshold)
    }
}
