//! Configuration for the embedding engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::DEFAULT_DIMENSION;

/// Default lifetime of a cached embedding: 24 hours.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Configuration for the embedding generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model to use (provider-specific). `None` uses the provider default.
    pub model: Option<String>,

    /// Expected embedding dimension; every produced vector is checked
    /// against this.
    pub dimension: usize,

    /// Lifetime of cache entries.
    pub cache_ttl: Duration,
}

impl EmbeddingConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            model: None,
            dimension: DEFAULT_DIMENSION,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the expected embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Set the cache entry lifetime.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::new()
    }
}
