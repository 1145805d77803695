//! Error types for the embeddings system.
//!
//! Compute-path failures (the model itself) propagate to callers; cache
//! failures never appear here because the generator degrades to a cache
//! miss instead of raising (fail-open).

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embeddings system.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Provider not configured.
    #[error("embedding provider not configured")]
    ProviderNotConfigured,

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// An operation that requires at least one vector got none.
    #[error("operation requires a non-empty vector set")]
    EmptyInput,

    /// A cluster count of zero was requested.
    #[error("cluster count must be at least 1")]
    InvalidClusterCount,

    /// Persisted vector file is malformed.
    #[error("invalid vector file: {0}")]
    PersistFormat(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
