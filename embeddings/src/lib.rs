//! # Embeddings
//!
//! This crate is the embedding and semantic-retrieval engine for the Noema
//! knowledge system: it turns document text into dense vectors, caches them
//! durably with a bounded lifetime, and answers similarity, clustering,
//! projection, and statistics queries over the resulting vector space.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert text to dense vectors, batched, with
//!   content-addressed caching so no cached vector is ever recomputed
//! - **Similarity Search**: Cosine similarity and thresholded top-k ranking
//! - **Clustering**: Reproducible k-means with an inertia quality signal
//! - **Projection**: PCA reduction to low dimensions for visualization
//! - **Statistics**: Norm and pairwise-similarity distributions
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Embedding Engine                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingModel ──► EmbeddingGenerator ──► CacheStore           │
//! │                            │                                    │
//! │                            ▼                                    │
//! │           similarity / cluster / reduce / stats                 │
//! │               (pure functions over vectors)                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The generator is the only component that touches I/O (cache lookups and
//! model inference); everything downstream operates on caller-supplied
//! vectors with no shared state.

pub mod cache;
pub mod cluster;
pub mod config;
pub mod error;
pub mod generator;
pub mod model;
pub mod persist;
pub mod reduce;
pub mod similarity;
pub mod stats;

pub use cache::{CacheKey, CacheStats, CacheStore, MemoryCache};
pub use cluster::{ClusterAssignment, kmeans};
pub use config::EmbeddingConfig;
pub use error::{EmbeddingError, Result};
pub use generator::EmbeddingGenerator;
pub use model::{EmbeddingModel, OpenAiModel};
pub use persist::{load_embeddings, save_embeddings};
pub use reduce::{Projection, pca};
pub use similarity::{SimilarityResult, cosine_similarity, top_k};
pub use stats::{EmbeddingStats, SimilarityStats, embedding_stats};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of embeddings (varies by model).
pub const DEFAULT_DIMENSION: usize = 384; // all-MiniLM-L6-v2
