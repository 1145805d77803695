//! End-to-end tests for the embedding engine.
//!
//! Exercises the full path from text ingestion through cached encoding to
//! similarity ranking, clustering, projection, and statistics, using a
//! deterministic mock encoder so the semantic assertions are stable.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use noema_embeddings::{
    Embedding, EmbeddingConfig, EmbeddingGenerator, EmbeddingModel, MemoryCache, Result,
    cosine_similarity, embedding_stats, kmeans, pca, top_k,
};

const DIM: usize = 4;

/// Deterministic encoder with a tiny hand-built semantic space: animal
/// texts point one way, finance texts another.
struct SemanticStub {
    vectors: HashMap<&'static str, Embedding>,
    calls: AtomicUsize,
}

impl SemanticStub {
    fn new() -> Self {
        let mut vectors = HashMap::new();
        vectors.insert("cats are mammals", vec![0.9, 0.4, 0.1, 0.0]);
        vectors.insert("dogs are mammals", vec![0.8, 0.5, 0.1, 0.1]);
        vectors.insert("stock markets rose", vec![0.1, 0.0, 0.9, 0.4]);
        vectors.insert("bond yields fell", vec![0.0, 0.1, 0.8, 0.5]);
        Self {
            vectors,
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingModel for SemanticStub {
    fn name(&self) -> &str {
        "semantic-stub"
    }

    fn model_id(&self) -> &str {
        "semantic-stub-v1"
    }

    fn dimension(&self) -> usize {
        DIM
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                self.vectors
                    .get(t.as_str())
                    .cloned()
                    .unwrap_or_else(|| vec![0.5; DIM])
            })
            .collect())
    }

    fn is_available(&self) -> bool {
        true
    }
}

fn engine() -> (Arc<SemanticStub>, EmbeddingGenerator) {
    let model = Arc::new(SemanticStub::new());
    let generator = EmbeddingGenerator::new(
        Arc::clone(&model) as Arc<dyn EmbeddingModel>,
        Arc::new(MemoryCache::new()),
        EmbeddingConfig::new().with_dimension(DIM),
    );
    (model, generator)
}

#[tokio::test]
async fn semantic_relatedness_ordering() {
    let (_, generator) = engine();

    let texts = vec![
        "cats are mammals".to_string(),
        "dogs are mammals".to_string(),
        "stock markets rose".to_string(),
    ];
    let embeddings = generator.encode_batch(&texts).await.unwrap();

    let cats_dogs = cosine_similarity(&embeddings[0], &embeddings[1]).unwrap();
    let cats_stocks = cosine_similarity(&embeddings[0], &embeddings[2]).unwrap();

    assert!(
        cats_dogs > cats_stocks,
        "expected animal texts closer than animal/finance: {cats_dogs} vs {cats_stocks}"
    );
}

#[tokio::test]
async fn encode_is_deterministic_and_cached() {
    let (model, generator) = engine();

    let first = generator.encode_one("cats are mammals").await.unwrap();
    let second = generator.encode_one("cats are mammals").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(model.call_count(), 1, "repeat encode must be a cache hit");
}

#[tokio::test]
async fn batch_mixes_hits_and_misses_in_order() {
    let (model, generator) = engine();

    generator.encode_one("dogs are mammals").await.unwrap();
    assert_eq!(model.call_count(), 1);

    let texts = vec![
        "cats are mammals".to_string(),
        "dogs are mammals".to_string(),
        "stock markets rose".to_string(),
    ];
    let embeddings = generator.encode_batch(&texts).await.unwrap();

    // One extra model call for the two misses, output in input order.
    assert_eq!(model.call_count(), 2);
    assert_eq!(embeddings[0], vec![0.9, 0.4, 0.1, 0.0]);
    assert_eq!(embeddings[1], vec![0.8, 0.5, 0.1, 0.1]);
    assert_eq!(embeddings[2], vec![0.1, 0.0, 0.9, 0.4]);
}

#[tokio::test]
async fn search_ranks_documents() {
    let (_, generator) = engine();

    let documents = vec![
        "dogs are mammals".to_string(),
        "stock markets rose".to_string(),
        "bond yields fell".to_string(),
    ];
    let doc_embeddings = generator.encode_batch(&documents).await.unwrap();

    let results = generator
        .search("cats are mammals", &doc_embeddings, 2, 0.0)
        .await
        .unwrap();

    assert_eq!(results[0].index, 0, "the other animal text should rank first");
}

#[tokio::test]
async fn clustering_separates_topics() {
    let (_, generator) = engine();

    let texts = vec![
        "cats are mammals".to_string(),
        "dogs are mammals".to_string(),
        "stock markets rose".to_string(),
        "bond yields fell".to_string(),
    ];
    let embeddings = generator.encode_batch(&texts).await.unwrap();

    let assignment = kmeans(&embeddings, 2).unwrap();
    assert!(!assignment.degraded);
    assert_eq!(assignment.labels[0], assignment.labels[1]);
    assert_eq!(assignment.labels[2], assignment.labels[3]);
    assert_ne!(assignment.labels[0], assignment.labels[2]);
}

#[tokio::test]
async fn projection_and_stats_cover_the_set() {
    let (_, generator) = engine();

    let texts = vec![
        "cats are mammals".to_string(),
        "dogs are mammals".to_string(),
        "stock markets rose".to_string(),
        "bond yields fell".to_string(),
    ];
    let embeddings = generator.encode_batch(&texts).await.unwrap();

    let projection = pca(&embeddings, 2).unwrap();
    assert_eq!(projection.points.len(), 4);
    assert!(!projection.degraded);

    let stats = embedding_stats(&embeddings).unwrap();
    assert_eq!(stats.count, 4);
    assert_eq!(stats.dimension, DIM);
    let similarity = stats.similarity.unwrap();
    assert!(similarity.min <= similarity.mean && similarity.mean <= similarity.max);
}

#[tokio::test]
async fn top_k_worked_example() {
    // Candidates with similarities 0.9, 0.3, 0.95, 0.1 against the query;
    // threshold 0.5 and k=2 keep exactly the two best, best first.
    let query = vec![1.0, 0.0];
    let candidates = vec![
        vec![0.9, (1.0f32 - 0.81).sqrt()],
        vec![0.3, (1.0f32 - 0.09).sqrt()],
        vec![0.95, (1.0f32 - 0.9025).sqrt()],
        vec![0.1, (1.0f32 - 0.01).sqrt()],
    ];

    let results = top_k(&query, &candidates, 2, 0.5).unwrap();

    let ranked: Vec<usize> = results.iter().map(|r| r.index).collect();
    assert_eq!(ranked, vec![2, 0]);
}
