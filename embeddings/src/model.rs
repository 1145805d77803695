//! Text-encoding model backends.
//!
//! A model turns a batch of texts into one embedding per text, in order.
//! The generator only ever calls [`EmbeddingModel::embed_batch`] once per
//! group of cache misses, so implementations should accept the whole batch
//! in a single inference request.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::Embedding;
use crate::config::EmbeddingConfig;
use crate::error::{EmbeddingError, Result};

/// Trait for text-encoding model backends.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Get the model identifier in use.
    fn model_id(&self) -> &str;

    /// Get the dimension of produced embeddings.
    fn dimension(&self) -> usize;

    /// Encode a batch of texts. The output has the same length and order
    /// as the input. An error aborts the whole batch; there is no partial
    /// result.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// Check if the backend is usable (API key set, etc.).
    fn is_available(&self) -> bool;
}

/// Embedding backend speaking the OpenAI `/embeddings` protocol.
///
/// Also covers self-hosted OpenAI-compatible inference servers via
/// [`OpenAiModel::with_base_url`].
pub struct OpenAiModel {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model identifier sent with each request.
    model: String,

    /// Requested output dimensions (if supported by the model).
    dimensions: Option<usize>,
}

impl OpenAiModel {
    /// Create a new backend with defaults.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::new(),
            model: "text-embedding-3-small".to_string(),
            dimensions: None,
        }
    }

    /// Create a backend configured from an [`EmbeddingConfig`].
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let mut backend = Self::new().with_dimensions(config.dimension);
        if let Some(ref model) = config.model {
            backend = backend.with_model(model.clone());
        }
        backend
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the requested output dimensions.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    fn model_default_dimension(&self) -> usize {
        match self.model.as_str() {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            _ => 1536,
        }
    }
}

impl Default for OpenAiModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingModel for OpenAiModel {
    fn name(&self) -> &str {
        "openai"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimensions
            .unwrap_or_else(|| self.model_default_dimension())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let api_key = self
            .api_key
            .as_ref()
            .ok_or(EmbeddingError::ProviderNotConfigured)?;

        debug!(
            "Requesting {} embeddings from model: {}",
            texts.len(),
            self.model
        );

        let mut body = serde_json::json!({
            "input": texts,
            "model": self.model
        });

        if let Some(dims) = self.dimensions {
            body["dimensions"] = serde_json::json!(dims);
        }

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "API error: {error_text}"
            )));
        }

        let result: OpenAiEmbeddingResponse = response.json().await?;

        if result.data.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                result.data.len()
            )));
        }

        let embeddings: Vec<Embedding> = result.data.into_iter().map(|item| item.embedding).collect();

        info!("Generated {} batch embeddings", embeddings.len());

        Ok(embeddings)
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingData {
    embedding: Vec<f32>,
    #[allow(dead_code)]
    index: usize,
}
