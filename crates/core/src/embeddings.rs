use crate::error::EmbeddingError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Boundary to the external embedding model: text in, fixed-length vector out.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Embedding client for an Ollama-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    endpoint: Url,
    model: String,
    client: Client,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self, EmbeddingError> {
        let endpoint = Url::parse(base_url)?.join("api/embeddings")?;
        Ok(Self {
            endpoint,
            model: model.into(),
            client: Client::new(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        debug!(model = %self.model, text_len = text.len(), "requesting embedding");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&EmbedRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EmbeddingError::Backend {
                status: response.status().to_string(),
                details: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await?;
        let parsed: EmbedResponse = serde_json::from_str(&body)
            .map_err(|error| EmbeddingError::MalformedResponse(error.to_string()))?;

        if parsed.embedding.is_empty() {
            return Err(EmbeddingError::MalformedResponse(
                "embedding vector is empty".to_string(),
            ));
        }

        Ok(parsed.embedding)
    }
}
