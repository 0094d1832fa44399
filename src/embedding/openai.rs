use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::core::config::RetrievalConfig;
use crate::core::errors::RetrievalError;
use super::Embedder;

/// OpenAI-compatible `/v1/embeddings` client.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
    client: Client,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(config: &RetrievalConfig) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(RetrievalError::config)?;

        Ok(Self {
            base_url: config.embedding_base_url.trim_end_matches('/').to_string(),
            api_key: config.embedding_api_key.clone(),
            model: config.embedding_model.clone(),
            dimension: config.embedding_dimension,
            client,
        })
    }

    fn map_transport_error(&self, err: reqwest::Error) -> RetrievalError {
        if err.is_timeout() {
            RetrievalError::Timeout(format!("embedding request to {}", self.base_url))
        } else {
            RetrievalError::embedding(err)
        }
    }

    /// Decode a provider response body into a vector of the configured
    /// dimensionality. A mis-sized vector counts as malformed output and
    /// never reaches the store.
    fn decode_payload(&self, body: &str) -> Result<Vec<f32>, RetrievalError> {
        let payload: EmbeddingsResponse = serde_json::from_str(body)
            .map_err(|e| RetrievalError::EmbeddingService(format!("malformed response: {}", e)))?;

        let vector = payload
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| {
                RetrievalError::EmbeddingService("provider returned no embedding".to_string())
            })?;

        if vector.len() != self.dimension {
            return Err(RetrievalError::EmbeddingService(format!(
                "expected {} dimensions, provider returned {}",
                self.dimension,
                vector.len()
            )));
        }

        Ok(vector)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": text,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.text().await.unwrap_or_default();
            return Err(RetrievalError::EmbeddingService(format!(
                "provider returned {}: {}",
                status, detail
            )));
        }

        let body = res
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let vector = self.decode_payload(&body)?;

        tracing::debug!(model = %self.model, dims = vector.len(), "embedded query text");
        Ok(vector)
    }
}
