//! OpenAI embedding provider (`POST /embeddings`).

use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use async_trait::async_trait;
use reqwest::Client;
use scarbot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Embedding models that accept a `dimensions` parameter.
const SHORTENABLE_PREFIX: &str = "text-embedding-3";

#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    pub fn new(config: &EmbeddingConfig, api_key: &str) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                AppError::Retrieval(format!("Failed to create HTTP client for OpenAI: {}", e))
            })?;

        let base_url = config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url,
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    fn build_request<'a>(&'a self, texts: &'a [String]) -> EmbeddingRequest<'a> {
        EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self
                .model
                .starts_with(SHORTENABLE_PREFIX)
                .then_some(self.dimensions),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.build_request(texts))
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to send request to OpenAI: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Retrieval(format!(
                "OpenAI embeddings error ({}): {}",
                status, error_text
            )));
        }

        let mut body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to parse OpenAI response: {}", e)))?;

        if body.data.len() != texts.len() {
            return Err(AppError::Retrieval(format!(
                "OpenAI returned {} embeddings for {} inputs",
                body.data.len(),
                texts.len()
            )));
        }

        body.data.sort_by_key(|d| d.index);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(model: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "openai".to_string(),
            model: model.to_string(),
            dimensions: 3072,
            endpoint: Some("https://proxy.example.com/v1/".to_string()),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_request_includes_dimensions_for_v3_models() {
        let provider = OpenAiProvider::new(&config("text-embedding-3-large"), "sk-test").unwrap();
        let texts = vec!["keloid".to_string()];

        let json = serde_json::to_value(provider.build_request(&texts)).unwrap();
        assert_eq!(json["model"], "text-embedding-3-large");
        assert_eq!(json["input"][0], "keloid");
        assert_eq!(json["dimensions"], 3072);
        assert_eq!(provider.base_url, "https://proxy.example.com/v1");
    }

    #[test]
    fn test_request_omits_dimensions_for_legacy_models() {
        let provider = OpenAiProvider::new(&config("text-embedding-ada-002"), "sk-test").unwrap();
        let texts = vec!["keloid".to_string()];

        let json = serde_json::to_value(provider.build_request(&texts)).unwrap();
        assert!(json.get("dimensions").is_none());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let provider = OpenAiProvider::new(&config("text-embedding-3-large"), "sk-test").unwrap();
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }
}
