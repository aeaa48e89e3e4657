//! Embedding provider configuration.

use scarbot_core::config::RetrievalConfig;
use serde::{Deserialize, Serialize};

/// Settings needed to construct an embedding provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name ("openai", "ollama", "mock")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Optional API base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
            timeout_secs: 30,
        }
    }
}

impl From<&RetrievalConfig> for EmbeddingConfig {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            provider: config.embedding_provider.clone(),
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions,
            endpoint: config.embedding_endpoint.clone(),
            timeout_secs: config.timeout,
        }
    }
}
