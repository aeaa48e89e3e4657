//! Retriever construction from configuration.

use crate::embeddings::{create_provider, EmbeddingConfig};
use crate::memory::MemoryRetriever;
use crate::qdrant::QdrantRetriever;
use crate::retriever::Retriever;
use scarbot_core::config::{RetrievalBackend, RetrievalConfig};
use scarbot_core::{AppError, AppResult};
use std::sync::Arc;

/// Environment variable holding an optional Qdrant API key.
pub const QDRANT_API_KEY_ENV: &str = "QDRANT_API_KEY";

/// Create the configured retriever.
///
/// `embedding_api_key` is required only by the OpenAI embedding provider.
pub async fn create_retriever(
    config: &RetrievalConfig,
    embedding_api_key: Option<&str>,
) -> AppResult<Arc<dyn Retriever>> {
    let embedder = create_provider(&EmbeddingConfig::from(config), embedding_api_key)?;

    tracing::debug!(
        "Creating {:?} retriever (embeddings: {}/{})",
        config.backend,
        embedder.provider_name(),
        embedder.model_name()
    );

    match config.backend {
        RetrievalBackend::Qdrant => {
            let retriever = QdrantRetriever::connect(
                &config.url,
                &config.collection,
                embedder,
                std::env::var(QDRANT_API_KEY_ENV).ok(),
                config.timeout,
            )?
            .with_language_field(&config.language_field)
            .with_mmr(config.fetch_k, config.lambda_mult);
            Ok(Arc::new(retriever))
        }
        RetrievalBackend::Memory => {
            let path = config.path.as_ref().ok_or_else(|| {
                AppError::Config("Memory retrieval backend requires 'path'".to_string())
            })?;
            let retriever = MemoryRetriever::load(path, embedder)
                .await?
                .with_mmr(config.fetch_k, config.lambda_mult);
            Ok(Arc::new(retriever))
        }
    }
}
