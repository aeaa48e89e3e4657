//! Qdrant retriever over the gRPC client.
//!
//! The collection uses the LangChain payload layout: passage text under
//! `page_content`, source URL and language tag under `metadata`.

use crate::embeddings::EmbeddingProvider;
use crate::mmr;
use crate::retriever::Retriever;
use crate::types::{RetrievedChunk, ScoredCandidate};
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_output::VectorsOptions;
use qdrant_client::qdrant::{Condition, Filter, ScoredPoint, SearchPointsBuilder, Value};
use qdrant_client::Qdrant;
use scarbot_core::{AppError, AppResult, Language};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Qdrant search backend with MMR selection.
pub struct QdrantRetriever {
    client: Qdrant,
    collection: String,
    language_field: String,
    embedder: Arc<dyn EmbeddingProvider>,
    fetch_k: usize,
    lambda_mult: f32,
}

impl QdrantRetriever {
    pub fn new(
        url: &str,
        collection: impl Into<String>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        Self::connect(url, collection, embedder, None, 30)
    }

    /// Build the client; no request is sent until the first search.
    pub fn connect(
        url: &str,
        collection: impl Into<String>,
        embedder: Arc<dyn EmbeddingProvider>,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> AppResult<Self> {
        let client = Qdrant::from_url(url)
            .api_key(api_key)
            .timeout(Duration::from_secs(timeout_secs))
            .skip_compatibility_check()
            .build()
            .map_err(|e| {
                AppError::Retrieval(format!("Failed to create Qdrant client for {}: {}", url, e))
            })?;

        Ok(Self {
            client,
            collection: collection.into(),
            language_field: "metadata.language".to_string(),
            embedder,
            fetch_k: mmr::DEFAULT_FETCH_K,
            lambda_mult: mmr::DEFAULT_LAMBDA_MULT,
        })
    }

    /// Payload key the language filter matches on.
    pub fn with_language_field(mut self, field: impl Into<String>) -> Self {
        self.language_field = field.into();
        self
    }

    pub fn with_mmr(mut self, fetch_k: usize, lambda_mult: f32) -> Self {
        self.fetch_k = fetch_k;
        self.lambda_mult = lambda_mult;
        self
    }

    fn build_filter(&self, language: Option<&Language>) -> Option<Filter> {
        language.map(|lang| {
            Filter::must([Condition::matches(
                self.language_field.clone(),
                lang.code.clone(),
            )])
        })
    }
}

impl fmt::Debug for QdrantRetriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QdrantRetriever")
            .field("collection", &self.collection)
            .field("language_field", &self.language_field)
            .field("embedder", &self.embedder)
            .field("fetch_k", &self.fetch_k)
            .field("lambda_mult", &self.lambda_mult)
            .finish()
    }
}

fn as_text(value: &Value) -> Option<&str> {
    match &value.kind {
        Some(Kind::StringValue(s)) => Some(s.as_str()),
        _ => None,
    }
}

fn metadata_field(payload: &HashMap<String, Value>, name: &str) -> String {
    match payload.get("metadata").and_then(|m| m.kind.as_ref()) {
        Some(Kind::StructValue(metadata)) => metadata
            .fields
            .get(name)
            .and_then(as_text)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// Turn a scored point into a candidate; points lacking text or vector are skipped.
fn to_candidate(point: ScoredPoint) -> Option<ScoredCandidate> {
    let text = as_text(point.payload.get("page_content")?)?.to_string();
    let chunk = RetrievedChunk::new(
        text,
        metadata_field(&point.payload, "url"),
        metadata_field(&point.payload, "language"),
    );

    let embedding = match point.vectors?.vectors_options? {
        VectorsOptions::Vector(vector) => vector.data,
        VectorsOptions::Vectors(_) => return None,
    };
    if embedding.is_empty() {
        return None;
    }

    Some(ScoredCandidate { chunk, embedding })
}

#[async_trait::async_trait]
impl Retriever for QdrantRetriever {
    fn backend_name(&self) -> &str {
        "qdrant"
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        language: Option<&Language>,
    ) -> AppResult<Vec<RetrievedChunk>> {
        let query_embedding = self.embedder.embed(query).await?;
        let fetch = self.fetch_k.max(limit);

        tracing::debug!(
            "Qdrant search in '{}' (fetch_k={}, filter={:?})",
            self.collection,
            fetch,
            language.map(|l| l.code.as_str())
        );

        let mut request =
            SearchPointsBuilder::new(&self.collection, query_embedding.clone(), fetch as u64)
                .with_payload(true)
                .with_vectors(true);
        if let Some(filter) = self.build_filter(language) {
            request = request.filter(filter);
        }

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| AppError::Retrieval(format!("Qdrant search failed: {}", e)))?;

        let total = response.result.len();
        let candidates: Vec<ScoredCandidate> =
            response.result.into_iter().filter_map(to_candidate).collect();
        if candidates.len() < total {
            tracing::warn!(
                "Skipped {} Qdrant points without page_content or vector",
                total - candidates.len()
            );
        }

        Ok(mmr::select(
            &query_embedding,
            candidates,
            limit,
            self.lambda_mult,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::MockProvider;
    use qdrant_client::qdrant::{VectorOutput, VectorsOutput};
    use qdrant_client::Payload;

    fn retriever() -> QdrantRetriever {
        QdrantRetriever::new(
            "http://localhost:6334",
            "myscarspecialist",
            Arc::new(MockProvider::new(8)),
        )
        .unwrap()
    }

    fn point(payload: serde_json::Value, vector: Vec<f32>) -> ScoredPoint {
        let payload: Payload = match payload {
            serde_json::Value::Object(map) => map.into(),
            _ => Default::default(),
        };
        ScoredPoint {
            payload: payload.into(),
            score: 0.87,
            vectors: Some(VectorsOutput {
                vectors_options: Some(VectorsOptions::Vector(VectorOutput {
                    data: vector,
                    ..Default::default()
                })),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_language_filter() {
        let retriever = retriever();

        assert_eq!(
            retriever.build_filter(Some(&Language::english())),
            Some(Filter::must([Condition::matches(
                "metadata.language",
                "en".to_string()
            )]))
        );
        assert!(retriever.build_filter(None).is_none());
    }

    #[test]
    fn test_custom_language_field() {
        let retriever = retriever().with_language_field("lang");

        assert_eq!(
            retriever.build_filter(Some(&Language::dutch())),
            Some(Filter::must([Condition::matches("lang", "nl".to_string())]))
        );
    }

    #[test]
    fn test_point_to_candidate() {
        let point = point(
            serde_json::json!({
                "page_content": "Keloids grow beyond the wound edge.",
                "metadata": { "url": "https://example.com/keloid", "language": "en" }
            }),
            vec![0.1, 0.2],
        );

        let candidate = to_candidate(point).unwrap();
        assert_eq!(candidate.chunk.text, "Keloids grow beyond the wound edge.");
        assert_eq!(candidate.chunk.source_url, "https://example.com/keloid");
        assert_eq!(candidate.chunk.language, "en");
        assert_eq!(candidate.embedding, vec![0.1, 0.2]);
    }

    #[test]
    fn test_point_without_metadata_keeps_text() {
        let point = point(
            serde_json::json!({ "page_content": "Massage softens scars." }),
            vec![0.3],
        );

        let candidate = to_candidate(point).unwrap();
        assert_eq!(candidate.chunk.source_url, "");
        assert_eq!(candidate.chunk.language, "");
    }

    #[test]
    fn test_point_without_text_is_skipped() {
        let point = point(
            serde_json::json!({ "metadata": { "url": "https://example.com" } }),
            vec![0.1],
        );

        assert!(to_candidate(point).is_none());
    }

    #[test]
    fn test_point_without_vector_is_skipped() {
        let mut point = point(
            serde_json::json!({ "page_content": "Pressure garments." }),
            vec![0.1],
        );
        point.vectors = None;

        assert!(to_candidate(point).is_none());
    }
}
