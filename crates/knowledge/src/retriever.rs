//! Retrieval capability.

use crate::types::RetrievedChunk;
use scarbot_core::{AppResult, Language};

/// Trait for knowledge base search backends.
///
/// Implementations must:
/// - return at most `limit` chunks, ordered by their own relevance policy
/// - apply `language` as an equality filter on the stored language tag
/// - return an empty list, not an error, when nothing matches
/// - report backend or transport faults as `AppError::Retrieval`
///
/// Retrievers hold no per-conversation state and may be shared between
/// sessions.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Backend name for logging (e.g. "qdrant", "memory").
    fn backend_name(&self) -> &str;

    /// Search for passages relevant to `query`.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        language: Option<&Language>,
    ) -> AppResult<Vec<RetrievedChunk>>;
}
