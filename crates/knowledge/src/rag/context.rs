//! Context Assembler.
//!
//! Retrieves passages for a query and serializes them into the delimited
//! block that is injected into the model log as a system message.

use crate::retriever::Retriever;
use crate::types::RetrievedChunk;
use scarbot_core::{AppError, AppResult, Language};
use std::sync::Arc;

const DELIMITER: &str = "###";
const SOURCE_PREFIX: &str = " This info was retrieved from: ";

/// Outcome of one assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContext {
    /// Serialized context block; empty when nothing was found
    pub block: String,

    /// Number of passages in the block
    pub chunk_count: usize,

    /// Whether the language filter had to be dropped
    pub widened: bool,
}

/// Serialize chunks, in order, into a context block.
///
/// Each chunk becomes `###\n<text>\n This info was retrieved from: <url>\n###\n`.
pub fn serialize_chunks(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            format!(
                "{DELIMITER}\n{}\n{SOURCE_PREFIX}{}\n{DELIMITER}\n",
                chunk.text, chunk.source_url
            )
        })
        .collect()
}

/// Builds context blocks from a shared retriever.
#[derive(Clone)]
pub struct ContextAssembler {
    retriever: Arc<dyn Retriever>,
}

impl ContextAssembler {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self { retriever }
    }

    /// Assemble a context block for `query`.
    pub async fn assemble(
        &self,
        query: &str,
        language: Option<&Language>,
        chunk_budget: usize,
    ) -> AppResult<String> {
        Ok(self.assemble_detailed(query, language, chunk_budget).await?.block)
    }

    /// Assemble a context block, reporting how it was obtained.
    ///
    /// A filtered search that comes back empty is retried once without the
    /// language filter. No results is not an error; the block is then empty.
    pub async fn assemble_detailed(
        &self,
        query: &str,
        language: Option<&Language>,
        chunk_budget: usize,
    ) -> AppResult<AssembledContext> {
        if chunk_budget == 0 {
            return Err(AppError::Config(
                "Chunk budget must be at least 1".to_string(),
            ));
        }

        let mut chunks = self.retriever.search(query, chunk_budget, language).await?;
        let mut widened = false;

        if chunks.is_empty() {
            if let Some(lang) = language {
                tracing::warn!(
                    "No {} passages found for query, retrying without language filter",
                    lang.tag()
                );
                chunks = self.retriever.search(query, chunk_budget, None).await?;
                widened = true;
            }
        }

        tracing::debug!(
            "Assembled context from {} passages via {} (widened: {})",
            chunks.len(),
            self.retriever.backend_name(),
            widened
        );

        Ok(AssembledContext {
            block: serialize_chunks(&chunks),
            chunk_count: chunks.len(),
            widened,
        })
    }
}

impl std::fmt::Debug for ContextAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextAssembler")
            .field("retriever", &self.retriever.backend_name())
            .finish()
    }
}
