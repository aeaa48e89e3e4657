//! Knowledge retrieval type definitions.

use serde::{Deserialize, Serialize};

/// A passage returned by the retrieval capability.
///
/// Chunks are ephemeral: they are serialized into a context block and then
/// dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Passage content
    pub text: String,

    /// Page the passage was taken from
    pub source_url: String,

    /// Language tag stored with the passage (e.g. "nl", "en")
    pub language: String,
}

impl RetrievedChunk {
    pub fn new(
        text: impl Into<String>,
        source_url: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_url: source_url.into(),
            language: language.into(),
        }
    }
}

/// A stored passage for the in-memory index (one JSON object per line).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub text: String,

    pub url: String,

    pub language: String,

    /// Precomputed embedding; computed at load time when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl From<&ChunkRecord> for RetrievedChunk {
    fn from(record: &ChunkRecord) -> Self {
        Self::new(&record.text, &record.url, &record.language)
    }
}

/// A candidate passage with its embedding, prior to MMR selection.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub chunk: RetrievedChunk,
    pub embedding: Vec<f32>,
}
