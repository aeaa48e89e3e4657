//! In-memory retriever backed by a JSON-lines chunk file.

use crate::embeddings::EmbeddingProvider;
use crate::mmr;
use crate::retriever::Retriever;
use crate::types::{ChunkRecord, RetrievedChunk, ScoredCandidate};
use scarbot_core::{AppError, AppResult, Language};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

/// Brute-force cosine search over chunks held in memory.
///
/// Intended for small knowledge bases, offline use and tests.
#[derive(Debug)]
pub struct MemoryRetriever {
    records: Vec<ChunkRecord>,
    embedder: Arc<dyn EmbeddingProvider>,
    fetch_k: usize,
    lambda_mult: f32,
}

impl MemoryRetriever {
    /// Build from records, embedding any that lack a vector.
    ///
    /// Every vector must match the embedder's dimensions.
    pub async fn from_records(
        records: Vec<ChunkRecord>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        let located = records
            .into_iter()
            .enumerate()
            .map(|(i, r)| (format!("record {}", i + 1), r))
            .collect();
        Self::from_located(located, embedder).await
    }

    /// Load chunks from a JSON-lines file (one `ChunkRecord` per line).
    pub async fn load(path: &Path, embedder: Arc<dyn EmbeddingProvider>) -> AppResult<Self> {
        let records = read_records(path)?;
        tracing::debug!("Loaded {} chunks from {:?}", records.len(), path);
        let located = records
            .into_iter()
            .map(|(line_no, r)| (format!("{:?}:{}", path, line_no), r))
            .collect();
        Self::from_located(located, embedder).await
    }

    async fn from_located(
        located: Vec<(String, ChunkRecord)>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        let dimensions = embedder.dimensions();
        let (locations, mut records): (Vec<String>, Vec<ChunkRecord>) =
            located.into_iter().unzip();

        for (location, record) in locations.iter().zip(&records) {
            if let Some(embedding) = &record.embedding {
                check_dimensions(location, embedding.len(), dimensions)?;
            }
        }

        let missing: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.embedding.is_none())
            .map(|(i, _)| i)
            .collect();

        if !missing.is_empty() {
            tracing::info!(
                "Embedding {} chunks with provider '{}'",
                missing.len(),
                embedder.provider_name()
            );
            let texts: Vec<String> = missing.iter().map(|&i| records[i].text.clone()).collect();
            let embeddings = embedder.embed_batch(&texts).await?;
            if embeddings.len() != missing.len() {
                return Err(AppError::Retrieval(format!(
                    "Embedding provider returned {} vectors for {} chunks",
                    embeddings.len(),
                    missing.len()
                )));
            }
            for (idx, embedding) in missing.into_iter().zip(embeddings) {
                check_dimensions(&locations[idx], embedding.len(), dimensions)?;
                records[idx].embedding = Some(embedding);
            }
        }

        Ok(Self {
            records,
            embedder,
            fetch_k: mmr::DEFAULT_FETCH_K,
            lambda_mult: mmr::DEFAULT_LAMBDA_MULT,
        })
    }

    pub fn with_mmr(mut self, fetch_k: usize, lambda_mult: f32) -> Self {
        self.fetch_k = fetch_k;
        self.lambda_mult = lambda_mult;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn check_dimensions(location: &str, actual: usize, expected: usize) -> AppResult<()> {
    if actual == expected {
        return Ok(());
    }
    Err(AppError::Retrieval(format!(
        "Chunk embedding at {} has {} dimensions, embedder produces {}",
        location, actual, expected
    )))
}

/// Records paired with their 1-based line numbers.
fn read_records(path: &Path) -> AppResult<Vec<(usize, ChunkRecord)>> {
    let file = File::open(path)
        .map_err(|e| AppError::Retrieval(format!("Failed to open {:?}: {}", path, e)))?;

    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let record: ChunkRecord = serde_json::from_str(&line).map_err(|e| {
            AppError::Retrieval(format!(
                "Invalid chunk record at {:?}:{}: {}",
                path, line_no, e
            ))
        })?;
        records.push((line_no, record));
    }

    Ok(records)
}

#[async_trait::async_trait]
impl Retriever for MemoryRetriever {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        language: Option<&Language>,
    ) -> AppResult<Vec<RetrievedChunk>> {
        let query_embedding = self.embedder.embed(query).await?;

        let mut scored: Vec<(f32, ScoredCandidate)> = self
            .records
            .iter()
            .filter(|r| language.map_or(true, |l| r.language.eq_ignore_ascii_case(&l.code)))
            .filter_map(|r| {
                let embedding = r.embedding.clone()?;
                let score = mmr::cosine_similarity(&query_embedding, &embedding);
                Some((
                    score,
                    ScoredCandidate {
                        chunk: RetrievedChunk::from(r),
                        embedding,
                    },
                ))
            })
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(self.fetch_k.max(limit));

        let candidates = scored.into_iter().map(|(_, c)| c).collect();
        Ok(mmr::select(
            &query_embedding,
            candidates,
            limit,
            self.lambda_mult,
        ))
    }
}
