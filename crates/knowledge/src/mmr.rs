//! Maximal marginal relevance selection.
//!
//! Picks passages that are relevant to the query yet not redundant with the
//! passages already picked.

use crate::types::{RetrievedChunk, ScoredCandidate};

/// Default number of candidates fetched before selection.
pub const DEFAULT_FETCH_K: usize = 20;

/// Default relevance/diversity trade-off.
pub const DEFAULT_LAMBDA_MULT: f32 = 0.5;

/// Cosine similarity of two vectors; 0.0 when either is zero or lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Greedily select up to `k` candidates by maximal marginal relevance.
///
/// Each step picks the candidate maximising
/// `lambda_mult * sim(query, c) - (1 - lambda_mult) * max(sim(c, selected))`.
/// The first pick is always the most relevant candidate. Ties keep the
/// earlier candidate, so `lambda_mult = 1.0` reproduces plain relevance order.
pub fn select(
    query_embedding: &[f32],
    candidates: Vec<ScoredCandidate>,
    k: usize,
    lambda_mult: f32,
) -> Vec<RetrievedChunk> {
    if k == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let relevance: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(query_embedding, &c.embedding))
        .collect();

    let mut selected: Vec<usize> = Vec::with_capacity(k.min(candidates.len()));
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();

    while selected.len() < k && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (pos, &idx) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|&s| cosine_similarity(&candidates[idx].embedding, &candidates[s].embedding))
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if selected.is_empty() { 0.0 } else { redundancy };

            let score = lambda_mult * relevance[idx] - (1.0 - lambda_mult) * redundancy;
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }

        selected.push(remaining.remove(best_pos));
    }

    let mut slots: Vec<Option<ScoredCandidate>> = candidates.into_iter().map(Some).collect();
    selected
        .into_iter()
        .filter_map(|idx| slots[idx].take().map(|c| c.chunk))
        .collect()
}
