//! In-memory vector index
//!
//! Holds one embedding per chunk and answers exact nearest-neighbour queries
//! by cosine similarity. An index is built once from a batch of chunks and
//! never edited afterwards; see [`store`] for the on-disk format.

mod store;

pub use store::*;

use crate::chunk::Chunk;
use crate::embed::{embed_in_batches, embed_query, Embedder};
use crate::error::{Error, Result};
use crate::progress::embedding_progress;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Settings for provider calls made by the index
#[derive(Debug, Clone, Copy)]
pub struct EmbedSettings {
    pub batch_size: usize,
    pub timeout: Duration,
}

/// A chunk returned by a query, with its cosine similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct IndexEntry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Immutable collection of embedded chunks
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    embedding_model: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Embed every chunk and build an index. No partial index is produced on failure.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
        settings: EmbedSettings,
    ) -> Result<Self> {
        let model = embedder.model_name().to_string();
        if chunks.is_empty() {
            info!("Building empty index (no chunks)");
            return Ok(Self::from_parts(model, 0, Vec::new(), Vec::new()));
        }

        info!("Embedding {} chunks with {}", chunks.len(), model);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let progress = embedding_progress(texts.len() as u64);
        let embeddings = embed_in_batches(
            embedder,
            texts,
            settings.batch_size,
            settings.timeout,
            Some(&progress),
        )
        .await;
        progress.finish_and_clear();
        let embeddings = embeddings?;

        let dimension = embeddings.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            return Err(Error::Embedding(
                "Provider returned empty embedding vectors".to_string(),
            ));
        }
        if let Some(bad) = embeddings.iter().find(|v| v.len() != dimension) {
            return Err(Error::Embedding(format!(
                "Inconsistent embedding dimensions: expected {}, got {}",
                dimension,
                bad.len()
            )));
        }

        debug!("Built index with dimension {}", dimension);
        Ok(Self::from_parts(model, dimension, chunks, embeddings))
    }

    fn from_parts(
        embedding_model: String,
        dimension: usize,
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Self {
        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();
        Self {
            embedding_model,
            dimension,
            entries,
        }
    }

    /// Return the `k` chunks most similar to `text`, best first.
    ///
    /// Ties keep insertion order. Fewer than `k` chunks are returned when the
    /// index is smaller than `k`.
    pub async fn query(
        &self,
        embedder: &dyn Embedder,
        text: &str,
        k: usize,
        timeout: Duration,
    ) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".to_string()));
        }
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = embed_query(embedder, text, timeout).await?;
        self.nearest(&query_vector, k)
    }

    /// Rank stored chunks against an already-embedded query
    pub fn nearest(&self, query_vector: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        if query_vector.len() != self.dimension && !self.entries.is_empty() {
            return Err(Error::Embedding(format!(
                "Query embedding has dimension {}, index expects {}",
                query_vector.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query_vector, &entry.embedding)))
            .collect();

        // Stable sort: equal scores stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| RetrievedChunk {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }
}

/// Cosine similarity; zero when either vector has zero length or holds NaN
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if score.is_nan() {
        0.0
    } else {
        score
    }
}
