//! Embedding generation
//!
//! This module provides an abstraction over embedding providers with:
//! - A trait implemented by the HTTP backend and by test stand-ins
//! - Batch processing for index builds
//! - Per-call deadlines

mod http_backend;

pub use http_backend::*;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::timeout::with_timeout;
use async_trait::async_trait;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in input order
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create the HTTP embedder described by configuration
pub fn create_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let embedder = HttpEmbedder::new(config)?;
    Ok(Arc::new(embedder))
}

/// Embed `texts` in batches of `batch_size`, each batch under `timeout`.
///
/// Fails if any batch fails or returns the wrong number of vectors.
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: Vec<String>,
    batch_size: usize,
    timeout: Duration,
    progress: Option<&ProgressBar>,
) -> Result<Vec<Vec<f32>>> {
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(batch_size.max(1)) {
        let batch_texts: Vec<String> = chunk.to_vec();
        let embeddings = with_timeout(timeout, "embedding request", embedder.embed(batch_texts)).await?;
        if embeddings.len() != chunk.len() {
            return Err(Error::Embedding(format!(
                "Provider returned {} embeddings for {} texts",
                embeddings.len(),
                chunk.len()
            )));
        }
        all_embeddings.extend(embeddings);
        if let Some(pb) = progress {
            pb.inc(chunk.len() as u64);
        }
    }

    Ok(all_embeddings)
}

/// Embed a single query text
pub async fn embed_query(embedder: &dyn Embedder, text: &str, timeout: Duration) -> Result<Vec<f32>> {
    let embeddings = with_timeout(
        timeout,
        "query embedding",
        embedder.embed(vec![text.to_string()]),
    )
    .await?;
    embeddings
        .into_iter()
        .next()
        .ok_or_else(|| Error::Embedding("No embedding returned".to_string()))
}
