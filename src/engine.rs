//! Answer engine
//!
//! Owns the active [`VectorIndex`] and the two providers. Answering a
//! question embeds it, retrieves the top-K chunks, renders the consultant
//! prompt and asks the chat provider once.

use crate::chat::{create_chat_provider, render_prompt, ChatProvider};
use crate::chunk::split_documents;
use crate::config::Config;
use crate::embed::{create_embedder, Embedder};
use crate::error::{Error, Result};
use crate::index::{EmbedSettings, RetrievedChunk, VectorIndex};
use crate::loader::{load_documents, Document, LoadFailure};
use crate::timeout::with_timeout;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Answers are always requested deterministically
const ANSWER_TEMPERATURE: f32 = 0.0;

/// Engine settings derived from [`Config`]
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub min_score: Option<f32>,
    pub chat_model: String,
    pub batch_size: usize,
    pub timeout: Duration,
    pub extensions: Vec<String>,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_size: config.chunk.size,
            chunk_overlap: config.chunk.overlap,
            top_k: config.query.top_k,
            min_score: config.query.min_score,
            chat_model: config.chat.model.clone(),
            batch_size: config.embedding.batch_size,
            timeout: config.request_timeout(),
            extensions: config.loader.extensions.clone(),
        }
    }

    fn embed_settings(&self) -> EmbedSettings {
        EmbedSettings {
            batch_size: self.batch_size,
            timeout: self.timeout,
        }
    }
}

/// Answer to one question
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub question: String,
    pub answer: String,
    pub sources: Vec<RetrievedChunk>,
}

/// Statistics from an index build
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildStats {
    pub documents: usize,
    pub chunks: usize,
    pub failures: Vec<LoadFailure>,
}

/// How [`AnswerEngine::load_or_build`] obtained its index
#[derive(Debug, Clone)]
pub enum IndexOrigin {
    Loaded,
    Built(BuildStats),
}

pub struct AnswerEngine {
    embedder: Arc<dyn Embedder>,
    chat: Arc<dyn ChatProvider>,
    settings: EngineSettings,
    index: Option<VectorIndex>,
}

impl AnswerEngine {
    pub fn new(config: &Config, embedder: Arc<dyn Embedder>, chat: Arc<dyn ChatProvider>) -> Self {
        Self {
            embedder,
            chat,
            settings: EngineSettings::from_config(config),
            index: None,
        }
    }

    /// Engine wired to the HTTP providers named in configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = create_embedder(config)?;
        let chat = create_chat_provider(config)?;
        Ok(Self::new(config, embedder, chat))
    }

    pub fn is_ready(&self) -> bool {
        self.index.is_some()
    }

    pub fn index(&self) -> Option<&VectorIndex> {
        self.index.as_ref()
    }

    pub fn set_index(&mut self, index: VectorIndex) {
        self.index = Some(index);
    }

    /// Load, chunk and embed every document under `dir`, replacing the current index
    pub async fn build_from_directory(&mut self, dir: &Path) -> Result<BuildStats> {
        let report = load_documents(dir, &self.settings.extensions)?;
        let chunks = self.build_from_documents(&report.documents).await?;
        Ok(BuildStats {
            documents: report.documents.len(),
            chunks,
            failures: report.failures,
        })
    }

    /// Chunk and embed `documents`, replacing the current index. Returns the chunk count.
    pub async fn build_from_documents(&mut self, documents: &[Document]) -> Result<usize> {
        let chunks = split_documents(
            documents,
            self.settings.chunk_size,
            self.settings.chunk_overlap,
        )?;
        let count = chunks.len();
        info!("Split {} documents into {} chunks", documents.len(), count);

        let index = VectorIndex::build(
            chunks,
            self.embedder.as_ref(),
            self.settings.embed_settings(),
        )
        .await?;
        self.index = Some(index);
        Ok(count)
    }

    /// Replace the current index with the one persisted at `path`
    pub fn load_index(&mut self, path: &Path) -> Result<()> {
        let index = VectorIndex::load(path)?;
        if !index.is_empty() && index.embedding_model() != self.embedder.model_name() {
            warn!(
                "Index was built with '{}' but the configured embedding model is '{}'",
                index.embedding_model(),
                self.embedder.model_name()
            );
        }
        self.index = Some(index);
        Ok(())
    }

    pub fn save_index(&self, path: &Path) -> Result<()> {
        self.index.as_ref().ok_or(Error::NotInitialized)?.save(path)
    }

    /// Load the index at `store_path`, or build it from `knowledge_base` and
    /// save it there when none exists yet.
    pub async fn load_or_build(&mut self, store_path: &Path, knowledge_base: &Path) -> Result<IndexOrigin> {
        match self.load_index(store_path) {
            Ok(()) => Ok(IndexOrigin::Loaded),
            Err(Error::NotFound(_)) => {
                info!(
                    "No index at {}; building from {}",
                    store_path.display(),
                    knowledge_base.display()
                );
                let stats = self.build_from_directory(knowledge_base).await?;
                self.save_index(store_path)?;
                Ok(IndexOrigin::Built(stats))
            }
            Err(e) => Err(e),
        }
    }

    /// Retrieve the chunks most relevant to `question` without generating an answer
    pub async fn search(&self, question: &str, k: Option<usize>) -> Result<Vec<RetrievedChunk>> {
        let index = self.index.as_ref().ok_or(Error::NotInitialized)?;
        let k = k.unwrap_or(self.settings.top_k);

        let mut results = index
            .query(self.embedder.as_ref(), question, k, self.settings.timeout)
            .await?;
        if let Some(min) = self.settings.min_score {
            results.retain(|r| r.score >= min);
        }
        debug!("Retrieved {} chunks", results.len());
        Ok(results)
    }

    /// Answer `question` from the retrieved context
    pub async fn ask(&self, question: &str) -> Result<QueryResult> {
        let sources = self.search(question, None).await?;

        let context = sources
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = render_prompt(&context, question);

        let answer = with_timeout(
            self.settings.timeout,
            "chat completion",
            self.chat.complete(&prompt, &self.settings.chat_model, ANSWER_TEMPERATURE),
        )
        .await
        .map_err(|e| match e {
            Error::Generation(_) | Error::Timeout { .. } => e,
            other => Error::Generation(other.to_string()),
        })?;

        Ok(QueryResult {
            question: question.to_string(),
            answer,
            sources,
        })
    }
}
