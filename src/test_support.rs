//! Deterministic provider stand-ins for tests

use crate::chat::ChatProvider;
use crate::chunk::Chunk;
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::loader::Metadata;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn chunk(text: &str, source: &str, index: usize) -> Chunk {
    Chunk {
        text: text.to_string(),
        metadata: Metadata {
            source: PathBuf::from(source),
        },
        index,
    }
}

/// Bag-of-words embedder: each lowercase word bumps one hashed bucket
pub struct HashingEmbedder {
    dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dimension: 256 }
    }
}

impl HashingEmbedder {
    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = blake3::hash(word.to_lowercase().as_bytes());
            let bytes = hash.as_bytes();
            let bucket = u16::from_le_bytes([bytes[0], bytes[1]]) as usize % self.dimension;
            vector[bucket] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn model_name(&self) -> &str {
        "hashing-stub"
    }
}

/// Returns `[n, 1.0]` for the n-th text it has ever seen and counts calls
#[derive(Default)]
pub struct CountingEmbedder {
    calls: AtomicUsize,
    seen: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|_| vec![self.seen.fetch_add(1, Ordering::SeqCst) as f32, 1.0])
            .collect())
    }

    fn model_name(&self) -> &str {
        "counting-stub"
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Err(Error::Embedding("rate limited".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing-stub"
    }
}

pub struct SlowEmbedder;

#[async_trait]
impl Embedder for SlowEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(vec![vec![1.0]; texts.len()])
    }

    fn model_name(&self) -> &str {
        "slow-stub"
    }
}

/// A prompt as received by [`RecordingChat`]
#[derive(Debug, Clone)]
pub struct RecordedPrompt {
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
}

/// Answers with a fixed reply and records every prompt it receives
pub struct RecordingChat {
    reply: String,
    prompts: Mutex<Vec<RecordedPrompt>>,
}

impl RecordingChat {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<RecordedPrompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for RecordingChat {
    async fn complete(&self, prompt: &str, model: &str, temperature: f32) -> Result<String> {
        self.prompts.lock().unwrap().push(RecordedPrompt {
            prompt: prompt.to_string(),
            model: model.to_string(),
            temperature,
        });
        Ok(self.reply.clone())
    }
}

/// Fails every completion and counts attempts
#[derive(Default)]
pub struct FailingChat {
    attempts: AtomicUsize,
}

impl FailingChat {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatProvider for FailingChat {
    async fn complete(&self, _prompt: &str, _model: &str, _temperature: f32) -> Result<String> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::Generation("model overloaded".to_string()))
    }
}

pub struct SlowChat;

#[async_trait]
impl ChatProvider for SlowChat {
    async fn complete(&self, _prompt: &str, _model: &str, _temperature: f32) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok("too late".to_string())
    }
}
