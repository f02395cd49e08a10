//! Chat completion and the consultant prompt

mod http_backend;

pub use http_backend::*;

use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for chat completion providers
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Complete `prompt` with `model` at `temperature`, returning the reply text
    async fn complete(&self, prompt: &str, model: &str, temperature: f32) -> Result<String>;
}

/// Create the HTTP chat provider described by configuration
pub fn create_chat_provider(config: &Config) -> Result<Arc<dyn ChatProvider>> {
    let provider = HttpChatProvider::new(config)?;
    Ok(Arc::new(provider))
}

/// Render the consultant prompt for `context` and `question`
pub fn render_prompt(context: &str, question: &str) -> String {
    format!(
        "You are an intelligent consultant assistant. Use the following pieces of context to answer the question at the end.
If you don't know the answer based on the context, just say that you don't have enough information to answer, don't try to make up an answer.
Always provide helpful, detailed, and professional responses.

Context:
{context}

Question: {question}

Answer:"
    )
}
