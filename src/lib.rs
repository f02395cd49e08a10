//! rag-consultant: a retrieval-augmented consultant assistant
//!
//! Loads plain-text documents, chunks and embeds them into a persisted
//! vector index, and answers questions by prompting a chat model with the
//! most relevant chunks.

pub mod chat;
pub mod chunk;
pub mod commands;
pub mod config;
pub mod embed;
pub mod engine;
pub mod error;
pub mod index;
pub mod loader;
pub mod openai_backend;
pub mod progress;
pub mod timeout;

#[cfg(test)]
pub(crate) mod test_support;
