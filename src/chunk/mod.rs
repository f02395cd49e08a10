//! Text chunking with overlap
//!
//! Documents are split into chunks of at most `max_size` characters. Each
//! chunk after the first starts `overlap` characters before the end of its
//! predecessor, so neighbouring chunks share exactly `overlap` characters.
//!
//! Boundary rule: a chunk that has to be cut ends inside the window
//! `(start + max(overlap, max_size / 2), start + max_size]`, at the latest
//! blank line if there is one, otherwise at the latest whitespace character,
//! otherwise exactly at `start + max_size`. The break character is kept at
//! the end of the chunk.

mod boundaries;

pub use boundaries::*;

use crate::error::{Error, Result};
use crate::loader::{Document, Metadata};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A chunk of a source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: Metadata,
    /// Position of this chunk within its document (0-based)
    pub index: usize,
}

/// Split every document into overlapping chunks.
pub fn split_documents(documents: &[Document], max_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    validate_params(max_size, overlap)?;

    let mut chunks = Vec::new();
    for doc in documents {
        let before = chunks.len();
        chunks.extend(
            split_text(&doc.text, max_size, overlap)
                .into_iter()
                .enumerate()
                .map(|(index, text)| Chunk {
                    text,
                    metadata: doc.metadata.clone(),
                    index,
                }),
        );
        debug!(
            "Split {} into {} chunks",
            doc.metadata.source.display(),
            chunks.len() - before
        );
    }

    Ok(chunks)
}

fn validate_params(max_size: usize, overlap: usize) -> Result<()> {
    if max_size == 0 {
        return Err(Error::InvalidArgument(
            "chunk size must be greater than zero".to_string(),
        ));
    }
    if overlap >= max_size {
        return Err(Error::InvalidArgument(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, max_size
        )));
    }
    Ok(())
}

/// Split a single text. Callers must have validated the parameters.
fn split_text(text: &str, max_size: usize, overlap: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut pieces = Vec::new();
    let mut start = 0;

    loop {
        if total - start <= max_size {
            pieces.push(chars[start..].iter().collect());
            break;
        }

        let hard_end = start + max_size;
        let min_end = start + overlap.max(max_size / 2) + 1;
        let end = best_break(&chars, start, min_end, hard_end)
            .map(|bp| bp.position)
            .unwrap_or(hard_end);

        pieces.push(chars[start..end].iter().collect());
        start = end - overlap;
    }

    pieces
}
