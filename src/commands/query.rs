//! Single-question and retrieval-only commands

use crate::config::Config;
use crate::engine::{AnswerEngine, QueryResult};
use crate::error::Result;
use crate::index::RetrievedChunk;
use serde::Serialize;
use std::io::{self, Write};
use tracing::info;

/// Retrieval-only result for CLI display
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub query: String,
    pub results: Vec<RetrievedChunk>,
}

/// Load the persisted index and answer one question
pub async fn cmd_query(config: &Config, engine: &mut AnswerEngine, question: &str) -> Result<QueryResult> {
    engine.load_index(&config.vector_store_path())?;
    info!("Answering: {}", question);
    engine.ask(question).await
}

/// Load the persisted index and return the closest chunks without generating an answer
pub async fn cmd_search(
    config: &Config,
    engine: &mut AnswerEngine,
    query: &str,
    k: Option<usize>,
) -> Result<SearchResult> {
    engine.load_index(&config.vector_store_path())?;
    info!("Searching: {}", query);
    let results = engine.search(query, k).await?;
    Ok(SearchResult {
        query: query.to_string(),
        results,
    })
}

/// Write the retrieved sources, one per line with a short preview
pub fn write_sources<W: Write>(out: &mut W, sources: &[RetrievedChunk]) -> io::Result<()> {
    for (i, r) in sources.iter().enumerate() {
        writeln!(
            out,
            "{}. [score: {:.3}] {} (chunk {})",
            i + 1,
            r.score,
            r.chunk.metadata.source.display(),
            r.chunk.index
        )?;

        let preview: String = r.chunk.text.chars().take(200).collect();
        let preview = preview.trim().replace('\n', " ");
        if r.chunk.text.chars().count() > 200 {
            writeln!(out, "   {}...", preview)?;
        } else {
            writeln!(out, "   {}", preview)?;
        }
    }
    Ok(())
}

/// Print an answer to console
pub fn print_answer(result: &QueryResult, show_sources: bool) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", result.answer)?;
    if show_sources && !result.sources.is_empty() {
        writeln!(out, "\nSources:")?;
        write_sources(&mut out, &result.sources)?;
    }
    Ok(())
}

/// Print search results to console
pub fn print_search_results(result: &SearchResult) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "\n🔍 Query: {}\n", result.query)?;
    writeln!(out, "Found {} results:\n", result.results.len())?;
    write_sources(&mut out, &result.results)
}
