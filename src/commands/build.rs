//! Build command implementation

use crate::config::Config;
use crate::engine::{AnswerEngine, BuildStats};
use crate::error::Result;
use std::path::Path;
use tracing::info;

/// Rebuild the index from `directory` and save it to the configured vector store
pub async fn cmd_build(config: &Config, engine: &mut AnswerEngine, directory: &Path) -> Result<BuildStats> {
    info!("Building knowledge base from {}", directory.display());
    let stats = engine.build_from_directory(directory).await?;

    let store_path = config.vector_store_path();
    engine.save_index(&store_path)?;
    info!("Knowledge base saved to {}", store_path.display());

    Ok(stats)
}

/// Print build statistics to console
pub fn print_build_stats(stats: &BuildStats, store_path: &Path) {
    for failure in &stats.failures {
        println!("⚠ Skipped {}: {}", failure.path.display(), failure.reason);
    }

    println!("\n✓ Knowledge base built successfully");
    println!("  Documents loaded: {}", stats.documents);
    println!("  Chunks indexed: {}", stats.chunks);
    if !stats.failures.is_empty() {
        println!("  Files skipped: {}", stats.failures.len());
    }
    println!("  Saved to: {}", store_path.display());
}
