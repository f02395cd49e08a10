//! rag-consultant CLI entry point

use clap::Parser;
use rag_consultant::{
    commands::{
        cmd_build, cmd_query, cmd_search, print_answer, print_build_stats, print_search_results,
        run_interactive,
    },
    config::Config,
    engine::AnswerEngine,
    error::{Error, Result},
    progress::LogWriterFactory,
};
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "rag-consultant")]
#[command(
    version,
    about = "RAG Consultant - Intelligent consultant assistant powered by RAG",
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Build knowledge base from documents
    #[arg(long, conflicts_with_all = ["query", "search"])]
    build: bool,

    /// Directory containing documents (defaults to the configured knowledge base path)
    #[arg(long)]
    directory: Option<PathBuf>,

    /// Ask a single question and exit
    #[arg(long, conflicts_with = "search")]
    query: Option<String>,

    /// Show the most relevant chunks for a question without generating an answer
    #[arg(long)]
    search: Option<String>,

    /// Number of chunks returned by --search (defaults to top_k)
    #[arg(short = 'k', long, requires = "search")]
    limit: Option<usize>,

    /// Print the sources behind each answer
    #[arg(long)]
    show_sources: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory))
        .with(filter)
        .init();

    // Settings in ./.env apply where the environment leaves them unset
    let config = match Config::resolve(cli.config.as_deref(), Some(Path::new(".env"))) {
        Ok(config) => config,
        Err(e @ Error::Config(_)) => {
            eprintln!("Error: {}", e);
            eprintln!("\nPlease set your OpenAI API key:");
            eprintln!("  export OPENAI_API_KEY='your-api-key-here'");
            eprintln!("or add it to a .env file in the working directory.");
            std::process::exit(1);
        }
        Err(e) => return Err(e),
    };

    let mut engine = AnswerEngine::from_config(&config)?;

    if cli.build {
        let directory = cli
            .directory
            .unwrap_or_else(|| config.knowledge_base_path());
        let stats = cmd_build(&config, &mut engine, &directory).await?;

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            print_build_stats(&stats, &config.vector_store_path());
        }
    } else if let Some(question) = cli.query {
        let result = cmd_query(&config, &mut engine, &question).await?;

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_answer(&result, cli.show_sources)?;
        }
    } else if let Some(query) = cli.search {
        let result = cmd_search(&config, &mut engine, &query, cli.limit).await?;

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_search_results(&result)?;
        }
    } else {
        run_interactive(&config, &mut engine, cli.show_sources).await?;
    }

    Ok(())
}
