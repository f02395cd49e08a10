//! Interactive question loop

use super::query::write_sources;
use crate::config::Config;
use crate::engine::{AnswerEngine, IndexOrigin};
use crate::error::Result;
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::warn;

const EXIT_COMMANDS: [&str; 3] = ["quit", "exit", "q"];

fn is_exit_command(input: &str) -> bool {
    EXIT_COMMANDS.iter().any(|c| input.eq_ignore_ascii_case(c))
}

/// Load (or build) the knowledge base, then answer questions from stdin
/// until an exit command, end of input, or Ctrl-C.
pub async fn run_interactive(config: &Config, engine: &mut AnswerEngine, show_sources: bool) -> Result<()> {
    println!("\n{}", "=".repeat(60));
    println!("RAG Consultant - Interactive Mode");
    println!("{}", "=".repeat(60));
    println!("Ask me anything! (Type 'quit' or 'exit' to stop)\n");

    println!("Loading knowledge base...");
    match engine
        .load_or_build(&config.vector_store_path(), &config.knowledge_base_path())
        .await?
    {
        IndexOrigin::Loaded => println!("Knowledge base loaded successfully!"),
        IndexOrigin::Built(stats) => println!(
            "Knowledge base built from {} documents ({} chunks)",
            stats.documents, stats.chunks
        ),
    }
    println!("Consultant ready!\n");

    let input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();

    tokio::select! {
        result = run_session(engine, input, &mut out, show_sources) => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\n\nGoodbye!");
            Ok(())
        }
    }
}

/// Answer each input line as a question. A failed question is reported and
/// the session continues.
pub async fn run_session<R, W>(engine: &AnswerEngine, input: R, out: &mut W, show_sources: bool) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(out, "You: ")?;
        out.flush()?;

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                writeln!(out, "\nGoodbye!")?;
                break;
            }
            // The offending line is consumed; keep reading after it
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                warn!("Unreadable input line: {}", e);
                writeln!(out, "\nError: {}\n", e)?;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let question = line.trim();
        if is_exit_command(question) {
            writeln!(out, "\nGoodbye!")?;
            break;
        }
        if question.is_empty() {
            continue;
        }

        match engine.ask(question).await {
            Ok(result) => {
                writeln!(out, "\nConsultant: {}", result.answer)?;
                if !result.sources.is_empty() {
                    writeln!(out, "\n[Based on {} source(s)]", result.sources.len())?;
                    if show_sources {
                        write_sources(&mut *out, &result.sources)?;
                    }
                }
                writeln!(out)?;
            }
            Err(e) => {
                warn!("Question failed: {}", e);
                writeln!(out, "\nError: {}\n", e)?;
            }
        }
    }

    Ok(())
}
