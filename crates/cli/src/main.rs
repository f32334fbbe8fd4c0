//! Colloquy CLI entry point.
//!
//! Commands:
//! - `onboard`: write a default config file
//! - `chat`:    interactive conversation with streamed replies
//! - `ask`:     one-shot question

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "colloquy",
    about = "Colloquy, a token-bounded conversational assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Onboard,

    /// Interactive conversation
    Chat {
        /// Text files to index for per-turn retrieval
        #[arg(long = "ingest", value_name = "FILE")]
        ingest: Vec<PathBuf>,

        /// Text file included in every turn's instructions
        #[arg(long, value_name = "FILE")]
        reference: Option<PathBuf>,
    },

    /// Ask a single question and exit
    Ask {
        /// The question
        question: String,

        /// Text files to index for retrieval
        #[arg(long = "ingest", value_name = "FILE")]
        ingest: Vec<PathBuf>,

        /// Text file included in the instructions
        #[arg(long, value_name = "FILE")]
        reference: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run()?,
        Commands::Chat { ingest, reference } => commands::chat::run(ingest, reference).await?,
        Commands::Ask {
            question,
            ingest,
            reference,
        } => commands::ask::run(&question, ingest, reference).await?,
    }

    Ok(())
}
