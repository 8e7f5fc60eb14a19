//! # Lore CLI
//!
//! Answers travel-policy questions from the Swiss FAQ corpus.
//!
//! ## Usage
//!
//! ```bash
//! # Rank corpus sections against a question
//! lore query "Can I bring my cat?" -k 3
//!
//! # Print the context the policy lookup tool would hand to a model
//! lore lookup "Can I bring my cat?"
//!
//! # Retrieve context and ask a chat model, retrying failed attempts
//! lore ask "Can I bring my cat?" --model gpt-4o-mini --max-attempts 3
//! ```

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Parser)]
#[command(name = "lore")]
#[command(about = "Retrieval-backed answers to travel policy questions", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the downloaded corpus and the vector cache
    #[arg(long, global = true, env = "LORE_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Corpus location to download when no local copy exists
    #[arg(long, global = true, env = "LORE_CORPUS_URL", value_name = "URL")]
    corpus_url: Option<String>,

    /// Embedding model used for documents and queries
    #[arg(
        long,
        global = true,
        env = "LORE_EMBEDDING_MODEL",
        default_value = lore_embeddings::DEFAULT_MODEL
    )]
    embedding_model: String,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank corpus sections by similarity to a question
    Query {
        #[arg(value_name = "TEXT")]
        text: String,
        /// Number of hits (defaults to the configured default_k)
        #[arg(long, short = 'k')]
        k: Option<usize>,
    },
    /// Print the joined context the policy lookup tool returns
    Lookup {
        #[arg(value_name = "TEXT")]
        text: String,
    },
    /// Retrieve context and ask a chat model
    Ask {
        #[arg(value_name = "QUESTION")]
        question: String,
        /// Chat model; `gpt*` goes to OpenAI, `llama*` to a local Ollama
        #[arg(long, short = 'm', env = "LORE_MODEL", default_value = "gpt-4o-mini")]
        model: String,
        /// Override the chat endpoint
        #[arg(long, env = "LORE_CHAT_URL", value_name = "URL")]
        base_url: Option<String>,
        /// Attempts before giving up
        #[arg(long, default_value = "5")]
        max_attempts: u32,
        /// Session id attached to every trace span
        #[arg(long, default_value = "session")]
        session: String,
        /// Require the answer to be a JSON object and retry until it is
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let service = commands::build_service(
        cli.data_dir,
        cli.corpus_url,
        &cli.embedding_model,
    );

    match cli.command {
        Commands::Query { text, k } => commands::query(&service, &text, k).await,
        Commands::Lookup { text } => commands::lookup(&service, &text).await,
        Commands::Ask {
            question,
            model,
            base_url,
            max_attempts,
            session,
            json,
        } => {
            let args = commands::AskArgs {
                model,
                base_url,
                max_attempts,
                session,
                json,
            };
            commands::ask(&service, &question, &args).await
        }
    }
}
