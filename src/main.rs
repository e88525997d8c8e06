//! # Context Cascade CLI (`cascade`)
//!
//! Inspect a corpus and resolve query contexts from the command line.
//!
//! ## Usage
//!
//! ```bash
//! cascade --config ./config/cascade.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cascade docs` | List the documents of the corpus |
//! | `cascade resolve "<query>"` | Print the context resolved for a query |
//! | `cascade search "<query>"` | Nearest indexed chunks by embedding similarity |
//! | `cascade count <term>` | Count a term across the corpus |
//! | `cascade analyze <name>` | Print the structured analysis of one document |
//! | `cascade prompt "<query>"` | Print the assembled system prompt |
//!
//! Logs go to stderr and are filtered by `RUST_LOG` (default `warn`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use context_cascade::docs::run_docs;
use context_cascade::query::{run_analyze, run_count, run_prompt, run_resolve, run_search};
use context_cascade::{config, ContextEngine};

/// Context Cascade: resolve the best context for a query over a local
/// corpus of transcripts and notes.
#[derive(Parser)]
#[command(
    name = "cascade",
    about = "Context Cascade: query-driven context resolution over a local document corpus",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/cascade.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every document the engine can see.
    Docs,

    /// Resolve the context for a query.
    ///
    /// Prints the context text on stdout and the strategy that produced
    /// it on stderr.
    Resolve {
        /// The natural-language query.
        query: String,

        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Semantic similarity search over the chunk index.
    ///
    /// Requires an enabled `[embedding]` provider.
    Search {
        /// The natural-language query.
        query: String,

        /// Print the matches as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Count case-insensitive occurrences of a term.
    Count {
        /// Term or phrase to count.
        term: String,

        /// Only documents whose name contains this text.
        #[arg(long)]
        document: Option<String>,

        /// Only the transcript of this episode number.
        #[arg(long)]
        episode: Option<u32>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the analysis of a single document as JSON.
    Analyze {
        /// Document name (exact or partial).
        #[arg(default_value = "")]
        name: String,

        /// Episode number, used when the name is empty or matches nothing.
        #[arg(long)]
        episode: Option<u32>,
    },

    /// Print the system prompt a chat model would receive for a query.
    Prompt {
        /// The natural-language query.
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let engine = ContextEngine::from_config(&cfg).await?;

    match cli.command {
        Commands::Docs => {
            run_docs(&engine).await?;
        }
        Commands::Resolve { query, json } => {
            run_resolve(&engine, &query, json).await?;
        }
        Commands::Search { query, json } => {
            run_search(&engine, &query, json).await?;
        }
        Commands::Count {
            term,
            document,
            episode,
            json,
        } => {
            run_count(&engine, &term, document.as_deref(), episode, json).await?;
        }
        Commands::Analyze { name, episode } => {
            run_analyze(&engine, &name, episode).await?;
        }
        Commands::Prompt { query } => {
            run_prompt(&engine, &cfg, &query).await?;
        }
    }

    Ok(())
}
