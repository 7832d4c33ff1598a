//! # Lorebook CLI (`lore`)
//!
//! The `lore` binary is the primary interface for Lorebook. It provides
//! commands for chunking markdown rulebooks, inspecting the resulting
//! section tree, searching the keyword index, and benchmarking retrieval
//! strategies against a ground-truth question set.
//!
//! ## Usage
//!
//! ```bash
//! lore --config ./config/lore.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lore chunk <path>` | Parse a markdown file or directory into the section index |
//! | `lore outline <path>` | Print a file's header hierarchy |
//! | `lore search "<query>"` | Keyword search over the stored index |
//! | `lore get <id>...` | Print full section records by ID |
//! | `lore eval` | Run the retrieval evaluation sweep and persist the run |
//! | `lore compare <run.json>...` | Compare persisted evaluation runs |

mod chunker;
mod config;
mod embedding;
mod eval;
mod get;
mod headers;
mod ingest;
mod keywords;
mod metrics;
mod models;
mod outline;
mod retriever;
mod search;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lorebook CLI — chunk markdown rulebooks and benchmark retrieval over
/// them.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/lore.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "lore",
    about = "Lorebook — markdown rulebook chunking and retrieval evaluation",
    version,
    long_about = "Lorebook parses markdown rulebooks into a hierarchical section tree with a \
    keyword index, and benchmarks keyword, embedding, and hybrid retrieval strategies against \
    a ground-truth question set using MRR and Recall@k."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lore.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Parse markdown into the section index.
    ///
    /// Accepts a single `.md` file or a directory (walked recursively,
    /// sorted path order). Writes the combined rulebook JSON to the
    /// configured index path.
    Chunk {
        /// Markdown file or directory to parse.
        path: PathBuf,

        /// Show section and index counts without writing the index.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print a markdown file's header hierarchy.
    ///
    /// Headings are indented by resolved nesting depth with their full
    /// path, so you can preview how a document will chunk.
    Outline {
        /// Markdown file to inspect.
        path: PathBuf,
    },

    /// Keyword search over the stored index.
    ///
    /// Scores every index entry by keyword overlap with the query and
    /// prints a ranked listing.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print full section records by ID.
    Get {
        /// Section IDs (8-hex hashes or explicit anchors).
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Run the retrieval evaluation sweep.
    ///
    /// Builds every configured retriever, runs each over the ground-truth
    /// questions, prints a comparison table and failure analysis, and
    /// persists the run as JSON.
    Eval {
        /// Ground-truth questions file (overrides `evaluation.questions`).
        #[arg(long)]
        questions: Option<PathBuf>,

        /// Retrieval depth (overrides `evaluation.top_k`).
        #[arg(long)]
        top_k: Option<usize>,

        /// Failure-analysis threshold: report questions with recall@5
        /// below this value (overrides `evaluation.failure_threshold`).
        #[arg(long)]
        failures_below: Option<f64>,
    },

    /// Compare persisted evaluation runs.
    Compare {
        /// Two or more run JSON files written by `lore eval`.
        #[arg(required = true)]
        runs: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Chunk { path, dry_run } => {
            ingest::run_chunk(&cfg, &path, dry_run)?;
        }
        Commands::Outline { path } => {
            outline::run_outline(&path)?;
        }
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &query, limit)?;
        }
        Commands::Get { ids } => {
            get::run_get(&cfg, &ids)?;
        }
        Commands::Eval {
            questions,
            top_k,
            failures_below,
        } => {
            eval::run_eval(&cfg, questions, top_k, failures_below).await?;
        }
        Commands::Compare { runs } => {
            eval::run_compare(&runs)?;
        }
    }

    Ok(())
}
