//! # askbase CLI (`akb`)
//!
//! The `akb` binary is the interface to askbase. It provides commands for
//! store setup, document ingestion, similarity search, retrieval-augmented
//! question answering, and store export/migration.
//!
//! ## Usage
//!
//! ```bash
//! akb --config ./config/askbase.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `akb init` | Create or verify the vector store collection |
//! | `akb ingest` | Chunk, embed, and upsert local documents |
//! | `akb search "<query>"` | Raw similarity search against the store |
//! | `akb ask "<question>"` | Answer a question with one retrieval round |
//! | `akb export` | Dump every vector record as JSON |
//! | `akb migrate <provider>` | Copy the store to another provider |
//!
//! ## Examples
//!
//! ```bash
//! # Verify the store is reachable and sized correctly
//! akb init --config ./config/askbase.toml
//!
//! # Ingest the configured docs directory
//! akb ingest --config ./config/askbase.toml
//!
//! # See what would be ingested without touching any service
//! akb ingest --dry-run
//!
//! # Ask a question; the model decides whether to search first
//! akb ask "What foods does the knowledge base mention?"
//!
//! # Move the knowledge base from Pinecone to a local Qdrant
//! akb migrate qdrant
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod ask;
mod chunk;
mod config;
mod embedding;
mod error;
mod export;
mod ingest;
mod migrate;
mod model;
mod models;
mod responder;
mod search;
mod store;

/// askbase CLI — retrieval-augmented question answering over pluggable
/// vector stores.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/askbase.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "akb",
    about = "askbase — retrieval-augmented question answering over pluggable vector stores",
    version,
    long_about = "askbase ingests local documents into a remote vector store (chunk, embed, \
    upsert) and answers questions by letting a chat model decide, via a single-round tool \
    call, whether to search the knowledge base before answering. Pinecone (hosted) and \
    Qdrant (self-hosted) stores are interchangeable via configuration."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/askbase.toml`. All model, embedding, store,
    /// and ingestion settings are read from this file.
    #[arg(long, global = true, default_value = "./config/askbase.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create or verify the vector store collection.
    ///
    /// For self-hosted stores this creates the collection (cosine distance,
    /// dimensionality from `[embedding].dims`) if it does not exist. For
    /// the hosted store it verifies reachability and that the index
    /// dimension matches. Idempotent.
    Init,

    /// Ingest local documents into the vector store.
    ///
    /// Scans `[ingest].root` for matching files, chunks each document with
    /// the configured size/overlap, embeds the chunks, and upserts them.
    /// Re-running overwrites a document's existing vectors.
    Ingest {
        /// Show file and chunk counts without embedding or writing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Search the vector store directly.
    ///
    /// Embeds the query and prints the most similar chunks with scores.
    /// Useful for inspecting what `ask` would retrieve.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results (default from `[retrieval].top_k`).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Answer a question with retrieval-augmented generation.
    ///
    /// Sends the question to the chat model with the knowledge-base search
    /// tool on offer; if the model requests a search, retrieved passages
    /// are fed back and its next reply is the answer. Prints the answer to
    /// stdout.
    Ask {
        /// The question to answer.
        question: String,

        /// Default result count for the retrieval tool.
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Export every vector record as JSON.
    ///
    /// Writes an export envelope (`exported_at`, `store`, and a `vectors`
    /// array of `{id, values, metadata}`) to the given file, or to stdout
    /// when no output path is given.
    Export {
        /// Output file path (stdout if omitted).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Copy the store's contents to another provider.
    ///
    /// Dumps every record from the configured store and upserts it into
    /// the named provider, whose settings come from the same config file.
    Migrate {
        /// Target store provider: `pinecone`, `qdrant`, or `memory`.
        provider: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let dims = cfg.embedding.dims.ok_or_else(|| {
                error::Error::config("init requires [embedding] dims to size the collection")
            })?;
            let store = store::create_store(&cfg)?;
            store.init(dims).await?;
            println!("Store '{}' initialized ({} dims).", store.name(), dims);
        }
        Commands::Ingest { dry_run } => {
            ingest::run_ingest(&cfg, dry_run).await?;
        }
        Commands::Search { query, top_k } => {
            search::run_search(&cfg, &query, top_k).await?;
        }
        Commands::Ask { question, top_k } => {
            ask::run_ask(&cfg, &question, top_k).await?;
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
        Commands::Migrate { provider } => {
            migrate::run_migrate(&cfg, &provider).await?;
        }
    }

    Ok(())
}
