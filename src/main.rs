//! # pagenames CLI
//!
//! Commands for creating the database, maintaining the page lookup cache,
//! running the ingest pipeline, and inspecting the result.
//!
//! ## Usage
//!
//! ```bash
//! pagenames --config ./config/pagenames.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pagenames init` | Create the SQLite database and run schema migrations |
//! | `pagenames cache reset` | Destroy and recreate the lookup cache |
//! | `pagenames cache rebuild` | Re-index every page into the lookup cache |
//! | `pagenames ingest <stream>` | Load a page stream (`-` for stdin) |
//! | `pagenames stats` | Show counts and the majority-kingdom breakdown |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

mod cache_cmd;
mod config;
mod db;
mod ingest;
mod lookup_cache;
mod migrate;
mod missing;
mod progress;
mod sqlite_store;
mod stats;
mod stream;
mod uploader;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// pagenames: load names found on scanned pages and classify their items.
#[derive(Parser)]
#[command(
    name = "pagenames",
    about = "Load names found on scanned pages and classify their items",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/pagenames.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the items, pages and
    /// page_name_strings tables. Safe to run more than once.
    Init,

    /// Maintain the page lookup cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Run the ingest pipeline over a page stream.
    ///
    /// Empties page_name_strings, resets every item summary, then loads the
    /// stream. Barcodes without an item are written to
    /// `<input dir>/missing_items.txt`.
    Ingest {
        /// JSON Lines stream file, or `-` to read stdin.
        stream: PathBuf,

        /// Progress output on stderr. Defaults to human on a terminal, off otherwise.
        #[arg(long, value_enum)]
        progress: Option<progress::ProgressMode>,
    },

    /// Show database statistics.
    Stats,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Destroy the cache directory and recreate it empty.
    Reset,
    /// Reset the cache and index every row of the pages table.
    Rebuild,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagenames=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Cache { action } => match action {
            CacheAction::Reset => {
                cache_cmd::run_cache_reset(&cfg)?;
            }
            CacheAction::Rebuild => {
                cache_cmd::run_cache_rebuild(&cfg).await?;
            }
        },
        Commands::Ingest { stream, progress: mode } => {
            let mode = mode.unwrap_or_else(progress::ProgressMode::default_for_tty);
            ingest::run_ingest(&cfg, &stream, mode).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
