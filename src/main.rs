//! # Prep context CLI (`prep`)
//!
//! Indexes an Obsidian vault and retrieves the notes most relevant to an
//! upcoming meeting.
//!
//! ## Usage
//!
//! ```bash
//! prep --config ./config/prep.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `prep index` | Scan and index the vault, print a summary |
//! | `prep context "<title>"` | Rank notes for a meeting |
//! | `prep stats` | Note, term and tag counts for the vault |
//! | `prep serve` | Start the local JSON HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Index a vault without a config file
//! prep --vault ~/Obsidian/Work index
//!
//! # Context for a meeting
//! prep context "Product Strategy Meeting" \
//!     --attendee "Sarah Johnson" --topic "product strategy" --topic roadmap
//!
//! # Same, as JSON with a per-signal breakdown
//! prep context "Product Strategy Meeting" --attendee "Sarah Johnson" --json --explain
//! ```
//!
//! Diagnostics go to stderr and are controlled by `PREP_LOG` (falling back
//! to `RUST_LOG`), e.g. `PREP_LOG=prep_context=debug`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use prep_context::config::{self, Config};
use prep_context::context::{run_context, ContextArgs};
use prep_context::index_cmd::run_index;
use prep_context::models::Query;
use prep_context::progress::ProgressMode;
use prep_context::server;
use prep_context::stats::run_stats;

/// Prep context engine: relevance-ranked vault notes for meetings.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/prep.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "prep",
    about = "Prep context engine: relevance-ranked Obsidian notes for upcoming meetings",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/prep.toml")]
    config: PathBuf,

    /// Vault root. Overrides `[vault].root`; with no config file present,
    /// every other setting takes its default.
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    /// Indexing progress on stderr. Defaults to `human` on a TTY, else `off`.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan and index the vault, then print a summary.
    Index,

    /// Rank vault notes for a meeting.
    ///
    /// Indexes the vault, scores every candidate note against the meeting
    /// title, attendees and topics, and prints the best matches with
    /// snippets.
    Context {
        /// The meeting title.
        title: String,

        /// Attendee name (repeatable).
        #[arg(long = "attendee")]
        attendees: Vec<String>,

        /// Topic keyword (repeatable).
        #[arg(long = "topic")]
        topics: Vec<String>,

        /// Maximum number of matches to return.
        #[arg(long)]
        limit: Option<usize>,

        /// Include the per-signal score breakdown.
        #[arg(long)]
        explain: bool,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Print note, term and tag counts for the vault.
    Stats,

    /// Start the local JSON HTTP server.
    ///
    /// Binds to `[server].bind`, indexes the vault, and serves
    /// `/health`, `/index`, `/context` and `/stats`.
    Serve,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PREP_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    match &cli.vault {
        Some(vault) if !cli.config.exists() => Ok(Config::minimal(vault.clone())),
        Some(vault) => {
            let mut cfg = config::load_config(&cli.config)?;
            cfg.vault.root = vault.clone();
            Ok(cfg)
        }
        None => config::load_config(&cli.config),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;
    let progress = cli
        .progress
        .unwrap_or_else(ProgressMode::default_for_tty)
        .reporter();

    match cli.command {
        Commands::Index => {
            run_index(&cfg, progress.as_ref())?;
        }
        Commands::Context {
            title,
            attendees,
            topics,
            limit,
            explain,
            json,
        } => {
            let args = ContextArgs {
                query: Query::new(title, attendees, topics),
                limit,
                explain,
                json,
            };
            run_context(&cfg, args, progress.as_ref())?;
        }
        Commands::Stats => {
            run_stats(&cfg, progress.as_ref())?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
