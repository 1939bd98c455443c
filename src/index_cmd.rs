//! `prep index`: build a snapshot of the configured vault and summarize it.
//!
//! The engine keeps its snapshot in memory only, so every CLI command that
//! needs one indexes first through [`index_from_config`].

use anyhow::{Context, Result};

use crate::config::Config;
use crate::engine::ContextIndexer;
use crate::models::IndexStats;
use crate::progress::IndexProgressReporter;

/// Create an indexer from `config` and index its vault root.
pub fn index_from_config(
    config: &Config,
    progress: &dyn IndexProgressReporter,
) -> Result<(ContextIndexer, IndexStats)> {
    let indexer = ContextIndexer::new(config.vault.scan.clone(), config.retrieval.params());
    let stats = indexer
        .index_vault(&config.vault.root, progress)
        .with_context(|| format!("Failed to index vault: {}", config.vault.root.display()))?;
    Ok((indexer, stats))
}

pub fn run_index(config: &Config, progress: &dyn IndexProgressReporter) -> Result<()> {
    let (indexer, stats) = index_from_config(config, progress)?;

    println!("Vault: {}", config.vault.root.display());
    println!("  notes indexed: {}", stats.total_documents);
    println!("  skipped:       {}", stats.skipped_files);
    println!("  terms:         {}", stats.total_terms);

    if let Ok(snapshot) = indexer.snapshot() {
        for skipped in snapshot.skipped.iter().take(10) {
            println!("  skip {}: {}", skipped.path, skipped.reason);
        }
        if snapshot.skipped.len() > 10 {
            println!("  ... and {} more", snapshot.skipped.len() - 10);
        }
    }

    Ok(())
}
