//! TOML configuration.
//!
//! Only `[vault]` is required. `[retrieval]`, `[retrieval.weights]` and
//! `[server]` fall back to defaults key by key. See
//! `config/prep.example.toml` for every option.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::scorer::RetrievalParams;
use crate::snippet::SnippetOptions;
use crate::vault::ScanOptions;
use crate::weights::RelevanceWeights;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub vault: VaultConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VaultConfig {
    pub root: PathBuf,
    #[serde(flatten)]
    pub scan: ScanOptions,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f64,
    #[serde(default = "default_final_limit")]
    pub final_limit: usize,
    #[serde(default = "default_max_snippets")]
    pub max_snippets: usize,
    #[serde(default = "default_snippet_window")]
    pub snippet_window: usize,
    #[serde(default = "default_max_snippet_chars")]
    pub max_snippet_chars: usize,
    #[serde(default = "default_recency_half_life_days")]
    pub recency_half_life_days: f64,
    #[serde(default)]
    pub weights: RelevanceWeights,
}

fn default_min_relevance() -> f64 {
    0.1
}
fn default_final_limit() -> usize {
    10
}
fn default_max_snippets() -> usize {
    3
}
fn default_snippet_window() -> usize {
    80
}
fn default_max_snippet_chars() -> usize {
    240
}
fn default_recency_half_life_days() -> f64 {
    30.0
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            min_relevance: default_min_relevance(),
            final_limit: default_final_limit(),
            max_snippets: default_max_snippets(),
            snippet_window: default_snippet_window(),
            max_snippet_chars: default_max_snippet_chars(),
            recency_half_life_days: default_recency_half_life_days(),
            weights: RelevanceWeights::default(),
        }
    }
}

impl RetrievalConfig {
    pub fn params(&self) -> RetrievalParams {
        RetrievalParams {
            min_relevance: self.min_relevance,
            final_limit: self.final_limit,
            snippets: SnippetOptions {
                max_snippets: self.max_snippets,
                window: self.snippet_window,
                max_chars: self.max_snippet_chars,
            },
            recency_half_life_days: self.recency_half_life_days,
            explain: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Config {
    /// A config for `root` with every other setting at its default.
    pub fn minimal(root: impl Into<PathBuf>) -> Self {
        Self {
            vault: VaultConfig {
                root: root.into(),
                scan: ScanOptions::default(),
            },
            retrieval: RetrievalConfig::default(),
            server: ServerConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.final_limit < 1 {
            bail!("retrieval.final_limit must be >= 1");
        }
        if r.min_relevance.is_nan() || r.min_relevance < 0.0 {
            bail!("retrieval.min_relevance must be >= 0.0");
        }
        if r.recency_half_life_days.is_nan() || r.recency_half_life_days <= 0.0 {
            bail!("retrieval.recency_half_life_days must be > 0");
        }
        if r.snippet_window == 0 {
            bail!("retrieval.snippet_window must be > 0");
        }
        if r.max_snippet_chars == 0 {
            bail!("retrieval.max_snippet_chars must be > 0");
        }
        r.weights
            .validate()
            .map_err(|e| anyhow::anyhow!("retrieval.weights: {}", e))?;
        if self.vault.scan.include_globs.is_empty() {
            bail!("vault.include_globs must not be empty");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    config.vault.root = expand_home(&config.vault.root);
    config.validate()?;
    Ok(config)
}

/// Expand a leading `~/` using `$HOME`.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}
