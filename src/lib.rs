//! # Prep Context
//!
//! A local relevance-scoring context engine for meeting preparation.
//!
//! Prep Context indexes the markdown notes of an Obsidian vault and, given
//! an upcoming meeting's title, attendees and topics, returns the notes most
//! likely to matter, each with a relevance score, the fields that matched
//! and short snippets.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────────┐
//! │    Vault    │──▶│ Parse (fold) │──▶│   Snapshot    │
//! │ walk + glob │   │ frontmatter  │   │ docs + index  │
//! └─────────────┘   └──────────────┘   └───────┬───────┘
//!                                              │ Arc swap
//!                      ┌───────────────────────┤
//!                      ▼                       ▼
//!                 ┌──────────┐           ┌──────────┐
//!                 │   CLI    │           │   HTTP   │
//!                 │  (prep)  │           │  (JSON)  │
//!                 └──────────┘           └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prep_context::engine::ContextIndexer;
//! use prep_context::models::Query;
//! use prep_context::progress::NoProgress;
//! use prep_context::scorer::RetrievalParams;
//! use prep_context::vault::ScanOptions;
//! use prep_context::weights::RelevanceWeights;
//!
//! # fn main() -> Result<(), prep_context::error::ContextError> {
//! let indexer = ContextIndexer::new(ScanOptions::default(), RetrievalParams::default());
//! indexer.index_vault("/path/to/vault".as_ref(), &NoProgress)?;
//!
//! let query = Query::new(
//!     "Product Strategy Meeting",
//!     vec!["Sarah Johnson".into()],
//!     vec!["roadmap".into()],
//! );
//! for m in indexer.find_relevant_context(&query, &RelevanceWeights::default()) {
//!     println!("{:.2} {}", m.relevance_score, m.document.title);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`vault`] | Vault walk and note parsing (document store) |
//! | [`frontmatter`] | Frontmatter, heading and inline-tag parsing |
//! | [`tokenize`] | Shared tokenizer and tag slugs |
//! | [`index`] | Inverted index, BM25 strength, content similarity |
//! | [`scorer`] | Six-signal weighted relevance ranking |
//! | [`snippet`] | Sentence and window snippets |
//! | [`engine`] | Snapshot ownership and the public operations |
//! | [`weights`] | Relevance weights |
//! | [`progress`] | Indexing progress events and reporters |
//! | [`config`] | TOML configuration parsing |
//! | [`server`] | JSON HTTP server |

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod frontmatter;
pub mod index;
pub mod index_cmd;
pub mod models;
pub mod progress;
pub mod scorer;
pub mod server;
pub mod snippet;
pub mod stats;
pub mod tokenize;
pub mod vault;
pub mod weights;
