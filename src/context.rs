//! `prep context`: rank vault notes for a meeting and print them.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::index_cmd::index_from_config;
use crate::models::{ContextMatch, Query};
use crate::progress::IndexProgressReporter;

pub struct ContextArgs {
    pub query: Query,
    pub limit: Option<usize>,
    pub explain: bool,
    pub json: bool,
}

pub fn run_context(
    config: &Config,
    args: ContextArgs,
    progress: &dyn IndexProgressReporter,
) -> Result<()> {
    let mut params = config.retrieval.params();
    if let Some(limit) = args.limit {
        if limit == 0 {
            bail!("--limit must be >= 1");
        }
        params.final_limit = limit;
    }
    params.explain = args.explain;

    let (indexer, _) = index_from_config(config, progress)?;
    let matches =
        indexer.find_relevant_context_with(&args.query, &config.retrieval.weights, &params)?;

    if args.json {
        let body = serde_json::json!({ "matches": matches });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("No relevant context.");
        return Ok(());
    }

    for (i, m) in matches.iter().enumerate() {
        print_match(i + 1, m);
    }
    Ok(())
}

fn print_match(rank: usize, m: &ContextMatch) {
    let doc = &m.document;
    println!(
        "{}. [{:.0}%] {}",
        rank,
        (m.relevance_score * 100.0).round(),
        doc.title
    );
    println!("    path: {}", doc.path);
    println!("    modified: {}", doc.modified_at.format("%Y-%m-%d"));
    if !m.matched_fields.is_empty() {
        println!("    matched: {}", m.matched_fields.join(", "));
    }
    if !doc.tags.is_empty() {
        let tags: Vec<&str> = doc.tags.iter().map(String::as_str).collect();
        println!("    tags: {}", tags.join(", "));
    }
    for snippet in &m.snippets {
        println!("    > {}", snippet);
    }
    if let Some(ref e) = m.explain {
        println!(
            "    explain: title={:.2}×{:.2} content={:.2}×{:.2} tags={:.2}×{:.2} attendees={:.2}×{:.2} flex={:.2}×{:.2} recency={:.2}×{:.2}",
            e.title,
            e.weights.title,
            e.content,
            e.weights.content,
            e.tags,
            e.weights.tags,
            e.attendees,
            e.weights.attendees,
            e.flex_search,
            e.weights.flex_search_bonus,
            e.recency,
            e.weights.recency_bonus
        );
    }
    println!();
}
