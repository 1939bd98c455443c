//! Core data models used throughout the context engine.
//!
//! These types represent the notes, queries, and ranked matches that flow
//! through the indexing and retrieval pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::weights::RelevanceWeights;

/// A parsed vault note. Immutable once built; re-created on every re-index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaultDocument {
    /// Vault-relative path with `/` separators. Unique within a snapshot.
    pub path: String,
    pub title: String,
    /// Body text with the frontmatter block removed.
    pub content: String,
    /// Lowercased tags without the leading `#`, from frontmatter and inline `#tags`.
    pub tags: BTreeSet<String>,
    /// Attendee names listed in the frontmatter, in file order.
    pub attendees: Vec<String>,
    pub modified_at: DateTime<Utc>,
}

/// What the caller knows about a meeting.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Query {
    pub meeting_title: String,
    #[serde(default)]
    pub attendee_names: Vec<String>,
    #[serde(default)]
    pub topic_keywords: Vec<String>,
}

impl Query {
    pub fn new(
        meeting_title: impl Into<String>,
        attendee_names: Vec<String>,
        topic_keywords: Vec<String>,
    ) -> Self {
        Self {
            meeting_title: meeting_title.into(),
            attendee_names,
            topic_keywords,
        }
    }
}

/// A ranked note returned for a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextMatch {
    pub document: VaultDocument,
    /// Sum of weighted signals. Can exceed 1.0 since weights are independent.
    pub relevance_score: f64,
    /// Subset of `title`, `content`, `tags`, `attendees`, in that order.
    pub matched_fields: Vec<String>,
    /// Excerpts in document order.
    pub snippets: Vec<String>,
    /// Scoring breakdown (populated when `explain` is requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<ScoreExplanation>,
}

/// Raw signal values in `[0, 1]` and the weights they were multiplied by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreExplanation {
    pub title: f64,
    pub content: f64,
    pub tags: f64,
    pub attendees: f64,
    pub flex_search: f64,
    pub recency: f64,
    pub weights: RelevanceWeights,
}

/// Summary of the active snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexStats {
    pub total_documents: usize,
    pub skipped_files: usize,
    pub total_terms: usize,
    pub total_tags: usize,
    pub indexed_at: Option<DateTime<Utc>>,
    pub newest_modified_at: Option<DateTime<Utc>>,
}
