//! Relevance scoring for meeting queries.
//!
//! Every candidate gets six signals in `[0, 1]`, each multiplied by its
//! weight and summed:
//!
//! | Signal        | Definition                                                       |
//! |---------------|------------------------------------------------------------------|
//! | `title`       | fraction of meeting-title tokens present in the note title       |
//! | `content`     | cosine similarity of query tokens vs. note content               |
//! | `tags`        | fraction of topic keywords matching a note tag (slug compare)    |
//! | `attendees`   | 1 if any attendee is named in the content or frontmatter         |
//! | `flex_search` | normalized index match strength                                  |
//! | `recency`     | `0.5^(age_days / half_life)`, capped at 1                        |
//!
//! Candidates are index hits plus notes listing a query attendee in their
//! frontmatter. Results below `min_relevance` are dropped; the rest are
//! ordered by score desc, `modified_at` desc, path asc.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};

use crate::index::{DocId, FullTextIndex};
use crate::models::{ContextMatch, Query, ScoreExplanation, VaultDocument};
use crate::snippet::{extract_snippets, SnippetOptions};
use crate::tokenize::{slug, tokenize, unique_tokens};
use crate::weights::RelevanceWeights;

/// Everything about a retrieval call except the weights.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalParams {
    pub min_relevance: f64,
    pub final_limit: usize,
    pub snippets: SnippetOptions,
    pub recency_half_life_days: f64,
    pub explain: bool,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            min_relevance: 0.1,
            final_limit: 10,
            snippets: SnippetOptions::default(),
            recency_half_life_days: 30.0,
            explain: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Signals {
    title: f64,
    content: f64,
    tags: f64,
    attendees: f64,
    flex_search: f64,
    recency: f64,
}

impl Signals {
    fn score(&self, w: &RelevanceWeights) -> f64 {
        w.title * self.title
            + w.content * self.content
            + w.tags * self.tags
            + w.attendees * self.attendees
            + w.flex_search_bonus * self.flex_search
            + w.recency_bonus * self.recency
    }

    fn matched_fields(&self) -> Vec<String> {
        [
            ("title", self.title),
            ("content", self.content),
            ("tags", self.tags),
            ("attendees", self.attendees),
        ]
        .into_iter()
        .filter(|(_, v)| *v > 0.0)
        .map(|(name, _)| name.to_string())
        .collect()
    }

    fn explain(&self, weights: &RelevanceWeights) -> ScoreExplanation {
        ScoreExplanation {
            title: self.title,
            content: self.content,
            tags: self.tags,
            attendees: self.attendees,
            flex_search: self.flex_search,
            recency: self.recency,
            weights: *weights,
        }
    }
}

/// Query text split the ways the signals need it.
struct PreparedQuery {
    title_tokens: Vec<String>,
    /// All query tokens with repeats, for the cosine term-frequency vector.
    all_tokens: Vec<String>,
    search_tokens: Vec<String>,
    attendees_lower: Vec<String>,
    topic_slugs: Vec<String>,
    snippet_terms: Vec<String>,
}

impl PreparedQuery {
    fn new(query: &Query) -> Self {
        let attendees: Vec<&str> = query
            .attendee_names
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect();
        let topics: Vec<&str> = query
            .topic_keywords
            .iter()
            .map(|t| t.trim().trim_start_matches('#').trim())
            .filter(|t| !t.is_empty())
            .collect();

        let title_tokens = unique_tokens(&query.meeting_title);
        let mut all_tokens = tokenize(&query.meeting_title);
        for text in attendees.iter().chain(topics.iter()) {
            all_tokens.extend(tokenize(text));
        }

        let mut seen = HashSet::new();
        let search_tokens = all_tokens
            .iter()
            .filter(|t| seen.insert((*t).clone()))
            .cloned()
            .collect();

        let mut seen = HashSet::new();
        let snippet_terms = attendees
            .iter()
            .chain(topics.iter())
            .map(|t| t.to_string())
            .chain(all_tokens.iter().cloned())
            .filter(|t| seen.insert(t.to_lowercase()))
            .collect();

        Self {
            title_tokens,
            all_tokens,
            search_tokens,
            attendees_lower: attendees.iter().map(|a| a.to_lowercase()).collect(),
            topic_slugs: topics.iter().map(|t| slug(t)).filter(|s| !s.is_empty()).collect(),
            snippet_terms,
        }
    }

    fn is_empty(&self) -> bool {
        self.search_tokens.is_empty() && self.attendees_lower.is_empty() && self.topic_slugs.is_empty()
    }
}

/// Rank `documents` against `query`.
///
/// `index` must have been built from exactly `documents`. `now` is the
/// reference point for recency; the engine passes the snapshot's build time.
pub fn rank(
    documents: &[VaultDocument],
    index: &FullTextIndex,
    query: &Query,
    weights: &RelevanceWeights,
    params: &RetrievalParams,
    now: DateTime<Utc>,
) -> Vec<ContextMatch> {
    let prepared = PreparedQuery::new(query);
    if prepared.is_empty() || documents.is_empty() {
        return Vec::new();
    }

    // doc → flex strength
    let mut candidates: BTreeMap<DocId, f64> = index
        .search(&prepared.search_tokens)
        .into_iter()
        .map(|c| (c.doc, c.strength))
        .collect();
    if !prepared.attendees_lower.is_empty() {
        for (i, doc) in documents.iter().enumerate() {
            if lists_attendee(doc, &prepared.attendees_lower) {
                candidates.entry(i as DocId).or_insert(0.0);
            }
        }
    }

    let mut scored: Vec<(DocId, Signals, f64)> = candidates
        .into_iter()
        .filter_map(|(id, strength)| {
            let doc = documents.get(id as usize)?;
            let signals = Signals {
                title: title_overlap(&prepared.title_tokens, &doc.title),
                content: index.content_similarity(id, &prepared.all_tokens),
                tags: tag_fraction(&prepared.topic_slugs, doc),
                attendees: attendee_signal(&prepared.attendees_lower, doc),
                flex_search: strength,
                recency: recency(doc.modified_at, now, params.recency_half_life_days),
            };
            let score = signals.score(weights);
            (score > 0.0 && score >= params.min_relevance).then_some((id, signals, score))
        })
        .collect();

    scored.sort_by(|a, b| {
        let (da, db) = (&documents[a.0 as usize], &documents[b.0 as usize]);
        b.2.total_cmp(&a.2)
            .then_with(|| db.modified_at.cmp(&da.modified_at))
            .then_with(|| da.path.cmp(&db.path))
    });
    scored.truncate(params.final_limit);

    scored
        .into_iter()
        .map(|(id, signals, score)| {
            let doc = &documents[id as usize];
            ContextMatch {
                document: doc.clone(),
                relevance_score: score,
                matched_fields: signals.matched_fields(),
                snippets: extract_snippets(&doc.content, &prepared.snippet_terms, &params.snippets),
                explain: params.explain.then(|| signals.explain(weights)),
            }
        })
        .collect()
}

fn title_overlap(title_tokens: &[String], doc_title: &str) -> f64 {
    if title_tokens.is_empty() {
        return 0.0;
    }
    let doc_tokens: HashSet<String> = tokenize(doc_title).into_iter().collect();
    let hits = title_tokens.iter().filter(|t| doc_tokens.contains(*t)).count();
    hits as f64 / title_tokens.len() as f64
}

fn tag_fraction(topic_slugs: &[String], doc: &VaultDocument) -> f64 {
    if topic_slugs.is_empty() || doc.tags.is_empty() {
        return 0.0;
    }
    let tag_slugs: Vec<String> = doc.tags.iter().map(|t| slug(t)).collect();
    let hits = topic_slugs
        .iter()
        .filter(|topic| {
            tag_slugs
                .iter()
                .any(|tag| tag == *topic || tag.split('/').any(|seg| seg == topic.as_str()))
        })
        .count();
    hits as f64 / topic_slugs.len() as f64
}

fn lists_attendee(doc: &VaultDocument, attendees_lower: &[String]) -> bool {
    doc.attendees
        .iter()
        .any(|a| attendees_lower.contains(&a.to_lowercase()))
}

fn attendee_signal(attendees_lower: &[String], doc: &VaultDocument) -> f64 {
    if attendees_lower.is_empty() {
        return 0.0;
    }
    if lists_attendee(doc, attendees_lower) {
        return 1.0;
    }
    let content = doc.content.to_lowercase();
    if attendees_lower.iter().any(|a| mentions_name(&content, a)) {
        1.0
    } else {
        0.0
    }
}

/// `name` occurs in `text` as a whole name: no letter or digit directly
/// before or after it. Both sides must already be lowercased.
fn mentions_name(text: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    text.match_indices(name).any(|(start, hit)| {
        let before = text[..start].chars().next_back();
        let after = text[start + hit.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Exponential decay with the given half-life. Future timestamps count as now.
pub fn recency(modified_at: DateTime<Utc>, now: DateTime<Utc>, half_life_days: f64) -> f64 {
    let age_days = (now - modified_at).num_milliseconds() as f64 / 86_400_000.0;
    if age_days <= 0.0 || half_life_days <= 0.0 {
        return 1.0;
    }
    0.5_f64.powf(age_days / half_life_days).min(1.0)
}
