//! The context indexer: owns the active snapshot and answers queries.
//!
//! A [`Snapshot`] is an immutable pair of parsed documents and the index
//! built over them. [`ContextIndexer::index_vault`] builds a complete new
//! snapshot without holding any lock and then swaps it in. Queries clone
//! the `Arc` of whatever snapshot is active when they start, so a query
//! that overlaps a re-index finishes against the old snapshot. A failed
//! build leaves the previous snapshot active.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use crate::error::ContextError;
use crate::index::FullTextIndex;
use crate::models::{ContextMatch, IndexStats, Query, VaultDocument};
use crate::progress::{IndexProgressEvent, IndexProgressReporter};
use crate::scorer::{rank, RetrievalParams};
use crate::vault::{parse_files, scan_vault, ScanOptions, SkippedFile};
use crate::weights::RelevanceWeights;

/// One consistent view of the vault.
#[derive(Debug)]
pub struct Snapshot {
    pub root: PathBuf,
    /// Sorted by path.
    pub documents: Vec<VaultDocument>,
    pub index: FullTextIndex,
    pub skipped: Vec<SkippedFile>,
    /// Build time; also the reference point for recency scoring.
    pub indexed_at: DateTime<Utc>,
}

impl Snapshot {
    /// Scan, parse, and index the vault at `root`.
    pub fn build(
        root: &Path,
        options: &ScanOptions,
        progress: &dyn IndexProgressReporter,
    ) -> Result<Self, ContextError> {
        let (files, mut skipped) = scan_vault(root, options, progress)?;
        let outcome = parse_files(files, progress);
        skipped.extend(outcome.skipped);
        skipped.sort_by(|a, b| a.path.cmp(&b.path));

        let index = FullTextIndex::build(&outcome.documents);
        Ok(Snapshot {
            root: root.to_path_buf(),
            documents: outcome.documents,
            index,
            skipped,
            indexed_at: Utc::now(),
        })
    }

    pub fn stats(&self) -> IndexStats {
        let total_tags = self
            .documents
            .iter()
            .flat_map(|d| d.tags.iter())
            .collect::<std::collections::BTreeSet<_>>()
            .len();
        IndexStats {
            total_documents: self.documents.len(),
            skipped_files: self.skipped.len(),
            total_terms: self.index.term_count(),
            total_tags,
            indexed_at: Some(self.indexed_at),
            newest_modified_at: self.documents.iter().map(|d| d.modified_at).max(),
        }
    }

    pub fn query(
        &self,
        query: &Query,
        weights: &RelevanceWeights,
        params: &RetrievalParams,
    ) -> Vec<ContextMatch> {
        rank(
            &self.documents,
            &self.index,
            query,
            weights,
            params,
            self.indexed_at,
        )
    }
}

pub struct ContextIndexer {
    scan: ScanOptions,
    params: RetrievalParams,
    active: RwLock<Option<Arc<Snapshot>>>,
}

impl ContextIndexer {
    pub fn new(scan: ScanOptions, params: RetrievalParams) -> Self {
        Self {
            scan,
            params,
            active: RwLock::new(None),
        }
    }

    pub fn params(&self) -> &RetrievalParams {
        &self.params
    }

    /// Build a fresh snapshot of the vault at `path` and make it active.
    ///
    /// Reports `scanning`, `indexing`, then `complete` or `error` to
    /// `progress`. On error the previously active snapshot is kept.
    pub fn index_vault(
        &self,
        path: &Path,
        progress: &dyn IndexProgressReporter,
    ) -> Result<IndexStats, ContextError> {
        let started = Instant::now();
        let snapshot = match Snapshot::build(path, &self.scan, progress) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(vault = %path.display(), error = %err, "index build failed");
                progress.report(IndexProgressEvent::Error {
                    error: err.to_string(),
                });
                return Err(err);
            }
        };

        let stats = snapshot.stats();
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(snapshot));

        tracing::info!(
            vault = %path.display(),
            documents = stats.total_documents,
            skipped = stats.skipped_files,
            terms = stats.total_terms,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "snapshot swapped in"
        );
        progress.report(IndexProgressEvent::Complete {
            total_documents: stats.total_documents as u64,
            skipped: stats.skipped_files as u64,
        });
        Ok(stats)
    }

    /// The active snapshot, or [`ContextError::IndexNotReady`].
    pub fn snapshot(&self) -> Result<Arc<Snapshot>, ContextError> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ContextError::IndexNotReady)
    }

    /// Ranked matches for a meeting, using the configured retrieval params.
    ///
    /// Never fails: an unready index or invalid weights are logged and
    /// yield no matches.
    pub fn find_relevant_context(&self, query: &Query, weights: &RelevanceWeights) -> Vec<ContextMatch> {
        match self.find_relevant_context_with(query, weights, &self.params) {
            Ok(matches) => matches,
            Err(err) => {
                tracing::warn!(error = %err, "no context returned");
                Vec::new()
            }
        }
    }

    /// Like [`find_relevant_context`](Self::find_relevant_context) with
    /// explicit params, surfacing errors to the caller.
    pub fn find_relevant_context_with(
        &self,
        query: &Query,
        weights: &RelevanceWeights,
        params: &RetrievalParams,
    ) -> Result<Vec<ContextMatch>, ContextError> {
        weights.validate()?;
        let snapshot = self.snapshot()?;
        let started = Instant::now();
        let matches = snapshot.query(query, weights, params);
        tracing::debug!(
            meeting = %query.meeting_title,
            matches = matches.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "context query"
        );
        Ok(matches)
    }

    /// Stats for the active snapshot; all zeros before the first build.
    pub fn get_stats(&self) -> IndexStats {
        self.snapshot().map(|s| s.stats()).unwrap_or_default()
    }
}
