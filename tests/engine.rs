//! Library-level tests for the context indexer against real vault
//! directories.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use prep_context::engine::ContextIndexer;
use prep_context::models::Query;
use prep_context::progress::{IndexProgressEvent, NoProgress};
use prep_context::scorer::RetrievalParams;
use prep_context::vault::ScanOptions;
use prep_context::weights::RelevanceWeights;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn sample_vault() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(
        root,
        "meetings/2024-05-01 Sarah.md",
        "---\ntitle: Meeting with Sarah Johnson - Product Strategy\ntags: [meeting, product-strategy]\nattendees: [\"[[Sarah Johnson]]\"]\n---\nSarah Johnson shared the product strategy draft.\nWe agreed to revisit the roadmap next quarter.\n",
    );
    write(
        root,
        "projects/roadmap.md",
        "# Roadmap\n\nQ3 roadmap themes: onboarding, pricing, integrations. #planning\n",
    );
    write(
        root,
        "people/bob.md",
        "# Bob Lee\n\nBob mentioned that Sarah Johnson owns pricing decisions.\n",
    );
    write(root, "journal/garden.md", "# Garden\n\nPlanted basil today.\n");
    write(root, "attachments/diagram.png", "not a note");
    tmp
}

fn indexer() -> ContextIndexer {
    ContextIndexer::new(ScanOptions::default(), RetrievalParams::default())
}

fn sarah_query() -> Query {
    Query::new(
        "Product Strategy Meeting",
        vec!["Sarah Johnson".into()],
        vec!["product strategy".into(), "roadmap".into()],
    )
}

#[test]
fn total_documents_matches_markdown_notes() {
    let vault = sample_vault();
    let idx = indexer();
    let stats = idx.index_vault(vault.path(), &NoProgress).unwrap();
    assert_eq!(stats.total_documents, 4);
    assert_eq!(idx.get_stats().total_documents, 4);
    assert_eq!(stats.skipped_files, 0);
    assert!(stats.total_tags >= 3);
    assert!(stats.indexed_at.is_some());
}

#[test]
fn unparsable_notes_are_skipped_not_fatal() {
    let vault = sample_vault();
    write(vault.path(), "bad/unterminated.md", "---\ntitle: x\nno end\n");
    fs::write(vault.path().join("bad/latin1.md"), [0x23, 0x20, 0xe9, 0xff]).unwrap();

    let idx = indexer();
    let stats = idx.index_vault(vault.path(), &NoProgress).unwrap();
    assert_eq!(stats.total_documents, 4);
    assert_eq!(stats.skipped_files, 2);

    let snapshot = idx.snapshot().unwrap();
    let skipped: Vec<&str> = snapshot.skipped.iter().map(|s| s.path.as_str()).collect();
    assert_eq!(skipped, vec!["bad/latin1.md", "bad/unterminated.md"]);
}

#[test]
fn sarah_johnson_example_end_to_end() {
    let vault = sample_vault();
    let idx = indexer();
    idx.index_vault(vault.path(), &NoProgress).unwrap();

    let matches = idx.find_relevant_context(&sarah_query(), &RelevanceWeights::default());
    assert!(!matches.is_empty());
    let top = &matches[0];
    assert_eq!(top.document.path, "meetings/2024-05-01 Sarah.md");
    assert!(top.relevance_score > 0.0);
    assert!(top
        .matched_fields
        .iter()
        .any(|f| f == "title" || f == "tags" || f == "attendees"));

    // Bob's note mentions Sarah in its body.
    let bob = matches
        .iter()
        .find(|m| m.document.path == "people/bob.md")
        .expect("bob.md should match on attendee mention");
    assert!(bob.matched_fields.contains(&"attendees".to_string()));
    assert!(bob.snippets.iter().any(|s| s.contains("Sarah Johnson")));

    assert!(matches.iter().all(|m| m.document.path != "journal/garden.md"));
}

#[test]
fn results_sorted_and_above_threshold() {
    let vault = sample_vault();
    let idx = indexer();
    idx.index_vault(vault.path(), &NoProgress).unwrap();

    let matches = idx.find_relevant_context(&sarah_query(), &RelevanceWeights::default());
    for pair in matches.windows(2) {
        assert!(pair[0].relevance_score >= pair[1].relevance_score);
    }
    let min = RetrievalParams::default().min_relevance;
    assert!(matches.iter().all(|m| m.relevance_score >= min));
}

#[test]
fn unknown_people_and_topics_return_nothing() {
    let vault = sample_vault();
    let idx = indexer();
    idx.index_vault(vault.path(), &NoProgress).unwrap();

    let query = Query::new(
        "Completely Unrelated Topic",
        vec!["Unknown Person".into()],
        vec!["quantum chromodynamics".into()],
    );
    assert!(idx
        .find_relevant_context(&query, &RelevanceWeights::default())
        .is_empty());
}

#[test]
fn queries_are_idempotent_and_do_not_mutate() {
    let vault = sample_vault();
    let idx = indexer();
    idx.index_vault(vault.path(), &NoProgress).unwrap();

    let before = idx.get_stats();
    let first = idx.find_relevant_context(&sarah_query(), &RelevanceWeights::default());
    let second = idx.find_relevant_context(&sarah_query(), &RelevanceWeights::default());
    assert_eq!(first, second);
    assert_eq!(idx.get_stats(), before);
}

#[test]
fn snippets_contain_matched_terms() {
    let vault = sample_vault();
    let idx = indexer();
    idx.index_vault(vault.path(), &NoProgress).unwrap();

    let query = Query::new("Planning", vec![], vec!["pricing".into()]);
    let matches = idx.find_relevant_context(&query, &RelevanceWeights::default());
    let roadmap = matches
        .iter()
        .find(|m| m.document.path == "projects/roadmap.md")
        .unwrap();
    assert!(roadmap
        .snippets
        .iter()
        .any(|s| s.to_lowercase().contains("pricing")));
    assert!(roadmap.snippets.len() <= 3);
}

#[test]
fn progress_stages_in_order() {
    let vault = sample_vault();
    let idx = indexer();
    let stages = Mutex::new(Vec::new());
    let reporter = |event: IndexProgressEvent| {
        let mut stages = stages.lock().unwrap();
        if stages.last() != Some(&event.stage()) {
            stages.push(event.stage());
        }
    };
    idx.index_vault(vault.path(), &reporter).unwrap();
    assert_eq!(
        *stages.lock().unwrap(),
        vec!["scanning", "indexing", "complete"]
    );
}

#[test]
fn empty_vault_reports_every_stage() {
    let tmp = TempDir::new().unwrap();
    let idx = indexer();
    let events = Mutex::new(Vec::new());
    let reporter = |event: IndexProgressEvent| events.lock().unwrap().push(event);
    let stats = idx.index_vault(tmp.path(), &reporter).unwrap();
    assert_eq!(stats.total_documents, 0);
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            IndexProgressEvent::Scanning { current: 0 },
            IndexProgressEvent::Indexing {
                current: 0,
                total: 0
            },
            IndexProgressEvent::Complete {
                total_documents: 0,
                skipped: 0
            },
        ]
    );
}

#[test]
fn failed_reindex_keeps_previous_snapshot() {
    let vault = sample_vault();
    let idx = indexer();
    idx.index_vault(vault.path(), &NoProgress).unwrap();

    let errors = Mutex::new(Vec::new());
    let reporter = |event: IndexProgressEvent| {
        if let IndexProgressEvent::Error { error } = event {
            errors.lock().unwrap().push(error);
        }
    };
    let missing = vault.path().join("does-not-exist");
    assert!(idx.index_vault(&missing, &reporter).is_err());
    assert_eq!(errors.lock().unwrap().len(), 1);

    assert_eq!(idx.get_stats().total_documents, 4);
    assert!(!idx
        .find_relevant_context(&sarah_query(), &RelevanceWeights::default())
        .is_empty());
}

#[test]
fn reindex_swaps_snapshot_copy_on_write() {
    let vault = sample_vault();
    let idx = indexer();
    idx.index_vault(vault.path(), &NoProgress).unwrap();
    let old = idx.snapshot().unwrap();

    write(
        vault.path(),
        "meetings/followup.md",
        "# Product strategy follow-up\n\nRoadmap questions for Sarah Johnson.\n",
    );
    idx.index_vault(vault.path(), &NoProgress).unwrap();

    // A reader holding the old snapshot still sees the old vault.
    assert_eq!(old.documents.len(), 4);
    assert_eq!(idx.snapshot().unwrap().documents.len(), 5);
    assert!(!Arc::ptr_eq(&old, &idx.snapshot().unwrap()));
}

#[test]
fn concurrent_queries_during_reindex() {
    let vault = sample_vault();
    let idx = Arc::new(indexer());
    idx.index_vault(vault.path(), &NoProgress).unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let idx = idx.clone();
            std::thread::spawn(move || {
                for _ in 0..20 {
                    let matches =
                        idx.find_relevant_context(&sarah_query(), &RelevanceWeights::default());
                    assert!(!matches.is_empty());
                }
            })
        })
        .collect();
    for _ in 0..3 {
        idx.index_vault(vault.path(), &NoProgress).unwrap();
    }
    for r in readers {
        r.join().unwrap();
    }
}

#[test]
fn excluded_globs_are_honoured() {
    let vault = sample_vault();
    let options = ScanOptions {
        exclude_globs: vec!["journal/**".into()],
        ..ScanOptions::default()
    };
    let idx = ContextIndexer::new(options, RetrievalParams::default());
    let stats = idx.index_vault(vault.path(), &NoProgress).unwrap();
    assert_eq!(stats.total_documents, 3);
}

#[test]
fn monotonic_in_tag_weight() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "title-only.md", "# Budget review\n\nNumbers.\n");
    write(tmp.path(), "tag-only.md", "# Notes\n\nMisc. #hiring\n");
    let idx = indexer();
    idx.index_vault(tmp.path(), &NoProgress).unwrap();

    let query = Query::new("Budget", vec![], vec!["hiring".into()]);
    let base = RelevanceWeights {
        title: 0.6,
        tags: 0.2,
        ..RelevanceWeights::zero()
    };
    let position = |w: &RelevanceWeights| {
        idx.find_relevant_context(&query, w)
            .iter()
            .position(|m| m.document.path == "tag-only.md")
            .unwrap()
    };

    let mut last = position(&base);
    for tags in [0.3, 0.5, 0.7, 1.0] {
        let p = position(&RelevanceWeights { tags, ..base });
        assert!(p <= last, "raising tags to {} demoted tag-only note", tags);
        last = p;
    }
    assert_eq!(last, 0);
}
