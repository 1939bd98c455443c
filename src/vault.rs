//! Vault scanning: the document store.
//!
//! Walks the vault root, applies include/exclude globs, and reads each
//! matching note into a [`VaultFile`]. Turning files into
//! [`VaultDocument`]s is a separate fold ([`parse_files`]) over the file
//! list that collects parsed documents and skipped files side by side, so
//! it can be exercised without a filesystem.
//!
//! Only vault-level problems (missing root, root not a directory,
//! unreadable root) are errors. A note that cannot be read or parsed is
//! logged and skipped.

use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::error::ContextError;
use crate::frontmatter::{first_heading, inline_tags, split_frontmatter};
use crate::models::VaultDocument;
use crate::progress::{IndexProgressEvent, IndexProgressReporter};

/// Directories Obsidian and tooling keep inside a vault.
const DEFAULT_EXCLUDES: &[&str] = &[
    "**/.obsidian/**",
    "**/.trash/**",
    "**/.git/**",
    "**/node_modules/**",
];

/// Which files a scan picks up, and how far it is allowed to go.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanOptions {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// The walk stops after this many matching files.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Larger notes are skipped.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.markdown".to_string()]
}
fn default_max_files() -> usize {
    20_000
}
fn default_max_file_bytes() -> u64 {
    2 * 1024 * 1024
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
            max_files: default_max_files(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

/// A raw note as read from disk.
#[derive(Debug, Clone)]
pub struct VaultFile {
    /// Vault-relative path with `/` separators.
    pub path: String,
    pub bytes: Vec<u8>,
    pub modified_at: DateTime<Utc>,
}

/// A note left out of the snapshot, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Result of folding a file list into documents.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub documents: Vec<VaultDocument>,
    pub skipped: Vec<SkippedFile>,
}

/// Walk `root` and read every matching note.
///
/// Returns the files in path order plus any files skipped during the walk
/// (unreadable or over the size cap).
pub fn scan_vault(
    root: &Path,
    options: &ScanOptions,
    progress: &dyn IndexProgressReporter,
) -> Result<(Vec<VaultFile>, Vec<SkippedFile>), ContextError> {
    let meta = std::fs::metadata(root).map_err(|e| ContextError::io(root, e))?;
    if !meta.is_dir() {
        return Err(ContextError::io(
            root,
            std::io::Error::other("not a directory"),
        ));
    }
    std::fs::read_dir(root).map_err(|e| ContextError::io(root, e))?;

    let include_set = build_globset(&options.include_globs)?;
    let mut excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
    excludes.extend(options.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&excludes)?;

    let mut files = Vec::new();
    let mut skipped = Vec::new();
    progress.report(IndexProgressEvent::Scanning { current: 0 });

    let walker = WalkDir::new(root).follow_links(options.follow_symlinks);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("walk failed"));
                return Err(ContextError::io(root, source));
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable vault entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        if files.len() + skipped.len() >= options.max_files {
            tracing::warn!(
                max_files = options.max_files,
                "vault file cap reached; remaining notes are not indexed"
            );
            break;
        }

        match read_file(path, &rel_str, options.max_file_bytes) {
            Ok(file) => files.push(file),
            Err(reason) => {
                tracing::warn!(path = %rel_str, %reason, "skipping note");
                skipped.push(SkippedFile {
                    path: rel_str,
                    reason,
                });
            }
        }

        progress.report(IndexProgressEvent::Scanning {
            current: (files.len() + skipped.len()) as u64,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok((files, skipped))
}

fn read_file(path: &Path, relative_path: &str, max_bytes: u64) -> Result<VaultFile, String> {
    let metadata = std::fs::metadata(path).map_err(|e| e.to_string())?;
    if metadata.len() > max_bytes {
        return Err(format!(
            "{} bytes exceeds the {} byte limit",
            metadata.len(),
            max_bytes
        ));
    }
    let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;

    Ok(VaultFile {
        path: relative_path.to_string(),
        bytes,
        modified_at: DateTime::<Utc>::from(modified),
    })
}

/// Parse every file, collecting documents and skipped files separately.
pub fn parse_files(files: Vec<VaultFile>, progress: &dyn IndexProgressReporter) -> ScanOutcome {
    let total = files.len() as u64;
    progress.report(IndexProgressEvent::Indexing { current: 0, total });
    let mut outcome = files
        .into_iter()
        .enumerate()
        .fold(ScanOutcome::default(), |mut acc, (i, file)| {
            match parse_note(&file) {
                Ok(doc) => acc.documents.push(doc),
                Err(err) => {
                    tracing::warn!(path = %file.path, error = %err, "skipping unparsable note");
                    acc.skipped.push(SkippedFile {
                        path: file.path,
                        reason: err.to_string(),
                    });
                }
            }
            progress.report(IndexProgressEvent::Indexing {
                current: i as u64 + 1,
                total,
            });
            acc
        });
    outcome.documents.sort_by(|a, b| a.path.cmp(&b.path));
    outcome
}

/// Parse one note into a document.
pub fn parse_note(file: &VaultFile) -> Result<VaultDocument, ContextError> {
    let text = std::str::from_utf8(&file.bytes)
        .map_err(|e| ContextError::parse(&file.path, format!("not valid UTF-8: {}", e)))?;
    let (fm, body) = split_frontmatter(text).map_err(|m| ContextError::parse(&file.path, m))?;

    let title = fm
        .title
        .clone()
        .or_else(|| first_heading(body))
        .unwrap_or_else(|| file_stem(&file.path));

    let tags: BTreeSet<String> = fm
        .tags
        .iter()
        .map(|t| t.to_lowercase())
        .chain(inline_tags(body))
        .collect();

    Ok(VaultDocument {
        path: file.path.clone(),
        title,
        content: body.to_string(),
        tags,
        attendees: fm.attendees,
        modified_at: file.modified_at,
    })
}

fn file_stem(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => name[..dot].to_string(),
        _ => name.to_string(),
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, ContextError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ContextError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ContextError::InvalidPattern {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}
