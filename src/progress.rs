//! Indexing progress reporting.
//!
//! An index build moves through `scanning → indexing → complete | error`.
//! The engine reports each transition to an [`IndexProgressReporter`] passed
//! into [`index_vault`](crate::engine::ContextIndexer::index_vault); there is
//! no global event bus. Closures implement the trait, so a UI bridge can
//! forward events with `&|event| tx.send(event)`.
//!
//! The CLI reporters write to **stderr** so stdout stays parseable.

use serde::Serialize;
use std::io::Write;

/// A single progress event for an index build.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "lowercase")]
pub enum IndexProgressEvent {
    /// Walking the vault. Total unknown until the walk finishes.
    Scanning { current: u64 },
    /// Parsing and indexing notes: `current` of `total` files.
    Indexing { current: u64, total: u64 },
    /// The new snapshot is active.
    Complete { total_documents: u64, skipped: u64 },
    /// The build failed; the previous snapshot (if any) stays active.
    Error { error: String },
}

impl IndexProgressEvent {
    pub fn stage(&self) -> &'static str {
        match self {
            IndexProgressEvent::Scanning { .. } => "scanning",
            IndexProgressEvent::Indexing { .. } => "indexing",
            IndexProgressEvent::Complete { .. } => "complete",
            IndexProgressEvent::Error { .. } => "error",
        }
    }
}

/// Receives progress events from the indexer.
pub trait IndexProgressReporter: Send + Sync {
    fn report(&self, event: IndexProgressEvent);
}

impl<F> IndexProgressReporter for F
where
    F: Fn(IndexProgressEvent) + Send + Sync,
{
    fn report(&self, event: IndexProgressEvent) {
        self(event)
    }
}

/// Human-friendly progress on stderr: "index  indexing  1,234 / 5,000 notes".
pub struct StderrProgress;

impl IndexProgressReporter for StderrProgress {
    fn report(&self, event: IndexProgressEvent) {
        let line = match &event {
            // One line per file would flood the terminal.
            IndexProgressEvent::Scanning { current } if current % 500 != 0 => return,
            IndexProgressEvent::Scanning { current } => {
                format!("index  scanning  {} files\n", format_number(*current))
            }
            IndexProgressEvent::Indexing { current, total }
                if current % 500 != 0 && current != total =>
            {
                return
            }
            IndexProgressEvent::Indexing { current, total } => format!(
                "index  indexing  {} / {} notes\n",
                format_number(*current),
                format_number(*total)
            ),
            IndexProgressEvent::Complete {
                total_documents,
                skipped,
            } => format!(
                "index  complete  {} notes ({} skipped)\n",
                format_number(*total_documents),
                format_number(*skipped)
            ),
            IndexProgressEvent::Error { error } => format!("index  error  {}\n", error),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl IndexProgressReporter for JsonProgress {
    fn report(&self, event: IndexProgressEvent) {
        let obj = serde_json::json!({ "event": "progress", "progress": event });
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl IndexProgressReporter for NoProgress {
    fn report(&self, _event: IndexProgressEvent) {}
}

pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn IndexProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn closures_are_reporters() {
        let seen = Mutex::new(Vec::new());
        let reporter = |e: IndexProgressEvent| seen.lock().unwrap().push(e.stage());
        reporter.report(IndexProgressEvent::Scanning { current: 1 });
        reporter.report(IndexProgressEvent::Complete {
            total_documents: 1,
            skipped: 0,
        });
        assert_eq!(*seen.lock().unwrap(), vec!["scanning", "complete"]);
    }

    #[test]
    fn events_serialize_with_stage_tag() {
        let json = serde_json::to_value(IndexProgressEvent::Indexing {
            current: 2,
            total: 5,
        })
        .unwrap();
        assert_eq!(json["stage"], "indexing");
        assert_eq!(json["current"], 2);
        assert_eq!(json["total"], 5);
    }
}
