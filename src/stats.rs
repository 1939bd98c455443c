//! Vault statistics.
//!
//! Indexes the vault and prints a quick summary of what a query would see:
//! note, term and tag counts, skipped files, and how fresh the newest note is.
//! Used by `prep stats` to confirm the vault path and globs pick up the
//! expected notes.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::index_cmd::index_from_config;
use crate::progress::IndexProgressReporter;

/// Run the stats command: index the vault and print a summary.
pub fn run_stats(config: &Config, progress: &dyn IndexProgressReporter) -> Result<()> {
    let (_, stats) = index_from_config(config, progress)?;

    println!("Prep Context — Vault Stats");
    println!("==========================");
    println!();
    println!("  Vault:       {}", config.vault.root.display());
    println!();
    println!("  Notes:       {}", stats.total_documents);
    println!("  Skipped:     {}", stats.skipped_files);
    println!("  Terms:       {}", stats.total_terms);
    println!("  Tags:        {}", stats.total_tags);
    println!(
        "  Newest note: {}",
        stats
            .newest_modified_at
            .map(|ts| format_ts_relative(ts, Utc::now()))
            .unwrap_or_else(|| "none".to_string())
    );
    println!();

    Ok(())
}

/// Format a timestamp relative to `now` (e.g. "3 hours ago").
fn format_ts_relative(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = (now - ts).num_seconds();

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn relative_times() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(format_ts_relative(now, now), "just now");
        assert_eq!(format_ts_relative(now - Duration::minutes(1), now), "1 min ago");
        assert_eq!(format_ts_relative(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(format_ts_relative(now - Duration::days(2), now), "2 days ago");
        assert_eq!(
            format_ts_relative(now - Duration::days(45), now),
            "2024-04-17 12:00"
        );
        assert_eq!(
            format_ts_relative(now + Duration::hours(1), now),
            "2024-06-01 13:00"
        );
    }
}
