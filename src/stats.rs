//! Audit log summary for `rrc stats`.
//!
//! Counts per verdict and mean scores over every recorded resume, plus the
//! database size and the time of the most recent entry.

use anyhow::Result;
use chrono::{DateTime, Utc};

use resume_relevance_core::models::{LogEntry, Verdict};
use resume_relevance_core::store::{list_logs, LogStore};

use crate::config::Config;
use crate::sqlite_store::SqliteLogStore;

#[derive(Debug, Default, PartialEq)]
pub struct LogStats {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub mean_hard: f64,
    pub mean_semantic: f64,
    pub mean_final: f64,
    pub latest: Option<DateTime<Utc>>,
}

impl LogStats {
    pub fn from_entries(entries: &[LogEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }

        let mut stats = Self {
            total: entries.len(),
            ..Self::default()
        };
        let (mut hard, mut semantic, mut fin) = (0.0, 0.0, 0.0);
        for e in entries {
            match e.verdict {
                Verdict::High => stats.high += 1,
                Verdict::Medium => stats.medium += 1,
                Verdict::Low => stats.low += 1,
            }
            hard += e.hard_score;
            semantic += e.semantic_score;
            fin += e.final_score;
            if stats.latest.map_or(true, |t| e.created_at > t) {
                stats.latest = Some(e.created_at);
            }
        }

        let n = entries.len() as f64;
        stats.mean_hard = hard / n;
        stats.mean_semantic = semantic / n;
        stats.mean_final = fin / n;
        stats
    }

    pub async fn collect<S: LogStore + ?Sized>(store: &S) -> Result<Self> {
        Ok(Self::from_entries(&list_logs(store).await?))
    }
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = SqliteLogStore::open(config).await?;
    let stats = LogStats::collect(&store).await?;
    store.close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Resume Relevance — Audit Log Stats");
    println!("==================================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Scored:      {}", stats.total);
    println!("  High:        {}", stats.high);
    println!("  Medium:      {}", stats.medium);
    println!("  Low:         {}", stats.low);

    if stats.total > 0 {
        println!();
        println!("  Mean hard:      {:>6.2}", stats.mean_hard);
        println!("  Mean semantic:  {:>6.2}", stats.mean_semantic);
        println!("  Mean final:     {:>6.2}", stats.mean_final);
        if let Some(latest) = stats.latest {
            println!();
            println!("  Last scored: {}", latest.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
