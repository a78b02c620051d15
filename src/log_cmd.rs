//! `rrc log`: print (and optionally export) the audit log, newest first.

use anyhow::Result;
use std::path::Path;

use resume_relevance_core::models::LogEntry;
use resume_relevance_core::store::list_logs;

use crate::config::Config;
use crate::export::{self, ExportRow};
use crate::sqlite_store::SqliteLogStore;

pub async fn run_log(config: &Config, limit: Option<usize>, csv: Option<&Path>) -> Result<()> {
    let store = SqliteLogStore::open(config).await?;
    let mut entries = list_logs(&store).await?;
    store.close().await;

    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    if entries.is_empty() {
        println!("No scored resumes recorded.");
    } else {
        print_entries(&entries);
    }

    if let Some(path) = csv {
        let rows: Vec<ExportRow> = entries.iter().map(ExportRow::from).collect();
        export::export_log_csv(path, &rows)?;
        eprintln!("Wrote {} rows to {}", rows.len(), path.display());
    }
    Ok(())
}

fn print_entries(entries: &[LogEntry]) {
    println!(
        "{:>5}  {:<19}  {:<28} {:>7} {:>8} {:>7}  {}",
        "ID", "CREATED", "RESUME", "HARD", "SEMANTIC", "FINAL", "VERDICT"
    );
    println!("{}", "-".repeat(96));
    for e in entries {
        println!(
            "{:>5}  {:<19}  {:<28} {:>7.2} {:>8.2} {:>7.2}  {}",
            e.id,
            e.created_at.format("%Y-%m-%d %H:%M:%S"),
            e.resume_name,
            e.hard_score,
            e.semantic_score,
            e.final_score,
            e.verdict
        );
    }
}
