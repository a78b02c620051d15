//! CSV export of scored batches, matrix runs, and the audit log.
//!
//! Every writer emits a header row even when there are no data rows, so an
//! empty export is still a valid CSV with the expected columns.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use resume_relevance_core::models::{LogEntry, MatchResult};

use crate::batch::ScoredResume;

/// Missing keywords kept per row in a matrix export.
pub const MATRIX_MISSING_LIMIT: usize = 20;

const LOG_HEADER: [&str; 8] = [
    "id",
    "resume_name",
    "hard_score",
    "semantic_score",
    "final_score",
    "verdict",
    "missing_keywords",
    "created_at",
];

const MATRIX_HEADER: [&str; 7] = [
    "jd_file",
    "resume_file",
    "hard_score",
    "semantic_score",
    "final_score",
    "verdict",
    "missing_keywords",
];

/// One row mirroring `resume_logs`. `id` and `created_at` are empty for
/// results that were not recorded.
#[derive(Debug, Serialize)]
pub struct ExportRow {
    pub id: Option<i64>,
    pub resume_name: String,
    pub hard_score: f64,
    pub semantic_score: f64,
    pub final_score: f64,
    pub verdict: String,
    pub missing_keywords: String,
    pub created_at: Option<String>,
}

impl From<&LogEntry> for ExportRow {
    fn from(entry: &LogEntry) -> Self {
        Self {
            id: Some(entry.id),
            resume_name: entry.resume_name.clone(),
            hard_score: entry.hard_score,
            semantic_score: entry.semantic_score,
            final_score: entry.final_score,
            verdict: entry.verdict.to_string(),
            missing_keywords: entry.missing_keywords.clone(),
            created_at: Some(entry.created_at.to_rfc3339()),
        }
    }
}

impl From<&ScoredResume> for ExportRow {
    fn from(scored: &ScoredResume) -> Self {
        match &scored.entry {
            Some(entry) => entry.into(),
            None => Self {
                id: None,
                resume_name: scored.name.clone(),
                hard_score: scored.result.hard_score,
                semantic_score: scored.result.semantic_score,
                final_score: scored.result.final_score,
                verdict: scored.result.verdict.to_string(),
                missing_keywords: scored.result.missing_keywords_joined(),
                created_at: None,
            },
        }
    }
}

/// One (job description, resume) pair from `rrc matrix`.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixRow {
    pub jd_file: String,
    pub resume_file: String,
    pub hard_score: f64,
    pub semantic_score: f64,
    pub final_score: f64,
    pub verdict: String,
    pub missing_keywords: String,
}

impl MatrixRow {
    pub fn new(jd_file: &str, resume_file: &str, result: &MatchResult) -> Self {
        let missing: Vec<&str> = result
            .missing_keywords
            .iter()
            .take(MATRIX_MISSING_LIMIT)
            .map(String::as_str)
            .collect();
        Self {
            jd_file: jd_file.to_string(),
            resume_file: resume_file.to_string(),
            hard_score: result.hard_score,
            semantic_score: result.semantic_score,
            final_score: result.final_score,
            verdict: result.verdict.to_string(),
            missing_keywords: missing.join(", "),
        }
    }
}

fn write_with_header<W: Write, T: Serialize>(writer: W, header: &[&str], rows: &[T]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(header)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_log_rows<W: Write>(writer: W, rows: &[ExportRow]) -> Result<()> {
    write_with_header(writer, &LOG_HEADER, rows)
}

pub fn write_matrix_rows<W: Write>(writer: W, rows: &[MatrixRow]) -> Result<()> {
    write_with_header(writer, &MATRIX_HEADER, rows)
}

fn create_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))
}

/// Write log-shaped rows to `path`, creating parent directories.
pub fn export_log_csv(path: &Path, rows: &[ExportRow]) -> Result<()> {
    write_log_rows(create_file(path)?, rows)?;
    tracing::info!(rows = rows.len(), path = %path.display(), "exported CSV");
    Ok(())
}

/// Write matrix rows to `path`, creating parent directories.
pub fn export_matrix_csv(path: &Path, rows: &[MatrixRow]) -> Result<()> {
    write_matrix_rows(create_file(path)?, rows)?;
    tracing::info!(rows = rows.len(), path = %path.display(), "exported CSV");
    Ok(())
}
