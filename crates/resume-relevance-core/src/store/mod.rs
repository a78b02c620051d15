//! Append-only audit log of scored resumes.
//!
//! The [`LogStore`] trait is the only way the pipeline touches persistence.
//! There are no update or delete operations: a row is written once per
//! scored resume and then only read.
//!
//! | Implementation | Crate |
//! |----------------|-------|
//! | [`memory::InMemoryLogStore`] | core (tests) |
//! | `SqliteLogStore` | `resume-relevance` |

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{LogEntry, MatchResult, NewLogEntry};

/// Storage backend for the audit log.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Append one row. The store assigns `id` and `created_at`.
    async fn append(&self, entry: &NewLogEntry) -> Result<LogEntry>;

    /// All rows, newest first (ties broken by id, highest first).
    async fn list(&self) -> Result<Vec<LogEntry>>;
}

/// Persist one scored resume.
pub async fn record<S: LogStore + ?Sized>(
    store: &S,
    resume_name: &str,
    result: &MatchResult,
) -> Result<LogEntry> {
    store
        .append(&NewLogEntry::from_result(resume_name, result))
        .await
}

/// Read the whole log, newest first.
pub async fn list_logs<S: LogStore + ?Sized>(store: &S) -> Result<Vec<LogEntry>> {
    store.list().await
}
