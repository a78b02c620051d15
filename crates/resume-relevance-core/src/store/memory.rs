//! In-memory [`LogStore`] implementation for tests.
//!
//! Rows live in a `Vec` behind `std::sync::RwLock`; ids count up from 1.

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use crate::models::{LogEntry, NewLogEntry};

use super::LogStore;

pub struct InMemoryLogStore {
    rows: RwLock<Vec<LogEntry>>,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogStore for InMemoryLogStore {
    async fn append(&self, entry: &NewLogEntry) -> Result<LogEntry> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| anyhow::anyhow!("log store lock poisoned"))?;
        let row = LogEntry {
            id: rows.len() as i64 + 1,
            resume_name: entry.resume_name.clone(),
            hard_score: entry.hard_score,
            semantic_score: entry.semantic_score,
            final_score: entry.final_score,
            verdict: entry.verdict,
            missing_keywords: entry.missing_keywords.clone(),
            created_at: Utc::now(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<LogEntry>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| anyhow::anyhow!("log store lock poisoned"))?;
        let mut out = rows.clone();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }
}
