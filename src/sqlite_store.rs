//! SQLite-backed [`LogStore`] implementation.
//!
//! Rows are appended to `resume_logs` (see [`crate::migrate`]). The id and
//! the `created_at` timestamp are assigned by SQLite and read back with
//! `INSERT … RETURNING`, so the returned [`LogEntry`] is exactly what a later
//! [`LogStore::list`] will produce.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use resume_relevance_core::models::{LogEntry, NewLogEntry, Verdict};
use resume_relevance_core::store::LogStore;

use crate::config::Config;
use crate::{db, migrate};

pub struct SqliteLogStore {
    pool: SqlitePool,
}

impl SqliteLogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database, migrating the schema if needed.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::migrate_pool(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn parse_created_at(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid created_at timestamp: '{}'", raw))?
        .with_timezone(&Utc))
}

fn row_to_entry(row: &SqliteRow) -> Result<LogEntry> {
    let verdict: String = row.get("verdict");
    let created_at: String = row.get("created_at");
    let missing: Option<String> = row.get("missing_keywords");

    Ok(LogEntry {
        id: row.get("id"),
        resume_name: row.get("resume_name"),
        hard_score: row.get("hard_score"),
        semantic_score: row.get("semantic_score"),
        final_score: row.get("final_score"),
        verdict: verdict.parse::<Verdict>().map_err(anyhow::Error::msg)?,
        missing_keywords: missing.unwrap_or_default(),
        created_at: parse_created_at(&created_at)?,
    })
}

#[async_trait]
impl LogStore for SqliteLogStore {
    async fn append(&self, entry: &NewLogEntry) -> Result<LogEntry> {
        let row = sqlx::query(
            r#"
            INSERT INTO resume_logs (resume_name, hard_score, semantic_score, final_score,
                                     verdict, missing_keywords)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, created_at
            "#,
        )
        .bind(&entry.resume_name)
        .bind(entry.hard_score)
        .bind(entry.semantic_score)
        .bind(entry.final_score)
        .bind(entry.verdict.as_str())
        .bind(&entry.missing_keywords)
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = row.get("id");
        let created_at: String = row.get("created_at");
        tracing::debug!(id, resume = %entry.resume_name, "log entry recorded");

        Ok(LogEntry {
            id,
            resume_name: entry.resume_name.clone(),
            hard_score: entry.hard_score,
            semantic_score: entry.semantic_score,
            final_score: entry.final_score,
            verdict: entry.verdict,
            missing_keywords: entry.missing_keywords.clone(),
            created_at: parse_created_at(&created_at)?,
        })
    }

    async fn list(&self) -> Result<Vec<LogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, resume_name, hard_score, semantic_score, final_score,
                   verdict, missing_keywords, created_at
            FROM resume_logs
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }
}
