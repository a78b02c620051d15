//! Database schema migrations (idempotent).
//!
//! ```text
//! resume_logs
//!   id                INTEGER PRIMARY KEY AUTOINCREMENT
//!   resume_name       TEXT NOT NULL
//!   hard_score        REAL NOT NULL
//!   semantic_score    REAL NOT NULL
//!   final_score       REAL NOT NULL
//!   verdict           TEXT NOT NULL   -- High | Medium | Low
//!   missing_keywords  TEXT            -- comma-space-joined
//!   created_at        TEXT NOT NULL   -- assigned by SQLite on insert (RFC 3339, ms)
//! ```

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Open the configured database and bring its schema up to date.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Apply the schema to an already-open pool.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS resume_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            resume_name TEXT NOT NULL,
            hard_score REAL NOT NULL,
            semantic_score REAL NOT NULL,
            final_score REAL NOT NULL,
            verdict TEXT NOT NULL CHECK (verdict IN ('High', 'Medium', 'Low')),
            missing_keywords TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_resume_logs_created_at ON resume_logs(created_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
