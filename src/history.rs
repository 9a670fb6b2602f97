//! Append-only question/answer log.
//!
//! Records are never updated or evicted. Timestamps are stored as
//! fixed-width RFC 3339 strings (UTC, microseconds) so that text order is
//! chronological order.

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};

use crate::models::QueryRecord;

#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    /// Wraps a pool whose schema has already been migrated.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, question: &str, answer: &str) -> Result<i64> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let result = sqlx::query(
            "INSERT INTO queries (query_text, response_text, created_at) VALUES (?, ?, ?)",
        )
        .bind(question)
        .bind(answer)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Most recent records first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<QueryRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, query_text, response_text, created_at
            FROM queries
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| QueryRecord {
                id: row.get("id"),
                question: row.get("query_text"),
                answer: row.get("response_text"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    pub async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queries")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
