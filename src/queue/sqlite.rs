//! SQLite-backed Queue Store.
//!
//! `try_claim_one` is a single `UPDATE ... WHERE id = (SELECT ...) AND
//! status = 'pending' RETURNING *` statement rather than a literal
//! select-then-compare-and-swap round trip. SQLite serializes writers, so
//! the subquery's snapshot and the guard clause observe the same state —
//! this is equivalent to (and cheaper than) the explicit retry loop the
//! in-memory backend performs under its own mutex.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::db::Database;
use crate::error::{truncate_message, Error};

use super::item::{NewQueueItem, QueueItem, QueueStatus};
use super::store::QueueStore;

const MAX_ERROR_MESSAGE_LEN: usize = 1024;

#[derive(Debug, Clone)]
pub struct SqliteQueueStore {
    db: Database,
}

impl SqliteQueueStore {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    #[instrument(skip(self, item), fields(unique_id = %item.unique_id))]
    async fn insert(&self, item: NewQueueItem, now: DateTime<Utc>) -> Result<bool, Error> {
        let result = sqlx::query(
            r"INSERT INTO queue (
                unique_id, article_id, platform, title, url, content, category,
                published_at, status, retry_count, created_at, updated_at
              ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
              ON CONFLICT(unique_id) DO NOTHING",
        )
        .bind(&item.unique_id)
        .bind(&item.article_id)
        .bind(&item.platform)
        .bind(&item.title)
        .bind(&item.url)
        .bind(&item.content)
        .bind(&item.category)
        .bind(item.published_at)
        .bind(QueueStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn try_claim_one(&self, now: DateTime<Utc>) -> Result<Option<QueueItem>, Error> {
        let item = sqlx::query_as::<_, QueueItem>(
            r"UPDATE queue
              SET status = ?, claimed_at = ?, updated_at = ?
              WHERE id = (
                  SELECT id FROM queue
                  WHERE status = ?
                  ORDER BY created_at ASC, id ASC
                  LIMIT 1
              )
              AND status = ?
              RETURNING *",
        )
        .bind(QueueStatus::Processing.as_str())
        .bind(now)
        .bind(now)
        .bind(QueueStatus::Pending.as_str())
        .bind(QueueStatus::Pending.as_str())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(item)
    }

    #[instrument(skip(self))]
    async fn complete(&self, unique_id: &str, now: DateTime<Utc>) -> Result<bool, Error> {
        let result = sqlx::query(
            r"UPDATE queue
              SET status = ?, published_at = ?, updated_at = ?, error_message = NULL
              WHERE unique_id = ? AND status = ?",
        )
        .bind(QueueStatus::Completed.as_str())
        .bind(now)
        .bind(now)
        .bind(unique_id)
        .bind(QueueStatus::Processing.as_str())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, error_message))]
    async fn fail(&self, unique_id: &str, error_message: &str, now: DateTime<Utc>) -> Result<bool, Error> {
        let truncated = truncate_message(error_message, MAX_ERROR_MESSAGE_LEN);
        let result = sqlx::query(
            r"UPDATE queue
              SET status = ?, error_message = ?, retry_count = retry_count + 1, updated_at = ?
              WHERE unique_id = ? AND status = ?",
        )
        .bind(QueueStatus::Failed.as_str())
        .bind(truncated)
        .bind(now)
        .bind(unique_id)
        .bind(QueueStatus::Processing.as_str())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn retry_eligible(&self, max_retries: i64, now: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query(
            r"UPDATE queue
              SET status = ?, error_message = NULL, updated_at = ?
              WHERE status = ? AND retry_count < ?",
        )
        .bind(QueueStatus::Pending.as_str())
        .bind(now)
        .bind(QueueStatus::Failed.as_str())
        .bind(max_retries)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn is_duplicate(&self, unique_id: &str) -> Result<bool, Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM queue WHERE unique_id = ?")
            .bind(unique_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(row.0 > 0)
    }

    #[instrument(skip(self))]
    async fn status_counts(&self) -> Result<HashMap<QueueStatus, i64>, Error> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM queue GROUP BY status")
                .fetch_all(self.db.pool())
                .await?;

        let mut counts: HashMap<QueueStatus, i64> =
            QueueStatus::all().into_iter().map(|s| (s, 0)).collect();
        for (status, count) in rows {
            if let Ok(status) = status.parse::<QueueStatus>() {
                counts.insert(status, count);
            }
        }
        Ok(counts)
    }

    #[instrument(skip(self))]
    async fn clean(&self, threshold: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM queue WHERE status = ? AND updated_at < ?")
            .bind(QueueStatus::Completed.as_str())
            .bind(threshold)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn sweep_stuck(&self, threshold: DateTime<Utc>, now: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query(
            r"UPDATE queue
              SET status = ?, retry_count = retry_count + 1, updated_at = ?
              WHERE status = ? AND claimed_at < ?",
        )
        .bind(QueueStatus::Pending.as_str())
        .bind(now)
        .bind(QueueStatus::Processing.as_str())
        .bind(threshold)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn get(&self, unique_id: &str) -> Result<Option<QueueItem>, Error> {
        let item = sqlx::query_as::<_, QueueItem>("SELECT * FROM queue WHERE unique_id = ?")
            .bind(unique_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(item)
    }
}
