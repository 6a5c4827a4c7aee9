//! SQLite-backed Published Set.
//!
//! Kept as a dedicated table rather than derived from Queue Store's
//! COMPLETED rows: Queue Store rows are periodically `clean`ed (default
//! 7-day retention), but Enqueue Service's `is published already?` check
//! has no such horizon and must survive the queue row's deletion.

use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use crate::db::Database;
use crate::error::Error;

use super::store::PublishedSet;

#[derive(Debug, Clone)]
pub struct SqlitePublishedSet {
    db: Database,
}

impl SqlitePublishedSet {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PublishedSet for SqlitePublishedSet {
    #[instrument(skip(self))]
    async fn contains(&self, unique_id: &str) -> Result<bool, Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM published_articles WHERE unique_id = ?")
                .bind(unique_id)
                .fetch_one(self.db.pool())
                .await?;
        Ok(row.0 > 0)
    }

    #[instrument(skip(self))]
    async fn add(&self, unique_id: &str) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO published_articles (unique_id, published_at) VALUES (?, ?)
             ON CONFLICT(unique_id) DO NOTHING",
        )
        .bind(unique_id)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_is_idempotent() {
        let db = Database::new_in_memory().await.unwrap();
        let set = SqlitePublishedSet::new(db);

        set.add("YTN_1").await.unwrap();
        set.add("YTN_1").await.unwrap();
        assert!(set.contains("YTN_1").await.unwrap());
        assert!(!set.contains("YTN_2").await.unwrap());
    }
}
