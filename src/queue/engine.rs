//! Queue Engine: the state machine over queue items.
//!
//! This is the hardest subsystem in the pipeline. Every public method here
//! corresponds 1:1 to a transition in the queue item lifecycle: enqueue,
//! claim, complete, fail, retry, clean.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::error::Error;

use super::item::{NewQueueItem, QueueItem, QueueStatus};
use super::store::QueueStore;

/// State machine over [`QueueItem`]s, backed by a [`QueueStore`].
#[derive(Clone)]
pub struct QueueEngine {
    store: Arc<dyn QueueStore>,
}

impl QueueEngine {
    #[must_use]
    pub fn new(store: Arc<dyn QueueStore>) -> Self {
        Self { store }
    }

    /// Inserts `item` as PENDING. Returns `true` if inserted, `false` on a
    /// uniqueness conflict.
    ///
    /// # Errors
    ///
    /// `Error::Storage` if the underlying store refused the write.
    #[instrument(skip(self, item), fields(unique_id = %item.unique_id))]
    pub async fn enqueue(&self, item: NewQueueItem) -> Result<bool, Error> {
        self.store.insert(item, Utc::now()).await
    }

    /// Atomically claims up to `limit` PENDING items, FIFO by `created_at`
    /// (ties broken by insertion id). The returned list may be shorter than
    /// `limit` when fewer PENDING items exist. No two concurrent callers
    /// ever observe the same item.
    ///
    /// # Errors
    ///
    /// `Error::Storage` if the underlying store refused a claim attempt.
    #[instrument(skip(self))]
    pub async fn claim(&self, limit: usize) -> Result<Vec<QueueItem>, Error> {
        let mut claimed = Vec::with_capacity(limit);
        for _ in 0..limit {
            match self.store.try_claim_one(Utc::now()).await? {
                Some(item) => claimed.push(item),
                None => break,
            }
        }
        Ok(claimed)
    }

    /// Transitions a PROCESSING item to COMPLETED. Returns `false` (no-op)
    /// if the item is not currently PROCESSING.
    ///
    /// # Errors
    ///
    /// `Error::Storage` if the underlying store refused the update.
    #[instrument(skip(self))]
    pub async fn complete(&self, unique_id: &str) -> Result<bool, Error> {
        self.store.complete(unique_id, Utc::now()).await
    }

    /// Transitions a PROCESSING item to FAILED, incrementing `retry_count`.
    /// `error_message` is truncated to a bounded length. Returns `false`
    /// (no-op) if the item is not currently PROCESSING — including a
    /// second `fail` call on an item that is already FAILED.
    ///
    /// # Errors
    ///
    /// `Error::Storage` if the underlying store refused the update.
    #[instrument(skip(self, error_message))]
    pub async fn fail(&self, unique_id: &str, error_message: &str) -> Result<bool, Error> {
        self.store.fail(unique_id, error_message, Utc::now()).await
    }

    /// Moves every FAILED item with `retry_count < max_retries` back to
    /// PENDING (`retry_count` itself is not decremented). Returns the
    /// number of items moved.
    ///
    /// # Errors
    ///
    /// `Error::Storage` if the underlying store refused the update.
    #[instrument(skip(self))]
    pub async fn retry(&self, max_retries: u32) -> Result<u64, Error> {
        self.store.retry_eligible(i64::from(max_retries), Utc::now()).await
    }

    /// True iff any row (in any status) exists with `unique_id`.
    ///
    /// # Errors
    ///
    /// `Error::Storage` if the underlying store refused the read.
    #[instrument(skip(self))]
    pub async fn is_duplicate(&self, unique_id: &str) -> Result<bool, Error> {
        self.store.is_duplicate(unique_id).await
    }

    /// Snapshot of counts per status. Individual counts may not be
    /// mutually consistent under concurrent writers.
    ///
    /// # Errors
    ///
    /// `Error::Storage` if the underlying store refused the read.
    #[instrument(skip(self))]
    pub async fn status(&self) -> Result<HashMap<QueueStatus, i64>, Error> {
        self.store.status_counts().await
    }

    /// Deletes COMPLETED rows older than `age`. Never touches other
    /// statuses. Returns the number deleted.
    ///
    /// # Errors
    ///
    /// `Error::Storage` if the underlying store refused the delete.
    #[instrument(skip(self))]
    pub async fn clean(&self, age: std::time::Duration) -> Result<u64, Error> {
        let threshold = Utc::now() - chrono::Duration::from_std(age).unwrap_or(chrono::Duration::zero());
        self.store.clean(threshold).await
    }

    /// Sweeps PROCESSING rows claimed more than `stuck_threshold` ago back
    /// to PENDING, incrementing `retry_count`. Returns the number swept.
    ///
    /// # Errors
    ///
    /// `Error::Storage` if the underlying store refused the update.
    #[instrument(skip(self))]
    pub async fn sweep_stuck(&self, stuck_threshold: std::time::Duration) -> Result<u64, Error> {
        let now = Utc::now();
        let threshold =
            now - chrono::Duration::from_std(stuck_threshold).unwrap_or(chrono::Duration::zero());
        self.store.sweep_stuck(threshold, now).await
    }

    /// Looks up a single item by its business key, for inspection/tests.
    ///
    /// # Errors
    ///
    /// `Error::Storage` if the underlying store refused the read.
    pub async fn get(&self, unique_id: &str) -> Result<Option<QueueItem>, Error> {
        self.store.get(unique_id).await
    }
}
