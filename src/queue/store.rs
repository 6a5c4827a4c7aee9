//! Queue Store contract: the durable collection backing the Queue Engine.
//! Implementations must make [`QueueStore::try_claim_one`] linearizable;
//! everything else needs only single-row write atomicity.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Error;

use super::item::{NewQueueItem, QueueItem, QueueStatus};

#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Inserts a new PENDING item. Returns `Ok(false)` on a uniqueness
    /// conflict, never `Error::Duplicate` — the
    /// caller (Queue Engine) decides what a `false` return means.
    async fn insert(&self, item: NewQueueItem, now: DateTime<Utc>) -> Result<bool, Error>;

    /// Attempts one atomic PENDING -> PROCESSING claim of the
    /// oldest-by-`created_at` (then oldest-by-id) pending candidate.
    /// Returns `Ok(None)` when no PENDING rows remain.
    async fn try_claim_one(&self, now: DateTime<Utc>) -> Result<Option<QueueItem>, Error>;

    /// Transitions a PROCESSING item to COMPLETED. No-op (`Ok(false)`) if
    /// the item is not currently PROCESSING or does not exist.
    async fn complete(&self, unique_id: &str, now: DateTime<Utc>) -> Result<bool, Error>;

    /// Transitions a PROCESSING item to FAILED, incrementing `retry_count`.
    /// No-op (`Ok(false)`) if the item is not currently PROCESSING.
    async fn fail(&self, unique_id: &str, error_message: &str, now: DateTime<Utc>) -> Result<bool, Error>;

    /// Moves every FAILED item with `retry_count < max_retries` back to
    /// PENDING. Returns the number of items moved.
    async fn retry_eligible(&self, max_retries: i64, now: DateTime<Utc>) -> Result<u64, Error>;

    /// True iff any row (in any status) exists with `unique_id`.
    async fn is_duplicate(&self, unique_id: &str) -> Result<bool, Error>;

    /// Snapshot of counts per status. Individual counts may not be mutually
    /// consistent under concurrent writers.
    async fn status_counts(&self) -> Result<HashMap<QueueStatus, i64>, Error>;

    /// Deletes COMPLETED rows with `updated_at < threshold`. Returns the
    /// number deleted.
    async fn clean(&self, threshold: DateTime<Utc>) -> Result<u64, Error>;

    /// Sweeps PROCESSING rows with `claimed_at < threshold` back to
    /// PENDING, incrementing `retry_count`. Returns the number swept.
    async fn sweep_stuck(&self, threshold: DateTime<Utc>, now: DateTime<Utc>) -> Result<u64, Error>;

    async fn get(&self, unique_id: &str) -> Result<Option<QueueItem>, Error>;
}
