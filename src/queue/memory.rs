//! In-memory Queue Store, used by tests and embedded/standalone runs.
//!
//! `try_claim_one` performs the literal "find oldest pending candidate,
//! then compare-and-swap its status" sequence under a single
//! `tokio::sync::Mutex` critical section — the lock itself provides the
//! linearizability the SQL backend gets from its guarded `UPDATE`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::{truncate_message, Error};

use super::item::{NewQueueItem, QueueItem, QueueStatus};
use super::store::QueueStore;

const MAX_ERROR_MESSAGE_LEN: usize = 1024;

#[derive(Debug, Default)]
struct Inner {
    items: HashMap<String, QueueItem>,
    next_id: i64,
}

#[derive(Debug, Default)]
pub struct InMemoryQueueStore {
    inner: Mutex<Inner>,
}

impl InMemoryQueueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn insert(&self, item: NewQueueItem, now: DateTime<Utc>) -> Result<bool, Error> {
        let mut inner = self.inner.lock().await;
        if inner.items.contains_key(&item.unique_id) {
            return Ok(false);
        }
        inner.next_id += 1;
        let id = inner.next_id;
        inner.items.insert(
            item.unique_id.clone(),
            QueueItem {
                id,
                unique_id: item.unique_id,
                article_id: item.article_id,
                platform: item.platform,
                title: item.title,
                url: item.url,
                content: item.content,
                category: item.category,
                published_at: item.published_at,
                status_str: QueueStatus::Pending.as_str().to_string(),
                retry_count: 0,
                error_message: None,
                created_at: now,
                updated_at: now,
                claimed_at: None,
            },
        );
        Ok(true)
    }

    async fn try_claim_one(&self, now: DateTime<Utc>) -> Result<Option<QueueItem>, Error> {
        let mut inner = self.inner.lock().await;
        let candidate_unique_id = inner
            .items
            .values()
            .filter(|item| item.status() == QueueStatus::Pending)
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .map(|item| item.unique_id.clone());

        let Some(unique_id) = candidate_unique_id else {
            return Ok(None);
        };

        let Some(item) = inner.items.get_mut(&unique_id) else {
            return Ok(None);
        };
        item.status_str = QueueStatus::Processing.as_str().to_string();
        item.claimed_at = Some(now);
        item.updated_at = now;
        Ok(Some(item.clone()))
    }

    async fn complete(&self, unique_id: &str, now: DateTime<Utc>) -> Result<bool, Error> {
        let mut inner = self.inner.lock().await;
        let Some(item) = inner.items.get_mut(unique_id) else {
            return Ok(false);
        };
        if item.status() != QueueStatus::Processing {
            return Ok(false);
        }
        item.status_str = QueueStatus::Completed.as_str().to_string();
        item.published_at = Some(now);
        item.updated_at = now;
        item.error_message = None;
        Ok(true)
    }

    async fn fail(&self, unique_id: &str, error_message: &str, now: DateTime<Utc>) -> Result<bool, Error> {
        let mut inner = self.inner.lock().await;
        let Some(item) = inner.items.get_mut(unique_id) else {
            return Ok(false);
        };
        if item.status() != QueueStatus::Processing {
            return Ok(false);
        }
        item.status_str = QueueStatus::Failed.as_str().to_string();
        item.error_message = Some(truncate_message(error_message, MAX_ERROR_MESSAGE_LEN));
        item.retry_count += 1;
        item.updated_at = now;
        Ok(true)
    }

    async fn retry_eligible(&self, max_retries: i64, now: DateTime<Utc>) -> Result<u64, Error> {
        let mut inner = self.inner.lock().await;
        let mut moved = 0u64;
        for item in inner.items.values_mut() {
            if item.status() == QueueStatus::Failed && item.retry_count < max_retries {
                item.status_str = QueueStatus::Pending.as_str().to_string();
                item.error_message = None;
                item.updated_at = now;
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn is_duplicate(&self, unique_id: &str) -> Result<bool, Error> {
        Ok(self.inner.lock().await.items.contains_key(unique_id))
    }

    async fn status_counts(&self) -> Result<HashMap<QueueStatus, i64>, Error> {
        let inner = self.inner.lock().await;
        let mut counts: HashMap<QueueStatus, i64> =
            QueueStatus::all().into_iter().map(|s| (s, 0)).collect();
        for item in inner.items.values() {
            *counts.entry(item.status()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn clean(&self, threshold: DateTime<Utc>) -> Result<u64, Error> {
        let mut inner = self.inner.lock().await;
        let to_remove: Vec<String> = inner
            .items
            .values()
            .filter(|item| item.status() == QueueStatus::Completed && item.updated_at < threshold)
            .map(|item| item.unique_id.clone())
            .collect();
        let removed = to_remove.len() as u64;
        for unique_id in to_remove {
            inner.items.remove(&unique_id);
        }
        Ok(removed)
    }

    async fn sweep_stuck(&self, threshold: DateTime<Utc>, now: DateTime<Utc>) -> Result<u64, Error> {
        let mut inner = self.inner.lock().await;
        let mut swept = 0u64;
        for item in inner.items.values_mut() {
            if item.status() == QueueStatus::Processing
                && item.claimed_at.is_some_and(|claimed| claimed < threshold)
            {
                item.status_str = QueueStatus::Pending.as_str().to_string();
                item.retry_count += 1;
                item.updated_at = now;
                swept += 1;
            }
        }
        Ok(swept)
    }

    async fn get(&self, unique_id: &str) -> Result<Option<QueueItem>, Error> {
        Ok(self.inner.lock().await.items.get(unique_id).cloned())
    }
}
