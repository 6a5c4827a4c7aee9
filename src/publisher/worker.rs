//! Publisher Worker: claims from the Queue Engine and dispatches to a chat
//! target.
//!
//! A claim loop runs per-item tasks gated by a semaphore, with all tasks
//! joined at the batch boundary before the next claim. A successful
//! dispatch additionally records into the Published Set; the loop runs
//! until cancelled rather than draining a fixed batch once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::PublisherConfig;
use crate::error::Error;
use crate::published_set::PublishedSet;
use crate::queue::{QueueEngine, QueueItem};

use super::chat_target::{ChatMessage, ChatTarget};

const SHUTDOWN_ERROR_MESSAGE: &str = "shutdown";

/// Drives the claim -> dispatch -> complete/fail loop against a
/// [`QueueEngine`] and a [`ChatTarget`], with periodic retry/clean/sweep
/// maintenance.
pub struct PublisherWorker {
    queue: QueueEngine,
    published: Arc<dyn PublishedSet>,
    chat_target: Arc<dyn ChatTarget>,
    config: PublisherConfig,
}

impl PublisherWorker {
    #[must_use]
    pub fn new(
        queue: QueueEngine,
        published: Arc<dyn PublishedSet>,
        chat_target: Arc<dyn ChatTarget>,
        config: PublisherConfig,
    ) -> Self {
        Self { queue, published, chat_target, config }
    }

    /// Runs the publish loop until `cancel` fires. A batch already claimed
    /// is always finished (dispatched and completed/failed) before the
    /// loop checks cancellation again, so no item is ever left stuck in
    /// PROCESSING across a shutdown.
    #[instrument(skip(self, cancel))]
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), Error> {
        let mut iterations_since_maintenance = 0u32;

        loop {
            if cancel.is_cancelled() {
                info!("shutdown requested, exiting publish loop");
                return Ok(());
            }

            let claimed = self.queue.claim(self.config.batch_size as usize).await?;

            if claimed.is_empty() {
                tokio::select! {
                    () = cancel.cancelled() => {
                        info!("shutdown requested while idle");
                        return Ok(());
                    }
                    () = tokio::time::sleep(self.config.publish_interval()) => {}
                }
                continue;
            }

            self.dispatch_batch(claimed).await?;

            iterations_since_maintenance += 1;
            if iterations_since_maintenance >= MAINTENANCE_EVERY_N_ITERATIONS {
                iterations_since_maintenance = 0;
                self.run_maintenance().await?;
            }
        }
    }

    /// Dispatches every item in `batch` with bounded concurrency, then
    /// `complete`s or `fail`s each one depending on the outcome.
    #[instrument(skip(self, batch), fields(batch_size = batch.len()))]
    async fn dispatch_batch(&self, batch: Vec<QueueItem>) -> Result<(), Error> {
        let semaphore = Arc::new(Semaphore::new(self.config.batch_size.max(1) as usize));
        let mut handles = Vec::with_capacity(batch.len());

        for item in batch {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(error) => {
                    warn!(unique_id = %item.unique_id, %error, "semaphore closed, skipping item this batch");
                    continue;
                }
            };
            let chat_target = Arc::clone(&self.chat_target);
            let queue = self.queue.clone();
            let published = Arc::clone(&self.published);

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                dispatch_one(&chat_target, &queue, &published, item).await
            }));
        }

        for handle in handles {
            if let Err(join_error) = handle.await {
                warn!(error = %join_error, "publish task panicked");
            }
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn run_maintenance(&self) -> Result<(), Error> {
        let retried = self.queue.retry(self.config.max_retries).await?;
        let cleaned = self.queue.clean(self.config.clean_age()).await?;
        let swept = self.queue.sweep_stuck(self.config.stuck_threshold()).await?;
        debug!(retried, cleaned, swept, "maintenance tick complete");
        Ok(())
    }
}

const MAINTENANCE_EVERY_N_ITERATIONS: u32 = 10;

async fn dispatch_one(
    chat_target: &Arc<dyn ChatTarget>,
    queue: &QueueEngine,
    published: &Arc<dyn PublishedSet>,
    item: QueueItem,
) {
    let message = ChatMessage {
        title: item.title.clone(),
        url: item.url.clone(),
        content: item.content.clone(),
        image_url: None,
        category: item.category.clone(),
        platform: item.platform.clone(),
    };

    match chat_target.send(&message).await {
        Ok(()) => {
            if let Err(err) = queue.complete(&item.unique_id).await {
                warn!(unique_id = %item.unique_id, error = %err, "failed to mark item completed");
                return;
            }
            if let Err(err) = published.add(&item.unique_id).await {
                warn!(unique_id = %item.unique_id, error = %err, "failed to record published id");
            }
        }
        Err(dispatch_error) => {
            let message = dispatch_error.message();
            if let Err(err) = queue.fail(&item.unique_id, &message).await {
                warn!(unique_id = %item.unique_id, error = %err, "failed to mark item failed");
            }
        }
    }
}

/// Fails every item in `abandoned` with a `"shutdown"` error message,
/// guaranteeing a cancelled worker never leaves a claim stuck in
/// PROCESSING. Not used by [`PublisherWorker::run`] directly (which avoids
/// claiming a new batch once cancellation is observed) but kept for
/// callers that need to abandon an already-claimed batch explicitly — e.g.
/// a supervising process that force-kills a stuck worker's claims.
pub async fn fail_abandoned(queue: &QueueEngine, abandoned: &[QueueItem]) -> Result<(), Error> {
    for item in abandoned {
        queue.fail(&item.unique_id, SHUTDOWN_ERROR_MESSAGE).await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::published_set::InMemoryPublishedSet;
    use crate::publisher::test_doubles::RecordingChatTarget;
    use crate::publisher::DispatchError;
    use crate::queue::{InMemoryQueueStore, NewQueueItem};

    fn item(unique_id: &str) -> NewQueueItem {
        NewQueueItem {
            unique_id: unique_id.to_string(),
            article_id: None,
            platform: "YTN".to_string(),
            title: "title".to_string(),
            url: format!("https://example.com/{unique_id}"),
            content: None,
            category: None,
            published_at: None,
        }
    }

    #[tokio::test]
    async fn s6_successful_dispatch_completes_and_records_published() {
        let queue = QueueEngine::new(Arc::new(InMemoryQueueStore::new()));
        queue.enqueue(item("a1")).await.unwrap();

        let published = Arc::new(InMemoryPublishedSet::new());
        let chat_target = Arc::new(RecordingChatTarget::new());
        let config = PublisherConfig { batch_size: 10, ..Default::default() };
        let worker = PublisherWorker::new(queue.clone(), published.clone(), chat_target.clone(), config);

        let claimed = queue.claim(10).await.unwrap();
        worker.dispatch_batch(claimed).await.unwrap();

        let stored = queue.get("a1").await.unwrap().unwrap();
        assert_eq!(stored.status(), crate::queue::QueueStatus::Completed);
        assert!(published.contains("a1").await.unwrap());
        assert_eq!(chat_target.sent_messages().await.len(), 1);
    }

    #[tokio::test]
    async fn dispatch_failure_marks_item_failed_without_publishing() {
        let queue = QueueEngine::new(Arc::new(InMemoryQueueStore::new()));
        queue.enqueue(item("a1")).await.unwrap();

        let published = Arc::new(InMemoryPublishedSet::new());
        let chat_target = Arc::new(RecordingChatTarget::new());
        chat_target
            .fail_next_with(DispatchError::Transient("network blip".to_string()))
            .await;
        let config = PublisherConfig { batch_size: 10, ..Default::default() };
        let worker = PublisherWorker::new(queue.clone(), published.clone(), chat_target, config);

        let claimed = queue.claim(10).await.unwrap();
        worker.dispatch_batch(claimed).await.unwrap();

        let stored = queue.get("a1").await.unwrap().unwrap();
        assert_eq!(stored.status(), crate::queue::QueueStatus::Failed);
        assert_eq!(stored.retry_count, 1);
        assert!(!published.contains("a1").await.unwrap());
    }

    #[tokio::test]
    async fn run_exits_promptly_once_cancelled_and_queue_is_idle() {
        let queue = QueueEngine::new(Arc::new(InMemoryQueueStore::new()));
        let published = Arc::new(InMemoryPublishedSet::new());
        let chat_target = Arc::new(RecordingChatTarget::new());
        let config = PublisherConfig {
            publish_interval_secs: 3600,
            ..Default::default()
        };
        let worker = PublisherWorker::new(queue, published, chat_target, config);

        let cancel = CancellationToken::new();
        let child = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            child.cancel();
        });

        tokio::time::timeout(Duration::from_secs(5), worker.run(cancel))
            .await
            .expect("worker should exit promptly after cancellation")
            .unwrap();
    }
}
