//! Command handlers invoked by the CLI dispatcher.

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::article::ArticleStore;
use crate::config::PublisherConfig;
use crate::crawler::{SourceAdapter, fan_out};
use crate::enqueue::{EnqueueFilter, EnqueueService};
use crate::published_set::PublishedSet;
use crate::publisher::{ChatTarget, PublisherWorker};
use crate::queue::QueueEngine;

/// Runs one crawl cycle: fan out to every configured adapter, insert any
/// new candidates into the Article Store, then run the Enqueue Service.
pub async fn run_all(
    adapters: Vec<Arc<dyn SourceAdapter>>,
    articles: Arc<dyn ArticleStore>,
    queue: QueueEngine,
    published: Arc<dyn PublishedSet>,
) -> Result<()> {
    let outcomes = fan_out(adapters, CancellationToken::new()).await;

    let mut inserted_articles = 0u64;
    for (source, outcome) in &outcomes {
        if outcome.is_failure() {
            continue;
        }
        for candidate in outcome.articles() {
            match articles.insert(candidate.clone()).await {
                Ok(()) => inserted_articles += 1,
                Err(crate::error::Error::Duplicate) => {}
                Err(err) => return Err(err.into()),
            }
        }
        info!(source = %source, "source processed");
    }

    let enqueue = EnqueueService::new(articles, queue, published);
    let enqueued = enqueue.add_articles_from_db(EnqueueFilter::default()).await?;

    info!(inserted_articles, enqueued, "run-all cycle complete");
    Ok(())
}

/// Starts the Publisher Worker loop. Runs until `cancel` fires.
pub async fn publish(
    queue: QueueEngine,
    published: Arc<dyn PublishedSet>,
    chat_target: Arc<dyn ChatTarget>,
    config: PublisherConfig,
    cancel: CancellationToken,
) -> Result<()> {
    let worker = PublisherWorker::new(queue, published, chat_target, config);
    worker.run(cancel).await?;
    Ok(())
}

/// Prints a snapshot of Queue Store item counts per status to stdout.
pub async fn queue_status(queue: &QueueEngine) -> Result<()> {
    let counts = queue.status().await?;
    for status in crate::queue::QueueStatus::all() {
        println!("{status}: {}", counts.get(&status).copied().unwrap_or(0));
    }
    Ok(())
}

/// Moves eligible FAILED items back to PENDING.
pub async fn queue_retry(queue: &QueueEngine, max_retries: u32) -> Result<()> {
    let moved = queue.retry(max_retries).await?;
    println!("moved {moved} item(s) from failed to pending");
    Ok(())
}

/// Deletes COMPLETED items older than `clean_age`.
pub async fn queue_clean(queue: &QueueEngine, clean_age: std::time::Duration) -> Result<()> {
    let deleted = queue.clean(clean_age).await?;
    println!("deleted {deleted} completed item(s)");
    Ok(())
}

/// Runs the Enqueue Service with the given filter and prints the count inserted.
pub async fn queue_add(
    articles: Arc<dyn ArticleStore>,
    queue: QueueEngine,
    published: Arc<dyn PublishedSet>,
    filter: EnqueueFilter,
) -> Result<()> {
    let service = EnqueueService::new(articles, queue, published);
    let inserted = service.add_articles_from_db(filter).await?;
    println!("enqueued {inserted} item(s)");
    Ok(())
}
