//! Enqueue Service: bridges Article Store and Queue Engine.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use tracing::{info, instrument};

use crate::article::{ArticleQuery, ArticleStore};
use crate::error::Error;
use crate::published_set::PublishedSet;
use crate::queue::{NewQueueItem, QueueEngine};

/// Filters accepted by [`EnqueueService::add_articles_from_db`].
#[derive(Debug, Clone, Default)]
pub struct EnqueueFilter {
    pub platform: Option<String>,
    pub category: Option<String>,
    /// Only articles collected within the last `hours` are considered.
    /// `None` means no lower bound.
    pub hours: Option<i64>,
    pub limit: Option<u32>,
}

/// Bridges Article Store and Queue Engine: enqueues candidate articles that
/// are neither already published nor already queued.
pub struct EnqueueService {
    articles: Arc<dyn ArticleStore>,
    queue: QueueEngine,
    published: Arc<dyn PublishedSet>,
}

impl EnqueueService {
    #[must_use]
    pub fn new(
        articles: Arc<dyn ArticleStore>,
        queue: QueueEngine,
        published: Arc<dyn PublishedSet>,
    ) -> Self {
        Self { articles, queue, published }
    }

    /// Enqueues articles matching `filter`, skipping anything already in
    /// the Published Set or already present in the Queue Store (in any
    /// status). Returns the number of items actually inserted.
    ///
    /// A race-induced duplicate (uniqueness violation surfaced as
    /// `enqueue` returning `false`) counts as "skipped," not a failure.
    ///
    /// # Errors
    ///
    /// `Error::Storage` if the Article Store, Queue Engine, or Published
    /// Set refuses a read/write.
    #[instrument(skip(self, filter))]
    pub async fn add_articles_from_db(&self, filter: EnqueueFilter) -> Result<u64, Error> {
        let since = filter
            .hours
            .map(|hours| Utc::now() - ChronoDuration::hours(hours));

        let query = ArticleQuery {
            platform: filter.platform,
            category: filter.category,
            since,
            limit: filter.limit,
        };

        let candidates = self.articles.find(query).await?;
        let mut inserted = 0u64;

        for article in &candidates {
            if self.published.contains(&article.unique_id).await? {
                continue;
            }
            if self.queue.is_duplicate(&article.unique_id).await? {
                continue;
            }

            let item = NewQueueItem::from(article);
            if self.queue.enqueue(item).await? {
                inserted += 1;
            }
            // enqueue() returning false is a race-induced duplicate: skip, not a failure.
        }

        info!(candidates = candidates.len(), inserted, "enqueue pass complete");
        Ok(inserted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::article::{Article, InMemoryArticleStore};
    use crate::published_set::InMemoryPublishedSet;
    use crate::queue::InMemoryQueueStore;

    fn article(unique_id: &str) -> Article {
        Article {
            unique_id: unique_id.to_string(),
            platform: "YTN".to_string(),
            article_id: Some(unique_id.to_string()),
            url: format!("https://ytn.example/{unique_id}"),
            title: "title".to_string(),
            content: None,
            author: None,
            category: None,
            metadata: serde_json::Value::Null,
            published_at: None,
            collected_at: Utc::now(),
        }
    }

    fn service(articles: Arc<InMemoryArticleStore>) -> (EnqueueService, QueueEngine) {
        let queue_store = Arc::new(InMemoryQueueStore::new());
        let queue = QueueEngine::new(queue_store);
        let published = Arc::new(InMemoryPublishedSet::new());
        (
            EnqueueService::new(articles, queue.clone(), published),
            queue,
        )
    }

    #[tokio::test]
    async fn enqueues_new_articles_once() {
        let articles = Arc::new(InMemoryArticleStore::new());
        articles.insert(article("a1")).await.unwrap();
        articles.insert(article("a2")).await.unwrap();
        let (service, queue) = service(articles);

        let inserted = service.add_articles_from_db(EnqueueFilter::default()).await.unwrap();
        assert_eq!(inserted, 2);
        assert!(queue.is_duplicate("a1").await.unwrap());

        // Second pass over the same articles enqueues nothing new.
        let inserted = service.add_articles_from_db(EnqueueFilter::default()).await.unwrap();
        assert_eq!(inserted, 0);
    }

    #[tokio::test]
    async fn skips_already_published_articles() {
        let articles = Arc::new(InMemoryArticleStore::new());
        articles.insert(article("a1")).await.unwrap();
        let queue_store = Arc::new(InMemoryQueueStore::new());
        let queue = QueueEngine::new(queue_store);
        let published = Arc::new(InMemoryPublishedSet::new());
        published.add("a1").await.unwrap();
        let service = EnqueueService::new(articles, queue.clone(), published);

        let inserted = service.add_articles_from_db(EnqueueFilter::default()).await.unwrap();
        assert_eq!(inserted, 0);
        assert!(!queue.is_duplicate("a1").await.unwrap());
    }
}
