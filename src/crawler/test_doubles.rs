//! `SourceAdapter` test double, kept outside `#[cfg(test)]` so
//! it can back integration tests and local/demo runs without a real source.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::article::ArticleCandidate;

use super::adapter::{CrawlError, SourceAdapter};

/// Returns a fixed, pre-seeded batch of candidates (or a canned error) every
/// time it is polled.
pub struct StaticAdapter {
    name: String,
    result: Mutex<Result<Vec<ArticleCandidate>, CrawlError>>,
}

impl StaticAdapter {
    #[must_use]
    pub fn new(name: impl Into<String>, articles: Vec<ArticleCandidate>) -> Self {
        Self {
            name: name.into(),
            result: Mutex::new(Ok(articles)),
        }
    }

    #[must_use]
    pub fn failing(name: impl Into<String>, error: CrawlError) -> Self {
        Self {
            name: name.into(),
            result: Mutex::new(Err(error)),
        }
    }
}

#[async_trait]
impl SourceAdapter for StaticAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<ArticleCandidate>, CrawlError> {
        match &*self.result.lock().await {
            Ok(articles) => Ok(articles.clone()),
            Err(err) => Err(clone_crawl_error(err)),
        }
    }
}

fn clone_crawl_error(error: &CrawlError) -> CrawlError {
    match error {
        CrawlError::Http(message) => CrawlError::Http(message.clone()),
        CrawlError::Parse(message) => CrawlError::Parse(message.clone()),
        CrawlError::Timeout => CrawlError::Timeout,
        CrawlError::Other(message) => CrawlError::Other(message.clone()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candidate(unique_id: &str) -> ArticleCandidate {
        crate::article::Article {
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

    #[tokio::test]
    async fn returns_the_same_seeded_batch_every_call() {
        let adapter = StaticAdapter::new("ytn", vec![candidate("a1")]);
        assert_eq!(adapter.fetch().await.unwrap().len(), 1);
        assert_eq!(adapter.fetch().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failing_adapter_returns_the_canned_error_every_call() {
        let adapter = StaticAdapter::failing("ytn", CrawlError::Timeout);
        assert!(matches!(adapter.fetch().await, Err(CrawlError::Timeout)));
        assert!(matches!(adapter.fetch().await, Err(CrawlError::Timeout)));
    }
}
