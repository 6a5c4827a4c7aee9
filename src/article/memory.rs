//! In-memory Article Store, used by tests and embedded/standalone runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Error;

use super::store::{ArticleQuery, ArticleStore, validate};
use super::Article;

#[derive(Debug, Default)]
struct Inner {
    by_unique_id: HashMap<String, Article>,
    urls: HashMap<String, String>, // url -> unique_id
}

/// `ArticleStore` backed by a `HashMap` guarded by a `tokio::sync::RwLock`.
///
/// Satisfies the same uniqueness invariants as the SQLite backend: concurrent
/// readers are not blocked by each other, writes are serialized.
#[derive(Debug, Default)]
pub struct InMemoryArticleStore {
    inner: RwLock<Inner>,
}

impl InMemoryArticleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStore for InMemoryArticleStore {
    async fn insert(&self, article: Article) -> Result<(), Error> {
        validate(&article)?;
        let mut inner = self.inner.write().await;
        if inner.by_unique_id.contains_key(&article.unique_id) || inner.urls.contains_key(&article.url) {
            return Err(Error::Duplicate);
        }
        inner.urls.insert(article.url.clone(), article.unique_id.clone());
        inner.by_unique_id.insert(article.unique_id.clone(), article);
        Ok(())
    }

    async fn find_by_unique_id(&self, unique_id: &str) -> Result<Option<Article>, Error> {
        Ok(self.inner.read().await.by_unique_id.get(unique_id).cloned())
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Article>, Error> {
        let inner = self.inner.read().await;
        Ok(inner
            .urls
            .get(url)
            .and_then(|uid| inner.by_unique_id.get(uid))
            .cloned())
    }

    async fn find(&self, query: ArticleQuery) -> Result<Vec<Article>, Error> {
        let inner = self.inner.read().await;
        let mut matches: Vec<Article> = inner
            .by_unique_id
            .values()
            .filter(|a| query.platform.as_deref().is_none_or(|p| p == a.platform))
            .filter(|a| {
                query
                    .category
                    .as_deref()
                    .is_none_or(|c| a.category.as_deref() == Some(c))
            })
            .filter(|a| query.since.is_none_or(|since| a.collected_at >= since))
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.collected_at.cmp(&a.collected_at));
        if let Some(limit) = query.limit {
            matches.truncate(limit as usize);
        }
        Ok(matches)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(unique_id: &str, platform: &str, url: &str) -> Article {
        Article {
            unique_id: unique_id.to_string(),
            platform: platform.to_string(),
            article_id: None,
            url: url.to_string(),
            title: "title".to_string(),
            content: None,
            author: None,
            category: None,
            metadata: serde_json::json!({}),
            published_at: None,
            collected_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_unique_id() {
        let store = InMemoryArticleStore::new();
        store.insert(article("YTN_1", "YTN", "https://a")).await.unwrap();
        let result = store.insert(article("YTN_1", "YTN", "https://b")).await;
        assert!(matches!(result, Err(Error::Duplicate)));
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_url() {
        let store = InMemoryArticleStore::new();
        store.insert(article("YTN_1", "YTN", "https://a")).await.unwrap();
        let result = store.insert(article("YTN_2", "YTN", "https://a")).await;
        assert!(matches!(result, Err(Error::Duplicate)));
    }

    #[tokio::test]
    async fn find_orders_by_collected_at_descending() {
        let store = InMemoryArticleStore::new();
        let mut older = article("YTN_1", "YTN", "https://a");
        older.collected_at = Utc::now() - chrono::Duration::hours(2);
        let newer = article("YTN_2", "YTN", "https://b");
        store.insert(older).await.unwrap();
        store.insert(newer).await.unwrap();

        let results = store.find(ArticleQuery::default()).await.unwrap();
        assert_eq!(results[0].unique_id, "YTN_2");
        assert_eq!(results[1].unique_id, "YTN_1");
    }

    #[tokio::test]
    async fn insert_rejects_missing_required_fields() {
        let store = InMemoryArticleStore::new();
        let mut bad = article("YTN_1", "", "https://a");
        bad.platform = String::new();
        let result = store.insert(bad).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
