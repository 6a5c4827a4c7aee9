//! Article Store contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Error;

use super::Article;

/// Filters accepted by [`ArticleStore::find`]. All fields are optional;
/// `None` means "no constraint on this dimension".
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    pub platform: Option<String>,
    pub category: Option<String>,
    /// Only articles with `collected_at >= since` are returned.
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

/// Durable collection of news articles, keyed by composite identity.
///
/// Implementations must uphold invariants: `unique_id` unique,
/// `url` unique, `collected_at <= now()`.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Inserts a new article.
    ///
    /// # Errors
    ///
    /// `Error::Duplicate` if `unique_id` or `url` already exists.
    /// `Error::InvalidInput` if a required field is missing/empty.
    /// `Error::Storage` if the underlying store refused the write.
    async fn insert(&self, article: Article) -> Result<(), Error>;

    async fn find_by_unique_id(&self, unique_id: &str) -> Result<Option<Article>, Error>;

    async fn find_by_url(&self, url: &str) -> Result<Option<Article>, Error>;

    /// Returns articles matching `query`, ordered by `collected_at` descending.
    async fn find(&self, query: ArticleQuery) -> Result<Vec<Article>, Error>;
}

/// Validates required fields before a store attempts to persist an article.
pub(crate) fn validate(article: &Article) -> Result<(), Error> {
    if article.platform.trim().is_empty() {
        return Err(Error::InvalidInput("platform must not be empty".into()));
    }
    if article.url.trim().is_empty() {
        return Err(Error::InvalidInput("url must not be empty".into()));
    }
    if article.title.trim().is_empty() {
        return Err(Error::InvalidInput("title must not be empty".into()));
    }
    if article.unique_id.trim().is_empty() {
        return Err(Error::InvalidInput("unique_id must not be empty".into()));
    }
    if article.collected_at > Utc::now() {
        return Err(Error::InvalidInput(
            "collected_at must not be in the future".into(),
        ));
    }
    Ok(())
}
