//! SQLite-backed Article Store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracing::instrument;

use crate::db::Database;
use crate::error::Error;

use super::store::{ArticleQuery, ArticleStore, validate};
use super::Article;

/// Article Store backed by the `articles` table in a shared SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteArticleStore {
    db: Database,
}

impl SqliteArticleStore {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn row_to_article(row: SqliteRow) -> Result<Article, Error> {
    let metadata_text: String = row.try_get("metadata").map_err(sqlx::Error::from)?;
    let metadata = serde_json::from_str(&metadata_text).unwrap_or(serde_json::Value::Null);
    Ok(Article {
        unique_id: row.try_get("unique_id").map_err(sqlx::Error::from)?,
        platform: row.try_get("platform").map_err(sqlx::Error::from)?,
        article_id: row.try_get("article_id").map_err(sqlx::Error::from)?,
        url: row.try_get("url").map_err(sqlx::Error::from)?,
        title: row.try_get("title").map_err(sqlx::Error::from)?,
        content: row.try_get("content").map_err(sqlx::Error::from)?,
        author: row.try_get("author").map_err(sqlx::Error::from)?,
        category: row.try_get("category").map_err(sqlx::Error::from)?,
        metadata,
        published_at: row.try_get("published_at").map_err(sqlx::Error::from)?,
        collected_at: row.try_get("collected_at").map_err(sqlx::Error::from)?,
    })
}

#[async_trait]
impl ArticleStore for SqliteArticleStore {
    #[instrument(skip(self, article), fields(unique_id = %article.unique_id))]
    async fn insert(&self, article: Article) -> Result<(), Error> {
        validate(&article)?;
        let metadata_text = serde_json::to_string(&article.metadata)
            .map_err(|e| Error::InvalidInput(format!("metadata is not valid JSON: {e}")))?;

        sqlx::query(
            r"INSERT INTO articles (
                unique_id, platform, article_id, url, title, content, author,
                category, metadata, published_at, collected_at
              ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&article.unique_id)
        .bind(&article.platform)
        .bind(&article.article_id)
        .bind(&article.url)
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.author)
        .bind(&article.category)
        .bind(metadata_text)
        .bind(article.published_at)
        .bind(article.collected_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_unique_id(&self, unique_id: &str) -> Result<Option<Article>, Error> {
        let row = sqlx::query("SELECT * FROM articles WHERE unique_id = ?")
            .bind(unique_id)
            .fetch_optional(self.db.pool())
            .await?;
        row.map(row_to_article).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_url(&self, url: &str) -> Result<Option<Article>, Error> {
        let row = sqlx::query("SELECT * FROM articles WHERE url = ?")
            .bind(url)
            .fetch_optional(self.db.pool())
            .await?;
        row.map(row_to_article).transpose()
    }

    #[instrument(skip(self, query))]
    async fn find(&self, query: ArticleQuery) -> Result<Vec<Article>, Error> {
        let since: DateTime<Utc> = query.since.unwrap_or_else(|| DateTime::<Utc>::MIN_UTC);
        let limit: i64 = i64::from(query.limit.unwrap_or(u32::MAX.min(1_000_000)));

        let rows = sqlx::query(
            r"SELECT * FROM articles
              WHERE (?1 IS NULL OR platform = ?1)
                AND (?2 IS NULL OR category = ?2)
                AND collected_at >= ?3
              ORDER BY collected_at DESC
              LIMIT ?4",
        )
        .bind(query.platform)
        .bind(query.category)
        .bind(since)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(row_to_article).collect()
    }
}
