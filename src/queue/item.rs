//! Queue item types and status definitions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::article::Article;

/// Lifecycle state of a [`QueueItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl QueueStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// All statuses, for callers that need to enumerate them (e.g. `status()`).
    #[must_use]
    pub fn all() -> [QueueStatus; 4] {
        [Self::Pending, Self::Processing, Self::Completed, Self::Failed]
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QueueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid queue status: {s}")),
        }
    }
}

/// A new item to be inserted into the Queue Store, denormalized from an
/// [`Article`].
#[derive(Debug, Clone)]
pub struct NewQueueItem {
    pub unique_id: String,
    pub article_id: Option<String>,
    pub platform: String,
    pub title: String,
    pub url: String,
    pub content: Option<String>,
    pub category: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<&Article> for NewQueueItem {
    fn from(article: &Article) -> Self {
        Self {
            unique_id: article.unique_id.clone(),
            article_id: article.article_id.clone(),
            platform: article.platform.clone(),
            title: article.title.clone(),
            url: article.url.clone(),
            content: article.content.clone(),
            category: article.category.clone(),
            published_at: article.published_at,
        }
    }
}

/// A single record in the publication-lifecycle queue.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct QueueItem {
    pub id: i64,
    pub unique_id: String,
    pub article_id: Option<String>,
    pub platform: String,
    pub title: String,
    pub url: String,
    pub content: Option<String>,
    pub category: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    #[sqlx(rename = "status")]
    pub(crate) status_str: String,
    pub retry_count: i64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
}

impl QueueItem {
    #[must_use]
    pub fn status(&self) -> QueueStatus {
        self.status_str
            .parse()
            .unwrap_or(QueueStatus::Failed) // unreachable given the CHECK constraint; Failed is the safest default
    }
}
