//! Article types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// A normalized news item collected from a third-party source.
///
/// `unique_id` and `url` are each unique within the Article Store; the
/// struct is otherwise immutable for the lifetime of the store (see
/// "never mutated").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Stable business key: `"{platform}_{article_id}"`, or a URL-derived
    /// fallback when the source has no `article_id`. See [`unique_id_for`].
    pub unique_id: String,
    pub platform: String,
    pub article_id: Option<String>,
    pub url: String,
    pub title: String,
    pub content: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    /// Source-specific key/value bag (category codes, video ids, thumbnails).
    /// Never require a fixed flat schema across sources.
    #[serde(default)]
    pub metadata: Json,
    pub published_at: Option<DateTime<Utc>>,
    pub collected_at: DateTime<Utc>,
}

/// Candidate article surfaced by a crawler adapter, before Article Store
/// insertion/dedup. Distinguished from [`Article`] because a candidate may
/// still be a duplicate and never get an internal store identity.
pub type ArticleCandidate = Article;

/// Derives the business key used for dedup: `"{platform}_{article_id}"`
/// when an `article_id` is present, otherwise a URL-derived fallback.
#[must_use]
pub fn unique_id_for(platform: &str, article_id: Option<&str>, url: &str) -> String {
    match article_id {
        Some(id) if !id.is_empty() => format!("{platform}_{id}"),
        _ => format!("{platform}_url_{}", canonicalize_url(url)),
    }
}

/// Canonicalizes a URL for use as a dedup fallback key: lowercases the
/// scheme/host, strips a trailing slash, and drops the fragment. Not a
/// full normalization per RFC 3986 — just enough to dedupe the common
/// "same article, different casing/trailing-slash/fragment" cases.
#[must_use]
fn canonicalize_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            let mut canonical = parsed.to_string();
            if canonical.ends_with('/') {
                canonical.pop();
            }
            canonical
        }
        Err(_) => url.trim_end_matches('/').to_string(),
    }
}
