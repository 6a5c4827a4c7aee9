//! Source adapter contract.

use async_trait::async_trait;
use thiserror::Error;

use crate::article::ArticleCandidate;

/// Error surfaced by a [`SourceAdapter`]'s `fetch`, captured and associated
/// with the source name rather than propagated — one flaky source must
/// never starve the rest.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("http request failed: {0}")]
    Http(String),

    #[error("response could not be parsed: {0}")]
    Parse(String),

    #[error("adapter timed out")]
    Timeout,

    #[error("adapter failed: {0}")]
    Other(String),
}

/// A single news source, polled once per fan-out round.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable name used to key the fan-out result (e.g. `"ytn"`).
    fn name(&self) -> &str;

    /// Fetches a finite sequence of article candidates, completing when the
    /// source has been fully polled for this round.
    async fn fetch(&self) -> Result<Vec<ArticleCandidate>, CrawlError>;
}
