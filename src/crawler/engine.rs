//! Crawler fan-out.
//!
//! Mirrors the concurrency shape of a download engine's semaphore-gated
//! task fan-out, but drops the semaphore (fan-out is bounded by the number
//! of configured sources, not by an external resource) and adds
//! cancellation: a flaky source must never starve or cancel the rest, but
//! an operator-initiated shutdown must stop everything.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::article::ArticleCandidate;

use super::adapter::{CrawlError, SourceAdapter};

/// Result of polling a single source for one fan-out round.
#[derive(Debug)]
pub enum SourceOutcome {
    Articles(Vec<ArticleCandidate>),
    Failed(CrawlError),
    /// The fan-out was cancelled before this source's `fetch` returned.
    Cancelled,
}

impl SourceOutcome {
    #[must_use]
    pub fn articles(&self) -> &[ArticleCandidate] {
        match self {
            Self::Articles(articles) => articles,
            Self::Failed(_) | Self::Cancelled => &[],
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Cancelled)
    }
}

/// Polls every adapter concurrently and waits for all to finish (or for
/// `cancel` to fire). No cancellation cascades between sibling adapters: a
/// single adapter's own error never affects any other adapter's outcome.
#[instrument(skip(adapters, cancel))]
pub async fn fan_out(
    adapters: Vec<Arc<dyn SourceAdapter>>,
    cancel: CancellationToken,
) -> Vec<(String, SourceOutcome)> {
    let tasks = adapters.into_iter().map(|adapter| {
        let cancel = cancel.clone();
        let name = adapter.name().to_string();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => SourceOutcome::Cancelled,
                result = adapter.fetch() => match result {
                    Ok(articles) => SourceOutcome::Articles(articles),
                    Err(err) => SourceOutcome::Failed(err),
                },
            };
            (name, outcome)
        })
    });

    let joined = join_all(tasks).await;

    joined
        .into_iter()
        .map(|result| match result {
            Ok((name, outcome)) => {
                match &outcome {
                    SourceOutcome::Articles(articles) => {
                        info!(source = %name, count = articles.len(), "source fetch complete");
                    }
                    SourceOutcome::Failed(err) => {
                        warn!(source = %name, error = %err, "source fetch failed");
                    }
                    SourceOutcome::Cancelled => {
                        warn!(source = %name, "source fetch cancelled");
                    }
                }
                (name, outcome)
            }
            Err(join_error) => {
                let message = join_error.to_string();
                warn!(error = %message, "source adapter task panicked");
                ("unknown".to_string(), SourceOutcome::Failed(CrawlError::Other(message)))
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::article::Article;
    use chrono::Utc;

    struct OkAdapter {
        name: &'static str,
    }

    #[async_trait]
    impl SourceAdapter for OkAdapter {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self) -> Result<Vec<ArticleCandidate>, CrawlError> {
            Ok(vec![Article {
                unique_id: format!("{}_1", self.name),
                platform: self.name.to_string(),
                article_id: Some("1".to_string()),
                url: format!("https://{}.example/1", self.name),
                title: "title".to_string(),
                content: None,
                author: None,
                category: None,
                metadata: serde_json::Value::Null,
                published_at: None,
                collected_at: Utc::now(),
            }])
        }
    }

    struct FailingAdapter {
        name: &'static str,
    }

    #[async_trait]
    impl SourceAdapter for FailingAdapter {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self) -> Result<Vec<ArticleCandidate>, CrawlError> {
            Err(CrawlError::Http("connection refused".to_string()))
        }
    }

    struct SlowAdapter {
        name: &'static str,
        started: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SourceAdapter for SlowAdapter {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self) -> Result<Vec<ArticleCandidate>, CrawlError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn one_failing_adapter_does_not_affect_siblings() {
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(OkAdapter { name: "a" }),
            Arc::new(FailingAdapter { name: "b" }),
            Arc::new(OkAdapter { name: "c" }),
        ];

        let outcomes = fan_out(adapters, CancellationToken::new()).await;
        assert_eq!(outcomes.len(), 3);

        let by_name: std::collections::HashMap<_, _> = outcomes.into_iter().collect();
        assert!(matches!(by_name["a"], SourceOutcome::Articles(_)));
        assert!(matches!(by_name["b"], SourceOutcome::Failed(_)));
        assert!(matches!(by_name["c"], SourceOutcome::Articles(_)));
    }

    #[tokio::test]
    async fn explicit_cancellation_stops_all_pending_adapters() {
        let started = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(SlowAdapter { name: "a", started: Arc::clone(&started) }),
            Arc::new(SlowAdapter { name: "b", started: Arc::clone(&started) }),
        ];

        let child = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            child.cancel();
        });

        let outcomes = fan_out(adapters, cancel).await;
        assert_eq!(started.load(Ordering::SeqCst), 2);
        assert!(outcomes.iter().all(|(_, outcome)| matches!(outcome, SourceOutcome::Cancelled)));
    }
}
