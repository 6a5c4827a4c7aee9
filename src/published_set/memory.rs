//! In-memory Published Set, used by tests and embedded/standalone runs.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Error;

use super::store::PublishedSet;

#[derive(Debug, Default)]
pub struct InMemoryPublishedSet {
    ids: RwLock<HashSet<String>>,
}

impl InMemoryPublishedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PublishedSet for InMemoryPublishedSet {
    async fn contains(&self, unique_id: &str) -> Result<bool, Error> {
        Ok(self.ids.read().await.contains(unique_id))
    }

    async fn add(&self, unique_id: &str) -> Result<(), Error> {
        self.ids.write().await.insert(unique_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_is_idempotent() {
        let set = InMemoryPublishedSet::new();
        set.add("YTN_1").await.unwrap();
        set.add("YTN_1").await.unwrap();
        assert!(set.contains("YTN_1").await.unwrap());
        assert!(!set.contains("YTN_2").await.unwrap());
    }
}
