//! Published Set contract.

use async_trait::async_trait;

use crate::error::Error;

/// Set-of-identities interface recording articles that were successfully
/// published, consulted by the Enqueue Service to skip re-publication.
///
/// Implementations must make `add` idempotent: adding an already-present
/// `unique_id` is a silent no-op.
#[async_trait]
pub trait PublishedSet: Send + Sync {
    async fn contains(&self, unique_id: &str) -> Result<bool, Error>;

    async fn add(&self, unique_id: &str) -> Result<(), Error>;
}
