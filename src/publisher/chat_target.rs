//! Chat target interface: the one side-effecting boundary the
//! core treats opaquely.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Outbound message shape, opaque to the core beyond these fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub title: String,
    pub url: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub platform: String,
}

/// Failure from a [`ChatTarget::send`]. Any non-success is a retryable
/// failure unless the error is explicitly classified as permanent.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("transient dispatch failure: {0}")]
    Transient(String),

    #[error("permanent dispatch failure: {0}")]
    Permanent(String),
}

impl DispatchError {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Transient(message) | Self::Permanent(message) => message.clone(),
        }
    }
}

#[async_trait]
pub trait ChatTarget: Send + Sync {
    async fn send(&self, message: &ChatMessage) -> Result<(), DispatchError>;
}
