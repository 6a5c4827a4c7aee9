//! `ChatTarget` test doubles.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::chat_target::{ChatMessage, ChatTarget, DispatchError};

/// Accepts every message, does nothing. Useful for wiring smoke tests that
/// don't care about dispatch outcomes.
#[derive(Debug, Default)]
pub struct NullChatTarget;

#[async_trait]
impl ChatTarget for NullChatTarget {
    async fn send(&self, _message: &ChatMessage) -> Result<(), DispatchError> {
        Ok(())
    }
}

/// Captures every message it's asked to send, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingChatTarget {
    sent: Mutex<Vec<ChatMessage>>,
    fail_next: Mutex<Option<DispatchError>>,
}

impl RecordingChatTarget {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `send` call fail with `error`, then resume succeeding.
    pub async fn fail_next_with(&self, error: DispatchError) {
        *self.fail_next.lock().await = Some(error);
    }

    pub async fn sent_messages(&self) -> Vec<ChatMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ChatTarget for RecordingChatTarget {
    async fn send(&self, message: &ChatMessage) -> Result<(), DispatchError> {
        if let Some(error) = self.fail_next.lock().await.take() {
            return Err(error);
        }
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}
