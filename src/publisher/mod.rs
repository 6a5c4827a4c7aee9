//! Publisher Worker: claims from the Queue Engine and dispatches to a chat
//! target.

mod chat_target;
mod discord;
mod test_doubles;
mod worker;

pub use chat_target::{ChatMessage, ChatTarget, DispatchError};
pub use discord::DiscordWebhookTarget;
pub use test_doubles::{NullChatTarget, RecordingChatTarget};
pub use worker::{PublisherWorker, fail_abandoned};
