//! Queue Store: a durable work queue over articles awaiting publication.

mod engine;
mod item;
mod memory;
mod sqlite;
mod store;

pub use engine::QueueEngine;
pub use item::{NewQueueItem, QueueItem, QueueStatus};
pub use memory::InMemoryQueueStore;
pub use sqlite::SqliteQueueStore;
pub use store::QueueStore;
