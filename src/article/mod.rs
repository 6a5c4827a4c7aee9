//! Article Store: durable collection of news articles keyed by composite
//! identity.

mod memory;
mod model;
mod sqlite;
mod store;

pub use memory::InMemoryArticleStore;
pub use model::{Article, ArticleCandidate, unique_id_for};
pub use sqlite::SqliteArticleStore;
pub use store::{ArticleQuery, ArticleStore};
