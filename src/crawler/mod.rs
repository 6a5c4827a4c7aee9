//! Crawler Fan-out: concurrent, failure-isolated polling of news sources.

mod adapter;
mod engine;
mod test_doubles;

pub use adapter::{CrawlError, SourceAdapter};
pub use engine::{SourceOutcome, fan_out};
pub use test_doubles::StaticAdapter;
