//! Upstream ingestion: source clients and the raw-table loader.

pub mod jsonl;
pub mod loader;
pub mod source;

pub use jsonl::JsonLinesSource;
pub use loader::{RawLoader, SyncReport};
pub use source::{SearchAnalyticsSource, StaticSource};
