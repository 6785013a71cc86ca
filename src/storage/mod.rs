//! Persistence: the `links`/`pages` schema, the [`CrawlStore`] contract, a
//! real SQLite-backed implementation, and an in-memory test double.

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{CrawlBatch, CrawlStore, PageRow, PageUpsert, StoreError, StoreResult};
