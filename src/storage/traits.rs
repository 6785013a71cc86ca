//! Storage trait and associated error/record types.
//!
//! This module defines the interface every persistence backend implements:
//! the real SQLite-backed store and an in-memory double for tests.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store is closed")]
    Closed,
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A single row in the `pages` table, as read back for export.
#[derive(Debug, Clone)]
pub struct PageRow {
    pub url: String,
    pub content: Option<String>,
    pub metadata: Option<String>,
}

/// A single `(url, content, metadata)` write destined for `pages`.
#[derive(Debug, Clone)]
pub struct PageUpsert {
    pub url: String,
    pub content: Option<String>,
    pub metadata: String,
}

/// The four sub-operations of a single atomic crawl-batch commit.
#[derive(Debug, Clone, Default)]
pub struct CrawlBatch {
    pub pages_upsert: Vec<PageUpsert>,
    pub visited_updates: Vec<String>,
    pub retry_increments: Vec<String>,
    pub retry_resets: Vec<String>,
}

impl CrawlBatch {
    pub fn is_empty(&self) -> bool {
        self.pages_upsert.is_empty()
            && self.visited_updates.is_empty()
            && self.retry_increments.is_empty()
            && self.retry_resets.is_empty()
    }
}

/// The persistence contract the crawl engine and exporters depend on.
///
/// Every method takes `&self`: implementations hide their mutable state
/// behind interior mutability (a `Mutex`-guarded connection or map) so the
/// store can be shared by reference across the single-threaded engine.
pub trait CrawlStore {
    /// Inserts URLs not already present with `visited=false`. Returns the
    /// count actually inserted; idempotent per URL.
    fn insert_links(&self, urls: &[String]) -> StoreResult<usize>;

    /// Returns up to `limit` URLs with `visited=false`.
    fn get_unvisited_links(&self, limit: usize) -> StoreResult<Vec<String>>;

    /// Sets `visited=true` for each URL in `urls`; no-op for absent URLs.
    fn mark_links_visited(&self, urls: &[String]) -> StoreResult<()>;

    /// Sets `visited=false` for each URL in `urls`; no-op for absent URLs.
    /// Used by the retry-requeue phase to put a retriable failure back onto
    /// the frontier.
    fn mark_links_unvisited(&self, urls: &[String]) -> StoreResult<()>;

    /// Inserts or replaces `(url, content, metadata)` rows.
    fn upsert_pages(&self, rows: &[PageUpsert]) -> StoreResult<()>;

    /// Returns URLs whose page has NULL content and whose link has
    /// `retry_count < max_retries`.
    fn get_retriable_failed_urls(&self, max_retries: u32) -> StoreResult<Vec<String>>;

    /// Executes all four sub-operations of `batch` inside a single
    /// transaction. On failure, none persist.
    fn commit_crawl_batch(&self, batch: CrawlBatch) -> StoreResult<()>;

    /// Produces all pages as a lazy sequence, fetched in pages of 100 rows.
    fn get_pages_iterator(&self) -> StoreResult<Box<dyn Iterator<Item = StoreResult<PageRow>> + '_>>;

    /// Returns URLs whose page content is NULL.
    fn get_failed_page_urls(&self) -> StoreResult<Vec<String>>;

    /// Closes the store. Idempotent; every write after close fails with
    /// [`StoreError::Closed`].
    fn close(&self) -> StoreResult<()>;
}
