//! SQLite-backed implementation of [`CrawlStore`].

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CrawlBatch, CrawlStore, PageRow, PageUpsert, StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

const PAGE_ITERATOR_BATCH: usize = 100;

/// SQLite storage backend.
///
/// The connection lives behind a [`Mutex`] so every [`CrawlStore`] method can
/// take `&self`: the crawl engine drives one connection from a single async
/// task, and the mutex is never contended, but it gives us safe interior
/// mutability without `unsafe`.
pub struct SqliteStore {
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`, enabling WAL and running
    /// the schema migration.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Opens an in-memory database, for tests that want real SQL semantics
    /// without a file on disk.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn configure(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            PRAGMA mmap_size = 268435456;
            ",
        )?;
        initialize_schema(conn)?;
        Ok(())
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.conn.lock().expect("storage mutex poisoned");
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(StoreError::Closed),
        }
    }
}

impl CrawlStore for SqliteStore {
    fn insert_links(&self, urls: &[String]) -> StoreResult<usize> {
        if urls.is_empty() {
            return Ok(0);
        }
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("INSERT OR IGNORE INTO links (url, visited) VALUES (?1, 0)")?;
            let mut inserted = 0;
            for url in urls {
                inserted += stmt.execute(params![url])?;
            }
            Ok(inserted)
        })
    }

    fn get_unvisited_links(&self, limit: usize) -> StoreResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT url FROM links WHERE visited = 0 LIMIT ?1")?;
            let urls = stmt
                .query_map(params![limit as i64], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(urls)
        })
    }

    fn mark_links_visited(&self, urls: &[String]) -> StoreResult<()> {
        if urls.is_empty() {
            return Ok(());
        }
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("UPDATE links SET visited = 1 WHERE url = ?1")?;
            for url in urls {
                stmt.execute(params![url])?;
            }
            Ok(())
        })
    }

    fn mark_links_unvisited(&self, urls: &[String]) -> StoreResult<()> {
        if urls.is_empty() {
            return Ok(());
        }
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("UPDATE links SET visited = 0 WHERE url = ?1")?;
            for url in urls {
                stmt.execute(params![url])?;
            }
            Ok(())
        })
    }

    fn upsert_pages(&self, rows: &[PageUpsert]) -> StoreResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "INSERT INTO pages (url, content, metadata) VALUES (?1, ?2, ?3)
                 ON CONFLICT(url) DO UPDATE SET content = excluded.content, metadata = excluded.metadata",
            )?;
            for row in rows {
                stmt.execute(params![row.url, row.content, row.metadata])?;
            }
            Ok(())
        })
    }

    fn get_retriable_failed_urls(&self, max_retries: u32) -> StoreResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.url FROM pages p JOIN links l ON p.url = l.url
                 WHERE p.content IS NULL AND l.retry_count < ?1",
            )?;
            let urls = stmt
                .query_map(params![max_retries], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(urls)
        })
    }

    fn commit_crawl_batch(&self, batch: CrawlBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.with_conn(|conn| {
            conn.execute_batch("SAVEPOINT crawl_batch")?;
            let result = (|| -> StoreResult<()> {
                if !batch.pages_upsert.is_empty() {
                    let mut stmt = conn.prepare(
                        "INSERT INTO pages (url, content, metadata) VALUES (?1, ?2, ?3)
                         ON CONFLICT(url) DO UPDATE SET content = excluded.content, metadata = excluded.metadata",
                    )?;
                    for row in &batch.pages_upsert {
                        stmt.execute(params![row.url, row.content, row.metadata])?;
                    }
                }
                if !batch.visited_updates.is_empty() {
                    let mut stmt = conn.prepare("UPDATE links SET visited = 1 WHERE url = ?1")?;
                    for url in &batch.visited_updates {
                        stmt.execute(params![url])?;
                    }
                }
                if !batch.retry_increments.is_empty() {
                    let mut stmt = conn
                        .prepare("UPDATE links SET retry_count = retry_count + 1 WHERE url = ?1")?;
                    for url in &batch.retry_increments {
                        stmt.execute(params![url])?;
                    }
                }
                if !batch.retry_resets.is_empty() {
                    let mut stmt = conn.prepare("UPDATE links SET retry_count = 0 WHERE url = ?1")?;
                    for url in &batch.retry_resets {
                        stmt.execute(params![url])?;
                    }
                }
                Ok(())
            })();

            match result {
                Ok(()) => {
                    conn.execute_batch("RELEASE SAVEPOINT crawl_batch")?;
                    Ok(())
                }
                Err(e) => {
                    conn.execute_batch("ROLLBACK TO SAVEPOINT crawl_batch")?;
                    conn.execute_batch("RELEASE SAVEPOINT crawl_batch")?;
                    Err(e)
                }
            }
        })
    }

    fn get_pages_iterator(&self) -> StoreResult<Box<dyn Iterator<Item = StoreResult<PageRow>> + '_>> {
        {
            let guard = self.conn.lock().expect("storage mutex poisoned");
            if guard.is_none() {
                return Err(StoreError::Closed);
            }
        }
        Ok(Box::new(PagesIterator {
            store: self,
            offset: 0,
            buffer: std::collections::VecDeque::new(),
            exhausted: false,
        }))
    }

    fn get_failed_page_urls(&self) -> StoreResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT url FROM pages WHERE content IS NULL")?;
            let urls = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(urls)
        })
    }

    fn close(&self) -> StoreResult<()> {
        let mut guard = self.conn.lock().expect("storage mutex poisoned");
        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
        }
        Ok(())
    }
}

/// Lazily fetches pages in batches of [`PAGE_ITERATOR_BATCH`] rows, mirroring
/// the `fetchmany(100)` loop it's grounded on.
struct PagesIterator<'a> {
    store: &'a SqliteStore,
    offset: i64,
    buffer: std::collections::VecDeque<PageRow>,
    exhausted: bool,
}

impl Iterator for PagesIterator<'_> {
    type Item = StoreResult<PageRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            let fetched = self.store.with_conn(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT url, content, metadata FROM pages LIMIT ?1 OFFSET ?2",
                )?;
                let rows = stmt
                    .query_map(params![PAGE_ITERATOR_BATCH as i64, self.offset], |row| {
                        Ok(PageRow {
                            url: row.get(0)?,
                            content: row.get(1)?,
                            metadata: row.get(2)?,
                        })
                    })?
                    .collect::<Result<Vec<PageRow>, _>>()?;
                Ok(rows)
            });

            match fetched {
                Ok(rows) => {
                    self.offset += rows.len() as i64;
                    if rows.len() < PAGE_ITERATOR_BATCH {
                        self.exhausted = true;
                    }
                    self.buffer.extend(rows);
                }
                Err(e) => return Some(Err(e)),
            }
        }

        self.buffer.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn insert_links_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.insert_links(&urls(&["https://example.com/a"])).unwrap();
        let second = store.insert_links(&urls(&["https://example.com/a"])).unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 0);
    }

    #[test]
    fn unvisited_respects_limit() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_links(&urls(&["https://example.com/a", "https://example.com/b"]))
            .unwrap();
        let batch = store.get_unvisited_links(1).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn get_unvisited_links_zero_returns_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_links(&urls(&["https://example.com/a"])).unwrap();
        assert!(store.get_unvisited_links(0).unwrap().is_empty());
    }

    #[test]
    fn commit_crawl_batch_applies_all_four_sub_operations() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_links(&urls(&["https://example.com/a", "https://example.com/b"]))
            .unwrap();

        let batch = CrawlBatch {
            pages_upsert: vec![PageUpsert {
                url: "https://example.com/a".to_string(),
                content: Some("# Hello".to_string()),
                metadata: "{}".to_string(),
            }],
            visited_updates: vec!["https://example.com/a".to_string()],
            retry_increments: vec!["https://example.com/b".to_string()],
            retry_resets: vec![],
        };
        store.commit_crawl_batch(batch).unwrap();

        assert!(store.get_unvisited_links(10).unwrap() == urls(&["https://example.com/b"]));
        let failed = store.get_retriable_failed_urls(5).unwrap();
        assert!(failed.contains(&"https://example.com/b".to_string()));
    }

    #[test]
    fn commit_crawl_batch_empty_is_a_noop() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.commit_crawl_batch(CrawlBatch::default()).unwrap();
    }

    #[test]
    fn successful_scrape_resets_retry_count() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_links(&urls(&["https://example.com/a"])).unwrap();
        store
            .commit_crawl_batch(CrawlBatch {
                pages_upsert: vec![],
                visited_updates: vec![],
                retry_increments: vec!["https://example.com/a".to_string()],
                retry_resets: vec![],
            })
            .unwrap();
        store
            .commit_crawl_batch(CrawlBatch {
                pages_upsert: vec![PageUpsert {
                    url: "https://example.com/a".to_string(),
                    content: Some("ok".to_string()),
                    metadata: "{}".to_string(),
                }],
                visited_updates: vec!["https://example.com/a".to_string()],
                retry_increments: vec![],
                retry_resets: vec!["https://example.com/a".to_string()],
            })
            .unwrap();

        assert!(store
            .get_retriable_failed_urls(5)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn pages_iterator_pages_through_batches() {
        let store = SqliteStore::open_in_memory().unwrap();
        let many: Vec<String> = (0..250).map(|i| format!("https://example.com/{i}")).collect();
        store.insert_links(&many).unwrap();
        let rows: Vec<PageUpsert> = many
            .iter()
            .map(|u| PageUpsert {
                url: u.clone(),
                content: Some("x".to_string()),
                metadata: "{}".to_string(),
            })
            .collect();
        store.upsert_pages(&rows).unwrap();

        let collected: Vec<_> = store.get_pages_iterator().unwrap().collect::<StoreResult<Vec<_>>>().unwrap();
        assert_eq!(collected.len(), 250);
    }

    #[test]
    fn mark_links_unvisited_puts_a_visited_url_back_on_the_frontier() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_links(&urls(&["https://example.com/a"])).unwrap();
        store.mark_links_visited(&urls(&["https://example.com/a"])).unwrap();
        assert!(store.get_unvisited_links(10).unwrap().is_empty());

        store.mark_links_unvisited(&urls(&["https://example.com/a"])).unwrap();
        assert_eq!(store.get_unvisited_links(10).unwrap(), urls(&["https://example.com/a"]));
    }

    #[test]
    fn write_after_close_fails() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.close().unwrap();
        store.close().unwrap();
        assert!(matches!(
            store.insert_links(&urls(&["https://example.com/a"])),
            Err(StoreError::Closed)
        ));
    }

    #[test]
    fn failed_page_urls_tracks_null_content() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert_pages(&[PageUpsert {
                url: "https://example.com/a".to_string(),
                content: None,
                metadata: "{}".to_string(),
            }])
            .unwrap();
        assert_eq!(
            store.get_failed_page_urls().unwrap(),
            vec!["https://example.com/a".to_string()]
        );
    }
}
