//! In-memory [`CrawlStore`] double for tests that don't want a filesystem.

use crate::storage::traits::{CrawlBatch, CrawlStore, PageRow, PageUpsert, StoreError, StoreResult};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Default)]
struct LinkEntry {
    visited: bool,
    retry_count: u32,
}

#[derive(Debug, Clone, Default)]
struct PageEntry {
    content: Option<String>,
    metadata: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct State {
    links: HashMap<String, LinkEntry>,
    pages: HashMap<String, PageEntry>,
    closed: bool,
}

/// A `Mutex`-guarded pair of ordinary maps standing in for the two tables.
///
/// Batch-commit atomicity is achieved by cloning the current state, applying
/// every sub-operation to the clone, and swapping it in only once all four
/// have validated: a crash (panic) partway through never leaves the
/// original state half-updated.
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlStore for MemoryStore {
    fn insert_links(&self, urls: &[String]) -> StoreResult<usize> {
        let mut state = self.state.lock().expect("memory store mutex poisoned");
        if state.closed {
            return Err(StoreError::Closed);
        }
        let mut inserted = 0;
        for url in urls {
            if !state.links.contains_key(url) {
                state.links.insert(url.clone(), LinkEntry::default());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn get_unvisited_links(&self, limit: usize) -> StoreResult<Vec<String>> {
        let state = self.state.lock().expect("memory store mutex poisoned");
        if state.closed {
            return Err(StoreError::Closed);
        }
        Ok(state
            .links
            .iter()
            .filter(|(_, entry)| !entry.visited)
            .map(|(url, _)| url.clone())
            .take(limit)
            .collect())
    }

    fn mark_links_visited(&self, urls: &[String]) -> StoreResult<()> {
        let mut state = self.state.lock().expect("memory store mutex poisoned");
        if state.closed {
            return Err(StoreError::Closed);
        }
        for url in urls {
            if let Some(entry) = state.links.get_mut(url) {
                entry.visited = true;
            }
        }
        Ok(())
    }

    fn mark_links_unvisited(&self, urls: &[String]) -> StoreResult<()> {
        let mut state = self.state.lock().expect("memory store mutex poisoned");
        if state.closed {
            return Err(StoreError::Closed);
        }
        for url in urls {
            if let Some(entry) = state.links.get_mut(url) {
                entry.visited = false;
            }
        }
        Ok(())
    }

    fn upsert_pages(&self, rows: &[PageUpsert]) -> StoreResult<()> {
        let mut state = self.state.lock().expect("memory store mutex poisoned");
        if state.closed {
            return Err(StoreError::Closed);
        }
        for row in rows {
            state.pages.insert(
                row.url.clone(),
                PageEntry {
                    content: row.content.clone(),
                    metadata: Some(row.metadata.clone()),
                },
            );
        }
        Ok(())
    }

    fn get_retriable_failed_urls(&self, max_retries: u32) -> StoreResult<Vec<String>> {
        let state = self.state.lock().expect("memory store mutex poisoned");
        if state.closed {
            return Err(StoreError::Closed);
        }
        Ok(state
            .pages
            .iter()
            .filter(|(url, page)| {
                page.content.is_none()
                    && state
                        .links
                        .get(*url)
                        .map(|l| l.retry_count < max_retries)
                        .unwrap_or(false)
            })
            .map(|(url, _)| url.clone())
            .collect())
    }

    fn commit_crawl_batch(&self, batch: CrawlBatch) -> StoreResult<()> {
        let mut guard = self.state.lock().expect("memory store mutex poisoned");
        if guard.closed {
            return Err(StoreError::Closed);
        }
        let mut next = guard.clone();

        for row in &batch.pages_upsert {
            next.pages.insert(
                row.url.clone(),
                PageEntry {
                    content: row.content.clone(),
                    metadata: Some(row.metadata.clone()),
                },
            );
        }
        for url in &batch.visited_updates {
            next.links.entry(url.clone()).or_default().visited = true;
        }
        for url in &batch.retry_increments {
            next.links.entry(url.clone()).or_default().retry_count += 1;
        }
        for url in &batch.retry_resets {
            next.links.entry(url.clone()).or_default().retry_count = 0;
        }

        *guard = next;
        Ok(())
    }

    fn get_pages_iterator(&self) -> StoreResult<Box<dyn Iterator<Item = StoreResult<PageRow>> + '_>> {
        let state = self.state.lock().expect("memory store mutex poisoned");
        if state.closed {
            return Err(StoreError::Closed);
        }
        let rows: Vec<PageRow> = state
            .pages
            .iter()
            .map(|(url, page)| PageRow {
                url: url.clone(),
                content: page.content.clone(),
                metadata: page.metadata.clone(),
            })
            .collect();
        Ok(Box::new(rows.into_iter().map(Ok)))
    }

    fn get_failed_page_urls(&self) -> StoreResult<Vec<String>> {
        let state = self.state.lock().expect("memory store mutex poisoned");
        if state.closed {
            return Err(StoreError::Closed);
        }
        Ok(state
            .pages
            .iter()
            .filter(|(_, page)| page.content.is_none())
            .map(|(url, _)| url.clone())
            .collect())
    }

    fn close(&self) -> StoreResult<()> {
        let mut state = self.state.lock().expect("memory store mutex poisoned");
        state.closed = true;
        Ok(())
    }
}
