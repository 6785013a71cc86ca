//! Crawler: HTTP fetching, outcome classification, link/title extraction,
//! the scrape transform, rate limiting, and the frontier-loop engine.

mod engine;
mod fetcher;
mod parser;
mod ratelimit;
mod scrape;

pub use fetcher::{build_http_client, fetch, FetchOutcome};
pub use parser::{parse_html, ParsedPage};
pub use ratelimit::RateLimiter;
pub use scrape::{scrape, ScrapeResult};

use crate::config::Config;
use crate::storage::SqliteStore;
use crate::url::url_to_filename;
use crate::Result;
use std::path::Path;

/// Opens (or creates) the persistence file for `config` and runs a complete
/// crawl against it: seed phase, retry-requeue phase, frontier loop.
///
/// The persistence file lives at `<cache_dir>/<url_to_filename(seed)>.sqlite`.
/// If `overwrite_cache` is set, any existing file is removed before opening.
pub async fn crawl(config: Config) -> Result<()> {
    let store_path = store_path(&config)?;
    if config.overwrite_cache && store_path.exists() {
        std::fs::remove_file(&store_path)?;
    }
    if let Some(parent) = store_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let store = SqliteStore::open(&store_path)?;
    let result = engine::run(&config, &store).await;
    store.close()?;
    result
}

/// Computes the persistence file path for `config`, without opening it.
/// Exported so callers can re-open the same store for export after
/// [`crawl`] returns (the crawl and export phases don't share a store
/// handle).
pub fn store_path(config: &Config) -> Result<std::path::PathBuf> {
    let seed = config
        .base_url
        .as_deref()
        .or_else(|| config.urls_list.first().map(String::as_str))
        .unwrap_or_default();
    let name = url_to_filename(seed)?;
    Ok(Path::new(&config.cache_dir).join(format!("{name}.sqlite")))
}
