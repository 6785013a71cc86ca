//! Crawl a single host, convert its pages to Markdown, and export the corpus.
//!
//! The crate is organized leaves-first: `url` utilities have no internal
//! dependencies, `storage` depends only on `url`, `crawler` depends on both,
//! and `output` consumes whatever `storage` has accumulated.

pub mod config;
pub mod crawler;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

pub use config::Config;
pub use crawler::{crawl, store_path};
pub use storage::{CrawlStore, SqliteStore};
pub use url::{is_in_scope, is_supported_scheme, normalize, url_to_filename};

/// Top-level error type for the crawl-to-Markdown pipeline.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] url::UrlError),

    #[error("storage error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("retriable HTTP status {status} from {url}")]
    RetriableStatus { url: String, status: u16 },

    #[error("non-retriable HTTP status {status} from {url}")]
    NonRetriableStatus { url: String, status: u16 },

    #[error("non-HTML content type {content_type:?} from {url}")]
    NonHtmlContent {
        url: String,
        content_type: Option<String>,
    },

    #[error("scrape of {url} produced no content")]
    NoContent { url: String },

    #[error("proxy unreachable: {0}")]
    ProxyUnreachable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for crawl-to-Markdown operations.
pub type Result<T> = std::result::Result<T, CrawlError>;
