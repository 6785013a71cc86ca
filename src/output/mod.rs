//! Export: turns an accumulated store into on-disk artifacts (a
//! concatenated Markdown document, a JSON array, and a per-URL file tree).

mod assembler;
mod filetree;
mod json;
mod minify;

use crate::config::Config;
use crate::storage::CrawlStore;
use crate::Result;
use std::path::Path;

/// Runs every export enabled by `config` against the accumulated `store`.
///
/// The concatenated Markdown document and the per-URL file tree are both
/// Markdown artifacts and share the `export_markdown` toggle; the JSON
/// array is gated separately by `export_json`.
pub fn export_all(config: &Config, store: &dyn CrawlStore) -> Result<()> {
    let output_dir = Path::new(&config.output_dir);

    if config.export_markdown {
        assembler::assemble(store, output_dir, &config.title, config.minify)?;
        filetree::export(store, output_dir, config.base_url.as_deref(), config.minify)?;
    }

    if config.export_json {
        json::export(store, output_dir)?;
    }

    Ok(())
}
