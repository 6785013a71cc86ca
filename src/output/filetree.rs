//! Exports each crawled page as its own Markdown file, mirroring the URL's
//! host and path under `<output_dir>/files/`.

use crate::output::minify::minify;
use crate::storage::CrawlStore;
use crate::Result;
use std::path::{Path, PathBuf};

/// Maps a page URL to its file-tree-relative path: `<host>/<path>.md`, or
/// `<host>/<path>/index.md` when the URL path is empty or trailing-slash.
/// When `base_url` is given and its path is a prefix of the page's path,
/// that prefix is stripped first.
fn relative_path(url: &str, base_url: Option<&str>) -> Option<PathBuf> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_string();
    let mut path = parsed.path().to_string();

    if let Some(base) = base_url {
        if let Ok(base_parsed) = url::Url::parse(base) {
            let base_path = base_parsed.path();
            if base_path != "/" && path.starts_with(base_path) {
                path = path[base_path.len()..].to_string();
            }
        }
    }

    let trailing_slash = path.ends_with('/');
    let trimmed = path.trim_matches('/');

    let file_path = if trimmed.is_empty() || trailing_slash {
        if trimmed.is_empty() {
            PathBuf::from("index.md")
        } else {
            PathBuf::from(trimmed).join("index.md")
        }
    } else {
        PathBuf::from(format!("{trimmed}.md"))
    };

    Some(Path::new(&host).join(file_path))
}

/// Writes one Markdown file per page under `<output_dir>/files/...`, rooted
/// at each page's host and path. Pages with NULL content are skipped.
pub fn export(
    store: &dyn CrawlStore,
    output_dir: &Path,
    base_url: Option<&str>,
    minify_output: bool,
) -> Result<()> {
    let root = output_dir.join("files");

    for row in store.get_pages_iterator()? {
        let row = row?;
        let Some(content) = row.content else {
            continue;
        };
        let Some(relative) = relative_path(&row.url, base_url) else {
            tracing::warn!(url = %row.url, "could not derive a file path, skipping");
            continue;
        };

        let body = if minify_output { minify(&content) } else { content };
        let full_path = root.join(relative);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full_path, body)?;
    }

    Ok(())
}
