//! Concatenates every crawled page into a single Markdown document.

use crate::output::minify::minify;
use crate::storage::{CrawlStore, PageRow};
use crate::Result;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Returns the ATX header level of `line` (1-6), or `None` if it isn't one.
/// A malformed header (`#` not followed by a space) is left untouched.
fn atx_header_level(line: &str) -> Option<usize> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    if line.as_bytes().get(hashes) == Some(&b' ') {
        Some(hashes)
    } else {
        None
    }
}

/// Demotes every ATX header in `content` by one level, capped at six `#`s,
/// with a blank line inserted before and after each demoted header.
fn demote_headers(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 32);
    for line in content.split('\n') {
        match atx_header_level(line) {
            Some(level) => {
                let new_level = (level + 1).min(6);
                let rest = &line[level..];
                out.push('\n');
                for _ in 0..new_level {
                    out.push('#');
                }
                out.push_str(rest);
                out.push('\n');
            }
            None => out.push_str(line),
        }
        out.push('\n');
    }
    out
}

/// Collapses runs of three-or-more consecutive newlines down to exactly two.
fn collapse_newlines(content: &str) -> String {
    let mut out = content.to_string();
    while out.contains("\n\n\n") {
        out = out.replace("\n\n\n", "\n\n");
    }
    out
}

fn metadata_map(raw: &Option<String>) -> BTreeMap<String, serde_json::Value> {
    let Some(raw) = raw else {
        return BTreeMap::new();
    };
    match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(raw) {
        Ok(map) => map
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .collect(),
        Err(_) => BTreeMap::new(),
    }
}

fn page_block(page: &PageRow, minified: bool) -> Option<String> {
    let content = page.content.as_ref()?;
    let demoted = demote_headers(content);

    if minified {
        return Some(demoted);
    }

    let mut block = String::new();
    block.push_str("<!--\n");
    block.push_str(&format!("URL: {}\n", page.url));
    for (key, value) in metadata_map(&page.metadata) {
        let rendered = match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        block.push_str(&format!("{key}: {rendered}\n"));
    }
    block.push_str("-->\n\n");
    block.push_str(&demoted);
    block.push_str("\n---\n");
    Some(block)
}

/// Concatenates every page in `store` into a single Markdown document under
/// `<output_dir>/output.md`, led by a level-1 `title` header.
pub fn assemble(store: &dyn CrawlStore, output_dir: &Path, title: &str, minify_output: bool) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;

    let mut buffer = String::new();
    buffer.push_str(&format!("# {title}\n\n"));

    for row in store.get_pages_iterator()? {
        let row = row?;
        if let Some(block) = page_block(&row, minify_output) {
            buffer.push_str(&block);
            buffer.push('\n');
        }
    }

    let mut assembled = collapse_newlines(&buffer);
    if minify_output {
        assembled = minify(&assembled);
    }

    let path = output_dir.join("output.md");
    let mut file = std::fs::File::create(path)?;
    file.write_all(assembled.as_bytes())?;
    Ok(())
}
