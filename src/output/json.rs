//! Exports the crawled corpus as a single JSON array of page records.

use crate::storage::{CrawlStore, PageRow};
use crate::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct PageRecord {
    url: String,
    content: String,
    metadata: BTreeMap<String, serde_json::Value>,
}

fn collapse_newlines(content: &str) -> String {
    let mut out = content.to_string();
    while out.contains("\n\n\n") {
        out = out.replace("\n\n\n", "\n\n");
    }
    out
}

fn to_record(row: PageRow) -> Option<PageRecord> {
    let content = row.content?;
    let metadata = row
        .metadata
        .and_then(|raw| serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&raw).ok())
        .unwrap_or_default()
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .collect();

    Some(PageRecord {
        url: row.url,
        content: collapse_newlines(&content),
        metadata,
    })
}

/// Writes `<output_dir>/output.json`: an array of `{url, content, metadata}`
/// records, skipping pages whose content is NULL.
pub fn export(store: &dyn CrawlStore, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;

    let mut records = Vec::new();
    for row in store.get_pages_iterator()? {
        if let Some(record) = to_record(row?) {
            records.push(record);
        }
    }

    let serialized = serde_json::to_string_pretty(&records)?;
    let path = output_dir.join("output.json");
    let mut file = std::fs::File::create(path)?;
    file.write_all(serialized.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CrawlBatch, MemoryStore, PageUpsert};
    use tempfile::tempdir;

    #[test]
    fn skips_null_content_and_strips_null_metadata() {
        let dir = tempdir().unwrap();
        let store = MemoryStore::new();
        store
            .insert_links(&["https://a".to_string(), "https://b".to_string()])
            .unwrap();
        store
            .commit_crawl_batch(CrawlBatch {
                pages_upsert: vec![
                    PageUpsert {
                        url: "https://a".to_string(),
                        content: Some("body\n\n\ntext".to_string()),
                        metadata: r#"{"k":"v","dead":null}"#.to_string(),
                    },
                    PageUpsert {
                        url: "https://b".to_string(),
                        content: None,
                        metadata: "{}".to_string(),
                    },
                ],
                visited_updates: vec!["https://a".to_string(), "https://b".to_string()],
                retry_increments: vec![],
                retry_resets: vec![],
            })
            .unwrap();

        export(&store, dir.path()).unwrap();
        let raw = std::fs::read_to_string(dir.path().join("output.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let array = parsed.as_array().unwrap();

        assert_eq!(array.len(), 1);
        assert_eq!(array[0]["url"], "https://a");
        assert_eq!(array[0]["content"], "body\n\ntext");
        assert_eq!(array[0]["metadata"]["k"], "v");
        assert!(array[0]["metadata"].get("dead").is_none());
    }
}
