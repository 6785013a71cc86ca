//! Turns a parsed HTML document into Markdown plus a metadata map, applying
//! include/exclude element filters and stripping script/style subtrees.

use ego_tree::NodeId;
use scraper::{Html, Node, Selector};
use std::collections::{BTreeMap, HashSet};

/// The scrape either produced content (with page metadata) or found none.
pub struct ScrapeResult {
    pub markdown: String,
    pub metadata: BTreeMap<String, String>,
}

/// Parses a CSS-like selector of the form `#id`, `.class`, or a bare tag name.
/// `scraper::Selector` already accepts all three forms natively, so this is
/// a thin wrapper that treats an unparseable selector as matching nothing.
fn parse_selector(raw: &str) -> Option<Selector> {
    Selector::parse(raw).ok()
}

/// Scrapes `html`: applies `include_filters` (if any, replacing the working
/// document with a synthetic one containing only the matched elements),
/// applies `exclude_filters`, unconditionally strips `<script>`/`<style>`,
/// extracts the title, and converts what remains to Markdown.
///
/// Returns `None` when the resulting Markdown is empty after trimming:
/// callers treat this as a retriable failure (`NoContentError`).
pub fn scrape(html: &str, include_filters: &[String], exclude_filters: &[String]) -> Option<ScrapeResult> {
    let parsed = Html::parse_document(html);

    let working = if include_filters.is_empty() {
        parsed
    } else {
        let mut body_html = String::new();
        for raw in include_filters {
            let Some(selector) = parse_selector(raw) else {
                continue;
            };
            for element in parsed.select(&selector) {
                body_html.push_str(&element.html());
            }
        }
        Html::parse_document(&format!("<html><body>{body_html}</body></html>"))
    };

    let mut excluded: HashSet<NodeId> = HashSet::new();
    for raw in exclude_filters {
        if let Some(selector) = parse_selector(raw) {
            for element in working.select(&selector) {
                excluded.insert(element.id());
            }
        }
    }
    for tag in ["script", "style"] {
        let selector = Selector::parse(tag).expect("static tag selector is always valid");
        for element in working.select(&selector) {
            excluded.insert(element.id());
        }
    }

    let title_selector = Selector::parse("title").expect("static tag selector is always valid");
    let title = working
        .select(&title_selector)
        .find(|el| !excluded.contains(&el.id()))
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let mut filtered_html = String::new();
    serialize_excluding(working.tree.root(), &excluded, &mut filtered_html);

    let markdown = htmd::convert(&filtered_html).ok()?;
    if markdown.trim().is_empty() {
        return None;
    }

    let mut metadata = BTreeMap::new();
    metadata.insert("title".to_string(), title);

    Some(ScrapeResult { markdown, metadata })
}

fn serialize_excluding(node: ego_tree::NodeRef<Node>, excluded: &HashSet<NodeId>, out: &mut String) {
    if excluded.contains(&node.id()) {
        return;
    }

    match node.value() {
        Node::Element(element) => {
            out.push('<');
            out.push_str(element.name());
            for (name, value) in element.attrs() {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&value.replace('&', "&amp;").replace('"', "&quot;"));
                out.push('"');
            }
            out.push('>');
            for child in node.children() {
                serialize_excluding(child, excluded, out);
            }
            out.push_str("</");
            out.push_str(element.name());
            out.push('>');
        }
        Node::Text(text) => {
            out.push_str(&text.replace('&', "&amp;").replace('<', "&lt;"));
        }
        _ => {
            for child in node.children() {
                serialize_excluding(child, excluded, out);
            }
        }
    }
}
