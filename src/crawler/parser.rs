//! Extracts the page title and outgoing links from a parsed HTML document.

use crate::url::{is_supported_scheme, normalize};
use scraper::{Html, Selector};

/// Title plus the deduplicated, normalized outgoing links found on a page.
#[derive(Debug, Clone)]
pub struct ParsedPage {
    pub title: Option<String>,
    pub links: Vec<String>,
}

/// Parses `html` relative to `base_url`: extracts `<title>` text and every
/// `<a href>` target, resolving relative URLs, stripping fragments, and
/// normalizing. Links with an unsupported scheme or that fail to resolve
/// are silently dropped; scope and include/exclude-pattern filtering is the
/// caller's job (it needs the crawl configuration, which this module
/// doesn't see).
pub fn parse_html(html: &str, base_url: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let links = extract_links(&document, base_url);

    ParsedPage { title, links }
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_links(document: &Html, base_url: &str) -> Vec<String> {
    let Ok(base) = ::url::Url::parse(base_url) else {
        return Vec::new();
    };
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if let Some(link) = resolve_link(href, &base) {
            links.push(link);
        }
    }
    links
}

/// Resolves `href` against `base`, strips any fragment, and normalizes.
/// Returns `None` for empty/fragment-only hrefs or unsupported schemes.
fn resolve_link(href: &str, base: &::url::Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);

    let absolute = resolved.to_string();
    if !is_supported_scheme(&absolute) {
        return None;
    }
    normalize(&absolute).ok()
}
