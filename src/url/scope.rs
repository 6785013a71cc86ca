//! Scope checks: whether a URL falls under a base URL's host and path.

use url::Url;

/// Returns true iff `u` and `base` share their host exactly (not a subdomain
/// relationship) and `u`'s path starts with `base`'s path as a whole
/// path-segment prefix.
///
/// Both arguments are expected to already be normalized; this function does
/// not normalize them itself.
///
/// ```
/// use crawl_to_md::is_in_scope;
/// assert!(is_in_scope("https://example.com/docs/page", "https://example.com/docs"));
/// assert!(!is_in_scope("https://example.com/docset", "https://example.com/docs"));
/// assert!(!is_in_scope("https://example.come/docs", "https://example.com/docs"));
/// ```
pub fn is_in_scope(u: &str, base: &str) -> bool {
    let (u, base) = match (Url::parse(u), Url::parse(base)) {
        (Ok(u), Ok(base)) => (u, base),
        _ => return false,
    };

    if u.host_str() != base.host_str() {
        return false;
    }

    path_is_prefix(u.path(), base.path())
}

fn path_is_prefix(path: &str, base_path: &str) -> bool {
    let base_trimmed = base_path.trim_end_matches('/');
    if base_trimmed.is_empty() {
        return true;
    }
    if path == base_trimmed {
        return true;
    }
    path.starts_with(base_trimmed) && path[base_trimmed.len()..].starts_with('/')
}
