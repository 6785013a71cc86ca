//! URL normalization, scheme/scope checks, and filename escaping.

mod normalize;
mod scope;

pub use normalize::{is_supported_scheme, normalize, UrlError};
pub use scope::is_in_scope;

/// Maps a URL to a filesystem-safe token: the scheme separator is dropped
/// entirely, then every remaining run of non-alphanumeric characters becomes
/// a single underscore, with leading/trailing underscores trimmed.
///
/// ```
/// use crawl_to_md::url_to_filename;
/// assert_eq!(
///     url_to_filename("https://example.com/path/index.html").unwrap(),
///     "example_com_path_index_html"
/// );
/// ```
pub fn url_to_filename(u: &str) -> Result<String, UrlError> {
    if u.is_empty() {
        return Err(UrlError::Parse("empty input".to_string()));
    }

    let without_scheme = match u.find("://") {
        Some(idx) if u[..idx].chars().all(|c| c.is_ascii_alphabetic()) => &u[idx + 3..],
        _ => u,
    };

    let mut out = String::with_capacity(without_scheme.len());
    let mut last_was_underscore = false;
    for c in without_scheme.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_underscore = false;
        } else if !last_was_underscore {
            out.push('_');
            last_was_underscore = true;
        }
    }

    let trimmed = out.trim_matches('_').to_string();
    if trimmed.is_empty() {
        return Err(UrlError::Parse(format!("no filename-safe characters in {u}")));
    }
    Ok(trimmed)
}
