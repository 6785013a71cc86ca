//! URL normalization and scheme checks.

use thiserror::Error;

/// URL-specific errors.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("failed to parse URL: {0}")]
    Parse(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
}

/// Canonicalizes a URL: lowercases the scheme and host, strips the fragment,
/// and preserves the query string and path verbatim (including case).
///
/// Fails with [`UrlError::Parse`] when `u` has no absolute scheme and host.
///
/// ```
/// use crawl_to_md::normalize;
/// assert_eq!(
///     normalize("HTTPS://Example.COM/Path?a=1&b=2#section").unwrap(),
///     "https://example.com/Path?a=1&b=2"
/// );
/// ```
pub fn normalize(u: &str) -> Result<String, UrlError> {
    let mut parsed = ::url::Url::parse(u).map_err(|e| UrlError::Parse(e.to_string()))?;

    if parsed.host_str().is_none() {
        return Err(UrlError::Parse(format!("URL has no host: {u}")));
    }

    let scheme = parsed.scheme().to_ascii_lowercase();
    parsed
        .set_scheme(&scheme)
        .map_err(|_| UrlError::Parse(format!("cannot normalize scheme for {u}")))?;

    let host = parsed
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .expect("host presence checked above");
    parsed
        .set_host(Some(&host))
        .map_err(|e| UrlError::Parse(e.to_string()))?;

    parsed.set_fragment(None);

    Ok(parsed.into())
}

/// Returns true iff `u`'s scheme is `http` or `https`.
///
/// ```
/// use crawl_to_md::is_supported_scheme;
/// assert!(is_supported_scheme("https://example.com"));
/// assert!(!is_supported_scheme("mailto:me@example.com"));
/// ```
pub fn is_supported_scheme(u: &str) -> bool {
    match ::url::Url::parse(u) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}
