//! HTTP client construction and per-URL fetch/outcome classification.

use crate::CrawlError;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// Builds the shared HTTP client: a custom user-agent string, bounded
/// timeout, and no automatic redirect following (redirect statuses fall
/// into the non-retriable classification below, same as any other 3xx/4xx).
pub fn build_http_client(timeout_secs: f64, proxy: Option<&str>) -> Result<Client, CrawlError> {
    let user_agent = format!("crawl-to-md/{}", env!("CARGO_PKG_VERSION"));

    let mut builder = Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs_f64(timeout_secs))
        .connect_timeout(Duration::from_secs_f64(timeout_secs.min(10.0)))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true);

    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|_| CrawlError::ProxyUnreachable(proxy_url.to_string()))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| CrawlError::Network {
            url: "<client construction>".to_string(),
            source: e,
        })
}

/// Probes `base_url` with a `HEAD` request at startup so an unreachable
/// proxy fails fast instead of during the crawl.
pub async fn probe_proxy(client: &Client, base_url: &str) -> Result<(), CrawlError> {
    client
        .head(base_url)
        .send()
        .await
        .map_err(|_| CrawlError::ProxyUnreachable(base_url.to_string()))?;
    Ok(())
}

/// The result of fetching and classifying a single URL.
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx with `text/html` content type. Carries the raw body for parsing.
    Html { body: String },
    /// 2xx with any other content type. Permanent skip.
    NonHtml { content_type: Option<String> },
    /// 5xx (or 429) surfaced past the transport's own retry handling.
    RetriableStatus { status: u16 },
    /// Anything else non-2xx: 4xx, or a redirect this client doesn't follow.
    NonRetriableStatus { status: u16 },
}

fn is_retriable_status(status: StatusCode) -> bool {
    status.is_server_error() || status.as_u16() == 429
}

fn is_html_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|mime| mime.trim().eq_ignore_ascii_case("text/html"))
        .unwrap_or(false)
}

/// Issues a single `GET` and classifies the response. Network-level failures
/// (connection refused, timeout, DNS) surface as [`CrawlError::Network`];
/// everything else becomes a [`FetchOutcome`] variant for the engine to act on.
pub async fn fetch(client: &Client, url: &str) -> Result<FetchOutcome, CrawlError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| CrawlError::Network {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();

    if status.is_success() {
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let is_html = content_type.as_deref().map(is_html_content_type).unwrap_or(false);
        if !is_html {
            return Ok(FetchOutcome::NonHtml { content_type });
        }

        let body = response.text().await.map_err(|source| CrawlError::Network {
            url: url.to_string(),
            source,
        })?;
        return Ok(FetchOutcome::Html { body });
    }

    if is_retriable_status(status) {
        Ok(FetchOutcome::RetriableStatus {
            status: status.as_u16(),
        })
    } else {
        Ok(FetchOutcome::NonRetriableStatus {
            status: status.as_u16(),
        })
    }
}
