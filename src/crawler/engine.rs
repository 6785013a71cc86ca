//! The frontier loop: seed, retry-requeue, then batched fetch/parse/scrape
//! until the frontier empties.

use crate::config::Config;
use crate::crawler::fetcher::{self, FetchOutcome};
use crate::crawler::parser::parse_html;
use crate::crawler::ratelimit::RateLimiter;
use crate::crawler::scrape::scrape;
use crate::storage::{CrawlBatch, CrawlStore, PageUpsert};
use crate::url::{is_in_scope, is_supported_scheme, normalize};
use crate::{CrawlError, Result};
use reqwest::Client;
use std::collections::HashSet;

const FRONTIER_BATCH_SIZE: usize = 200;

/// Runs a complete crawl against an already-opened store: seed phase,
/// retry-requeue phase, then the frontier loop.
pub async fn run(config: &Config, store: &dyn CrawlStore) -> Result<()> {
    let client = fetcher::build_http_client(config.timeout, config.proxy.as_deref())?;

    if let (Some(proxy_url), Some(base)) = (&config.proxy, &config.base_url) {
        tracing::debug!(proxy = %proxy_url, "probing proxy reachability");
        fetcher::probe_proxy(&client, base).await?;
    }

    seed_phase(config, store)?;
    retry_requeue_phase(config, store)?;

    let mut limiter = RateLimiter::new(config.rate_limit, config.delay);
    let mut total_visited: u64 = 0;

    loop {
        let batch = store.get_unvisited_links(FRONTIER_BATCH_SIZE)?;
        if batch.is_empty() {
            tracing::info!(visited = total_visited, "frontier exhausted");
            break;
        }

        tracing::debug!(size = batch.len(), "processing frontier batch");
        let mut delta = CrawlBatch::default();
        let mut discovered: HashSet<String> = HashSet::new();

        for raw_url in &batch {
            limiter.wait().await;
            process_url(config, &client, raw_url, &mut delta, &mut discovered).await;
        }

        let new_links: Vec<String> = discovered.into_iter().collect();
        if !new_links.is_empty() {
            let inserted = store.insert_links(&new_links)?;
            tracing::debug!(discovered = new_links.len(), inserted, "queued new links");
        }

        total_visited += delta.visited_updates.len() as u64;
        store.commit_crawl_batch(delta)?;
        tracing::info!(visited = total_visited, "batch committed");
    }

    Ok(())
}

fn seed_phase(config: &Config, store: &dyn CrawlStore) -> Result<()> {
    let mut seeds = Vec::new();

    if !config.urls_list.is_empty() {
        for raw in &config.urls_list {
            match normalize(raw) {
                Ok(normalized) if is_valid_link(&normalized, None, config) => seeds.push(normalized),
                Ok(_) => tracing::warn!(url = %raw, "seed out of scope or pattern-excluded, skipping"),
                Err(_) => tracing::warn!(url = %raw, "seed failed to normalize, skipping"),
            }
        }
    } else if let Some(base) = &config.base_url {
        match normalize(base) {
            Ok(normalized) => seeds.push(normalized),
            Err(_) => tracing::warn!(url = %base, "base_url failed to normalize, skipping"),
        }
    }

    store.insert_links(&seeds)?;
    Ok(())
}

fn retry_requeue_phase(config: &Config, store: &dyn CrawlStore) -> Result<()> {
    let failed = store.get_retriable_failed_urls(config.max_retries)?;
    let mut requeued = Vec::new();

    for raw in &failed {
        let Ok(normalized) = normalize(raw) else {
            continue;
        };
        if is_valid_link(&normalized, config.base_url.as_deref(), config) {
            requeued.push(normalized);
        }
    }

    if !requeued.is_empty() {
        store.insert_links(&requeued)?;
        store.mark_links_unvisited(&requeued)?;
    }
    Ok(())
}

/// Per-link validity: supported scheme, in scope of `base` (when given), and
/// passes the include/exclude URL-substring filters.
fn is_valid_link(url: &str, base: Option<&str>, config: &Config) -> bool {
    if !is_supported_scheme(url) {
        return false;
    }
    if let Some(base) = base {
        if !is_in_scope(url, base) {
            return false;
        }
    }
    if !config.include_url_patterns.is_empty()
        && !config.include_url_patterns.iter().any(|p| url.contains(p.as_str()))
    {
        return false;
    }
    if config.exclude_patterns.iter().any(|p| url.contains(p.as_str())) {
        return false;
    }
    true
}

fn failure_metadata(error_type: &str, error_message: &str) -> String {
    serde_json::json!({
        "scrape_status": "failed",
        "error_type": error_type,
        "error_message": error_message,
    })
    .to_string()
}

async fn process_url(
    config: &Config,
    client: &Client,
    raw_url: &str,
    delta: &mut CrawlBatch,
    discovered: &mut HashSet<String>,
) {
    let normalized = match normalize(raw_url) {
        Ok(u) => u,
        Err(_) => {
            delta.visited_updates.push(raw_url.to_string());
            return;
        }
    };

    if !is_valid_link(&normalized, config.base_url.as_deref(), config) {
        delta.visited_updates.push(raw_url.to_string());
        return;
    }

    let outcome = fetcher::fetch(client, &normalized).await;
    match outcome {
        Err(CrawlError::Network { source, .. }) => {
            tracing::debug!(url = %normalized, error = %source, "network error");
            delta.visited_updates.push(raw_url.to_string());
            delta.retry_increments.push(raw_url.to_string());
            delta.pages_upsert.push(PageUpsert {
                url: normalized,
                content: None,
                metadata: failure_metadata(
                    "NetworkError",
                    &source.to_string(),
                ),
            });
        }
        Err(other) => {
            tracing::debug!(url = %normalized, error = %other, "fetch failed");
            delta.visited_updates.push(raw_url.to_string());
        }
        Ok(FetchOutcome::RetriableStatus { status }) => {
            tracing::debug!(url = %normalized, status, "retriable status");
            delta.visited_updates.push(raw_url.to_string());
            delta.retry_increments.push(raw_url.to_string());
            delta.pages_upsert.push(PageUpsert {
                url: normalized,
                content: None,
                metadata: failure_metadata("RetriableStatus", &status.to_string()),
            });
        }
        Ok(FetchOutcome::NonRetriableStatus { status }) => {
            tracing::debug!(url = %normalized, status, "non-retriable status, permanent skip");
            delta.visited_updates.push(raw_url.to_string());
        }
        Ok(FetchOutcome::NonHtml { content_type }) => {
            tracing::debug!(url = %normalized, ?content_type, "non-HTML content, permanent skip");
            delta.visited_updates.push(raw_url.to_string());
        }
        Ok(FetchOutcome::Html { body }) => {
            if config.urls_list.is_empty() {
                let parsed = parse_html(&body, &normalized);
                for link in parsed.links {
                    if is_valid_link(&link, config.base_url.as_deref(), config) {
                        discovered.insert(link);
                    }
                }
            }

            delta.visited_updates.push(raw_url.to_string());

            match scrape(&body, &config.include_filters, &config.exclude_filters) {
                Some(result) => {
                    let metadata = serde_json::to_string(&result.metadata)
                        .unwrap_or_else(|_| "{}".to_string());
                    delta.retry_resets.push(raw_url.to_string());
                    delta.pages_upsert.push(PageUpsert {
                        url: normalized,
                        content: Some(result.markdown),
                        metadata,
                    });
                }
                None => {
                    tracing::debug!(url = %normalized, "scrape produced no content");
                    delta.retry_increments.push(raw_url.to_string());
                    delta.pages_upsert.push(PageUpsert {
                        url: normalized,
                        content: None,
                        metadata: failure_metadata("NoContentError", "No content extracted"),
                    });
                }
            }
        }
    }
}
