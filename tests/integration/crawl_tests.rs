//! End-to-end crawl tests against a mock HTTP server.

use crawl_to_md::config::Config;
use crawl_to_md::storage::SqliteStore;
use crawl_to_md::{crawl, store_path, CrawlStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str, cache_dir: &std::path::Path, output_dir: &std::path::Path) -> Config {
    Config {
        base_url: Some(base_url.to_string()),
        urls_list: vec![],
        exclude_patterns: vec![],
        include_url_patterns: vec![],
        include_filters: vec![],
        exclude_filters: vec![],
        rate_limit: 0,
        delay: 0.0,
        timeout: 5.0,
        proxy: None,
        max_retries: 3,
        minify: false,
        title: "Crawled Pages".to_string(),
        overwrite_cache: false,
        output_dir: output_dir.to_string_lossy().to_string(),
        cache_dir: cache_dir.to_string_lossy().to_string(),
        export_markdown: true,
        export_json: true,
    }
}

#[tokio::test]
async fn single_page_crawl_persists_content_and_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>Test</title></head><body><p>Hello</p></body></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let cache_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let config = test_config(&format!("{}/page", server.uri()), cache_dir.path(), output_dir.path());

    crawl(config.clone()).await.unwrap();

    let store = SqliteStore::open(&store_path(&config).unwrap()).unwrap();
    assert!(store.get_unvisited_links(10).unwrap().is_empty());

    let pages: Vec<_> = store
        .get_pages_iterator()
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(pages.len(), 1);
    let content = pages[0].content.as_ref().unwrap();
    assert!(content.contains("Hello"));
    let metadata = pages[0].metadata.as_ref().unwrap();
    assert!(metadata.contains("\"title\":\"Test\""));

    store.close().unwrap();
}

#[tokio::test]
async fn discovered_links_honor_exclude_patterns() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(
                    r#"<html><body>
                    <a href="{base_url}/page1">Page 1</a>
                    <a href="{base_url}/exclude/page">Excluded</a>
                    <a href="{base_url}/page2">Page 2</a>
                    </body></html>"#
                ))
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    for p in ["/page1", "/page2"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body>content</body></html>")
                    .insert_header("content-type", "text/html"),
            )
            .mount(&server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/exclude/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("never"))
        .expect(0)
        .mount(&server)
        .await;

    let cache_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&base_url, cache_dir.path(), output_dir.path());
    config.exclude_patterns = vec!["/exclude".to_string()];

    crawl(config.clone()).await.unwrap();

    let store = SqliteStore::open(&store_path(&config).unwrap()).unwrap();
    let mut urls: Vec<String> = store
        .get_pages_iterator()
        .unwrap()
        .map(|r| r.unwrap().url)
        .collect();
    urls.sort();

    let mut expected = vec![
        format!("{base_url}/"),
        format!("{base_url}/page1"),
        format!("{base_url}/page2"),
    ];
    expected.sort();
    assert_eq!(urls, expected);

    store.close().unwrap();
}

#[tokio::test]
async fn retriable_failure_is_requeued_and_succeeds_on_second_run() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>X</title></head><body>recovered</body></html>")
                .insert_header("content-type", "text/html"),
        )
        .with_priority(2)
        .mount(&server)
        .await;

    let cache_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let config = test_config(&format!("{}/x", server.uri()), cache_dir.path(), output_dir.path());

    crawl(config.clone()).await.unwrap();
    {
        let store = SqliteStore::open(&store_path(&config).unwrap()).unwrap();
        let pages: Vec<_> = store.get_pages_iterator().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].content.is_none());
        assert_eq!(store.get_retriable_failed_urls(3).unwrap().len(), 1);
        store.close().unwrap();
    }

    crawl(config.clone()).await.unwrap();
    {
        let store = SqliteStore::open(&store_path(&config).unwrap()).unwrap();
        let pages: Vec<_> = store.get_pages_iterator().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].content.as_ref().unwrap().contains("recovered"));
        assert!(store.get_retriable_failed_urls(3).unwrap().is_empty());
        store.close().unwrap();
    }
}

#[tokio::test]
async fn non_html_content_is_visited_but_not_scraped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/file.pdf"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/pdf"))
        .mount(&server)
        .await;

    let cache_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let config = test_config(
        &format!("{}/file.pdf", server.uri()),
        cache_dir.path(),
        output_dir.path(),
    );

    crawl(config.clone()).await.unwrap();

    let store = SqliteStore::open(&store_path(&config).unwrap()).unwrap();
    assert!(store.get_unvisited_links(10).unwrap().is_empty());
    let pages: Vec<_> = store.get_pages_iterator().unwrap().map(|r| r.unwrap()).collect();
    assert!(pages.is_empty());
    store.close().unwrap();
}
