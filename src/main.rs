//! crawl-to-md command-line interface.

use clap::Parser;
use crawl_to_md::config::{validate, Config};
use crawl_to_md::storage::SqliteStore;
use crawl_to_md::{crawl, output, store_path, CrawlStore};
use tracing_subscriber::EnvFilter;

/// Crawls a single host, converts its pages to Markdown, and exports the
/// accumulated corpus as a concatenated document, a JSON array, and a
/// per-URL file tree.
#[derive(Parser, Debug)]
#[command(name = "crawl-to-md")]
#[command(version)]
#[command(about = "Crawl a site and export its pages as Markdown", long_about = None)]
struct Cli {
    /// Base URL to crawl; also the scope anchor. Conflicts with --urls-file.
    #[arg(short = 'u', long, conflicts_with = "urls_file")]
    url: Option<String>,

    /// Path to a file of newline-separated seed URLs. Disables link
    /// discovery; conflicts with --url.
    #[arg(long, conflicts_with = "url")]
    urls_file: Option<std::path::PathBuf>,

    /// Directory receiving export artifacts.
    #[arg(long = "output-dir", alias = "output-folder")]
    output_dir: String,

    /// Directory holding the persistence file.
    #[arg(long = "cache-dir", alias = "cache-folder")]
    cache_dir: String,

    /// HTTP/HTTPS/SOCKS proxy URL, probed with a HEAD request at startup.
    #[arg(short = 'p', long)]
    proxy: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 10.0)]
    timeout: f64,

    /// Element selector to keep (`#id`, `.class`, or tag only). Repeatable.
    #[arg(short = 'i', long = "include")]
    include: Vec<String>,

    /// Element selector to drop (`#id`, `.class`, or tag only). Repeatable.
    #[arg(short = 'x', long = "exclude")]
    exclude: Vec<String>,

    /// URL substring a discovered link must contain. Repeatable.
    #[arg(long = "include-url")]
    include_url: Vec<String>,

    /// URL substring that excludes a discovered link. Repeatable.
    #[arg(long = "exclude-url")]
    exclude_url: Vec<String>,

    /// Max requests per 60-second window; 0 disables.
    #[arg(long, default_value_t = 0)]
    rate_limit: u32,

    /// Seconds to sleep before each request; 0 disables.
    #[arg(long, default_value_t = 0.0)]
    delay: f64,

    /// Retry ceiling for retriable failures.
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Trades a human-readable backup/rendering for smaller export output.
    #[arg(short = 'm', long)]
    minify: bool,

    /// Title used as the level-1 header in the concatenated export.
    #[arg(long, default_value = "Crawled Pages")]
    title: String,

    /// Delete the persistence file before opening.
    #[arg(short = 'w', long)]
    overwrite_cache: bool,

    /// Skip the concatenated Markdown and file-tree export.
    #[arg(long)]
    no_markdown: bool,

    /// Skip the JSON export.
    #[arg(long)]
    no_json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn load_urls_file(path: &std::path::Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

fn build_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let urls_list = match &cli.urls_file {
        Some(path) => load_urls_file(path)?,
        None => Vec::new(),
    };

    let config = Config {
        base_url: cli.url.clone(),
        urls_list,
        exclude_patterns: cli.exclude_url.clone(),
        include_url_patterns: cli.include_url.clone(),
        include_filters: cli.include.clone(),
        exclude_filters: cli.exclude.clone(),
        rate_limit: cli.rate_limit,
        delay: cli.delay,
        timeout: cli.timeout,
        proxy: cli.proxy.clone(),
        max_retries: cli.max_retries,
        minify: cli.minify,
        title: cli.title.clone(),
        overwrite_cache: cli.overwrite_cache,
        output_dir: cli.output_dir.clone(),
        cache_dir: cli.cache_dir.clone(),
        export_markdown: !cli.no_markdown,
        export_json: !cli.no_json,
    };

    validate(&config)?;
    Ok(config)
}

fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("crawl_to_md=info,warn"),
            1 => EnvFilter::new("crawl_to_md=debug,info"),
            2 => EnvFilter::new("crawl_to_md=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    tracing::info!(output_dir = %config.output_dir, cache_dir = %config.cache_dir, "starting crawl");
    crawl(config.clone()).await?;
    tracing::info!("crawl finished, exporting");

    let path = store_path(&config)?;
    let store = SqliteStore::open(&path)?;
    let export_result = output::export_all(&config, &store);
    store.close()?;
    export_result?;

    tracing::info!(output_dir = %config.output_dir, "export complete");
    Ok(())
}
