use serde::Deserialize;

fn default_timeout() -> f64 {
    10.0
}

fn default_max_retries() -> u32 {
    3
}

fn default_title() -> String {
    "Crawled Pages".to_string()
}

fn default_true() -> bool {
    true
}

/// Recognized crawl configuration, matching the options table one-for-one.
///
/// `output_dir`/`cache_dir` accept `output-folder`/`cache-folder` as serde
/// aliases so either naming deserializes the same field.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Single seed and scope anchor. Mutually exclusive with `urls_list`.
    pub base_url: Option<String>,

    /// Alternative to `base_url`: explicit seed list. Disables link discovery.
    #[serde(default)]
    pub urls_list: Vec<String>,

    /// A URL is excluded if any pattern matches as a substring.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// When non-empty, a URL must match at least one pattern as a substring.
    #[serde(default)]
    pub include_url_patterns: Vec<String>,

    /// CSS-like selectors (`#id`, `.class`, or tag) of elements to keep.
    #[serde(default)]
    pub include_filters: Vec<String>,

    /// Same form as `include_filters`; elements to drop.
    #[serde(default)]
    pub exclude_filters: Vec<String>,

    /// Max requests per 60-second window; 0 disables.
    #[serde(default)]
    pub rate_limit: u32,

    /// Seconds to sleep before each request; 0 disables.
    #[serde(default)]
    pub delay: f64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// HTTP/HTTPS/SOCKS proxy URL, validated with a startup probe.
    pub proxy: Option<String>,

    /// Retry ceiling for retriable failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Applies the minifier transform on export.
    #[serde(default)]
    pub minify: bool,

    /// Title used as the level-1 header in concatenated export.
    #[serde(default = "default_title")]
    pub title: String,

    /// Delete the persistence file before opening.
    #[serde(default)]
    pub overwrite_cache: bool,

    /// Directory receiving export artifacts.
    #[serde(alias = "output-folder")]
    pub output_dir: String,

    /// Directory holding the persistence file.
    #[serde(alias = "cache-folder")]
    pub cache_dir: String,

    /// Whether to run the concatenated-Markdown export.
    #[serde(default = "default_true")]
    pub export_markdown: bool,

    /// Whether to run the JSON export.
    #[serde(default = "default_true")]
    pub export_json: bool,
}
