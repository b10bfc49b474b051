use serde::Deserialize;

/// Default desktop browser identification sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/115.0.0.0 Safari/537.36";

/// Main configuration structure for Catalog-Crawler
///
/// Every section is optional; missing keys fall back to defaults tuned for
/// the default catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub politeness: PolitenessConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The remote catalog being crawled
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Origin that relative item links are resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Search path template; `{term}` is replaced by the search term
    #[serde(rename = "search-path")]
    pub search_path: String,

    /// Substring an anchor's href must contain to count as an item link
    #[serde(rename = "item-marker")]
    pub item_marker: String,

    /// Regex whose first capture group is the product identifier
    #[serde(rename = "id-pattern")]
    pub id_pattern: String,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.magazineluiza.com.br".to_string(),
            search_path: "/busca/{term}/".to_string(),
            item_marker: "/p/".to_string(),
            id_pattern: r"/p/([a-zA-Z0-9]+)/".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// HTTP client behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Additional attempts after the first for retryable responses
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Backoff base in seconds; the n-th retry waits `factor * 2^(n-1)`
    #[serde(rename = "backoff-factor")]
    pub backoff_factor: f64,

    /// Status codes that trigger a retry
    #[serde(rename = "retry-statuses")]
    pub retry_statuses: Vec<u16>,

    /// Maximum number of redirects followed per request
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 3,
            backoff_factor: 1.0,
            retry_statuses: vec![500, 502, 503, 504],
            max_redirects: 10,
        }
    }
}

/// Delays between requests to the target origin
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolitenessConfig {
    /// Pause after each search page request (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    /// Pause before each item page request (milliseconds)
    #[serde(rename = "item-delay-ms")]
    pub item_delay_ms: u64,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: 1500,
            item_delay_ms: 1000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that receives result files, created on demand
    pub directory: String,

    /// File name prefix for result files
    #[serde(rename = "file-prefix")]
    pub file_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "CSV".to_string(),
            file_prefix: "resultado".to_string(),
        }
    }
}
