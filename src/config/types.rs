use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for a crawl run
///
/// Built once by the driver (CLI flags or a TOML file) and never mutated after
/// the engine is constructed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunConfig {
    /// Explicit seed URLs (explicit-seed mode)
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Link extraction rules; empty means "follow every anchor"
    #[serde(default)]
    pub rules: Vec<ExtractionRule>,

    /// Domain scope policy
    #[serde(default)]
    pub scope: ScopeConfig,

    /// Numbered pagination sequence (pagination mode)
    #[serde(default)]
    pub pagination: Option<PaginationSpec>,

    /// Concurrency limits, matched against the request host in order
    #[serde(default = "default_limits")]
    pub limits: Vec<LimitRule>,

    /// HTTP fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Maximum link depth from a seed (seeds are depth 0)
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Graceful-shutdown deadline for the whole run, in seconds
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

impl RunConfig {
    /// Returns the run deadline, if one is configured
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }

    /// Returns the pagination spec when pagination mode is active
    ///
    /// A spec with an empty template is ignored and the run falls back to its
    /// explicit seeds.
    pub fn active_pagination(&self) -> Option<&PaginationSpec> {
        self.pagination
            .as_ref()
            .filter(|spec| !spec.template.is_empty())
    }

    /// Returns the effective extraction rules
    ///
    /// An empty rule list falls back to a single "all anchors" rule.
    pub fn effective_rules(&self) -> Vec<ExtractionRule> {
        if self.rules.is_empty() {
            vec![ExtractionRule::AllAnchors]
        } else {
            self.rules.clone()
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            rules: Vec::new(),
            scope: ScopeConfig::default(),
            pagination: None,
            limits: default_limits(),
            fetch: FetchConfig::default(),
            max_depth: None,
            deadline_secs: None,
        }
    }
}

/// A rule selecting which URLs of a fetched page re-enter the frontier
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ExtractionRule {
    /// Follow the `href` of every anchor element
    AllAnchors,

    /// Select elements by CSS selector, then read `attribute` from the
    /// element itself (if it is an anchor) or its first descendant anchor
    Selector {
        selector: String,
        #[serde(default = "default_attribute")]
        attribute: String,
    },
}

impl ExtractionRule {
    /// Creates a selector rule reading the `href` attribute
    pub fn selector(selector: impl Into<String>) -> Self {
        Self::Selector {
            selector: selector.into(),
            attribute: default_attribute(),
        }
    }
}

/// Allowed-domain policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScopeConfig {
    /// Domain patterns (e.g., "example.com" or "*.example.com")
    #[serde(rename = "allowed-domains", default)]
    pub allowed_domains: Vec<String>,

    /// Follow links to any host
    #[serde(default)]
    pub unrestricted: bool,
}

impl ScopeConfig {
    /// A scope that accepts every host
    pub fn unrestricted() -> Self {
        Self {
            allowed_domains: Vec::new(),
            unrestricted: true,
        }
    }

    /// A scope restricted to the given domain patterns
    pub fn allowed<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_domains: domains.into_iter().map(Into::into).collect(),
            unrestricted: false,
        }
    }

    /// Returns true if no domain restriction applies
    ///
    /// An empty allowed-domain list means the run is unrestricted.
    pub fn is_unrestricted(&self) -> bool {
        self.unrestricted || self.allowed_domains.is_empty()
    }
}

/// Pagination template with a single `%d` placeholder
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaginationSpec {
    pub template: String,

    #[serde(default = "default_page_start")]
    pub start: u32,

    #[serde(default = "default_page_end")]
    pub end: u32,
}

impl PaginationSpec {
    /// Creates a spec covering the default page range (1..=100)
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            start: default_page_start(),
            end: default_page_end(),
        }
    }
}

/// Concurrency limit applied to hosts matching `domain_regex`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LimitRule {
    /// Regex matched against the request host
    #[serde(default = "default_domain_regex")]
    pub domain_regex: String,

    /// Maximum concurrently executing fetches per limiter key
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Key the limit by host instead of sharing it across all matching hosts
    #[serde(default)]
    pub per_domain: bool,
}

impl Default for LimitRule {
    fn default() -> Self {
        Self {
            domain_regex: default_domain_regex(),
            parallelism: default_parallelism(),
            per_domain: false,
        }
    }
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetchConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Directory for the on-disk response cache
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            cache_dir: None,
        }
    }
}

fn default_limits() -> Vec<LimitRule> {
    vec![LimitRule::default()]
}

fn default_attribute() -> String {
    "href".to_string()
}

fn default_page_start() -> u32 {
    1
}

fn default_page_end() -> u32 {
    100
}

fn default_domain_regex() -> String {
    ".*".to_string()
}

fn default_parallelism() -> usize {
    4
}

fn default_user_agent() -> String {
    format!("web-trawl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}
