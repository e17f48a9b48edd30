//! Web-Trawl: a bounded-concurrency web crawler
//!
//! This crate implements a crawl engine that fetches pages from seed URLs (or a
//! numbered pagination sequence), extracts outbound links by configurable
//! selection rules, and follows them while enforcing a domain scope, at-most-once
//! visits and a concurrency ceiling.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Web-Trawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// These are the only errors that abort a run, and they are always raised
/// before the first fetch is issued.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid limiter domain regex '{pattern}': {source}")]
    InvalidLimiter {
        pattern: String,
        source: regex::Error,
    },

    #[error("Invalid pagination template '{0}': expected exactly one %d placeholder")]
    InvalidTemplate(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Failed to open response cache: {0}")]
    Cache(#[from] storage::StorageError),
}

/// URL-specific errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Unresolvable link: {0:?}")]
    Unresolvable(String),

    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Web-Trawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{ExtractionRule, LimitRule, PaginationSpec, RunConfig};
pub use crawler::{configure_run, crawl, Engine};
pub use output::RunSummary;
pub use state::{EngineState, PageState};
pub use crate::url::{in_scope, normalize_url, resolve, ScopeConfig};
