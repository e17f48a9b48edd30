//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client from the fetch configuration
//! - Consulting and filling the response cache
//! - Classifying failures into page states

use crate::config::{FetchConfig, ScopeConfig};
use crate::state::PageState;
use crate::storage::{CachedResponse, DiskCache, ResponseCache};
use crate::url::in_scope;
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// A fetch that did not produce a usable page
///
/// Fetch errors are leaf failures: they are recorded in the run summary and
/// never abort the crawl.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("HTTP error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Redirect from {url} to {target} leaves the allowed domains")]
    OffScopeRedirect { url: String, target: String },
}

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// Marker error raised by the redirect policy for an off-scope hop
#[derive(Debug, Error)]
#[error("redirect to {0} leaves the allowed domains")]
struct RedirectOutOfScope(String);

impl FetchError {
    /// The page state this failure maps to
    pub fn state(&self) -> PageState {
        match self {
            Self::Timeout { .. } | Self::Connect { .. } => PageState::Unreachable,
            Self::Status { status, .. } => PageState::from_status(*status),
            Self::Transport { .. } => PageState::Failed,
            Self::OffScopeRedirect { .. } => PageState::OutOfScope,
        }
    }

    fn from_reqwest(url: &Url, error: reqwest::Error) -> Self {
        let url = url.to_string();
        if let Some(target) = off_scope_target(&error) {
            Self::OffScopeRedirect { url, target }
        } else if error.is_timeout() {
            Self::Timeout { url }
        } else if error.is_connect() {
            Self::Connect {
                url,
                message: error.to_string(),
            }
        } else {
            Self::Transport {
                url,
                message: error.to_string(),
            }
        }
    }
}

/// A successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// URL after redirects; relative links resolve against this
    pub final_url: Url,

    /// HTTP status code (always 2xx)
    pub status: u16,

    /// Page body
    pub body: String,

    /// Whether the response came from the cache
    pub from_cache: bool,
}

/// The HTTP fetch capability consumed by the engine
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches a URL, returning an error for transport failures and non-2xx
    /// statuses
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError>;
}

/// Finds the off-scope redirect target recorded by [`redirect_policy`]
fn off_scope_target(error: &reqwest::Error) -> Option<String> {
    let mut source = std::error::Error::source(error);
    while let Some(inner) = source {
        if let Some(redirect) = inner.downcast_ref::<RedirectOutOfScope>() {
            return Some(redirect.0.clone());
        }
        source = inner.source();
    }
    None
}

/// Redirect policy keeping every hop inside the run's scope
///
/// A hop to a host outside the allowed domains is refused before it is
/// requested, so off-scope servers never see a request.
fn redirect_policy(scope: &ScopeConfig) -> Policy {
    if scope.is_unrestricted() {
        return Policy::limited(MAX_REDIRECTS);
    }

    let scope = scope.clone();
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if in_scope(attempt.url(), &scope) {
            attempt.follow()
        } else {
            let target = attempt.url().to_string();
            tracing::debug!("Refusing redirect to {}", target);
            attempt.error(RedirectOutOfScope(target))
        }
    })
}

/// Builds an HTTP client with the configured user agent and timeout whose
/// redirects stay inside `scope`
///
/// # Example
///
/// ```no_run
/// use web_trawl::config::{FetchConfig, ScopeConfig};
/// use web_trawl::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default(), &ScopeConfig::unrestricted()).unwrap();
/// ```
pub fn build_http_client(
    config: &FetchConfig,
    scope: &ScopeConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .redirect(redirect_policy(scope))
        .timeout(config.timeout())
        .connect_timeout(config.timeout().min(std::time::Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `reqwest`-backed fetcher with an optional response cache
pub struct HttpFetcher {
    client: Client,
    cache: Option<Arc<dyn ResponseCache>>,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cache: None,
        }
    }

    /// Builds a fetcher from configuration, opening the on-disk cache when a
    /// cache directory is set
    pub fn from_config(config: &FetchConfig, scope: &ScopeConfig) -> Result<Self, ConfigError> {
        let fetcher = Self::new(build_http_client(config, scope)?);
        match &config.cache_dir {
            Some(dir) => Ok(fetcher.with_cache(Arc::new(DiskCache::new(dir)?))),
            None => Ok(fetcher),
        }
    }

    /// Attaches a response cache
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    // Cache backends may block on file I/O, so they run on the blocking pool

    async fn cached(&self, url: &Url) -> Option<FetchResponse> {
        let cache = Arc::clone(self.cache.as_ref()?);
        let key = url.clone();
        let lookup = tokio::task::spawn_blocking(move || cache.get(&key)).await;

        match lookup {
            Ok(Ok(Some(entry))) => Some(FetchResponse {
                final_url: entry.final_url,
                status: 200,
                body: entry.body,
                from_cache: true,
            }),
            Ok(Ok(None)) => None,
            Ok(Err(e)) => {
                tracing::warn!("Response cache read failed for {}: {}", url, e);
                None
            }
            Err(e) => {
                tracing::warn!("Response cache read task failed for {}: {}", url, e);
                None
            }
        }
    }

    async fn store(&self, url: &Url, response: &FetchResponse) {
        let Some(cache) = self.cache.as_ref().map(Arc::clone) else {
            return;
        };
        let key = url.clone();
        let entry = CachedResponse {
            final_url: response.final_url.clone(),
            body: response.body.clone(),
        };

        match tokio::task::spawn_blocking(move || cache.put(&key, &entry)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Response cache write failed for {}: {}", url, e),
            Err(e) => tracing::warn!("Response cache write task failed for {}: {}", url, e),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        if let Some(hit) = self.cached(url).await {
            tracing::debug!("Serving {} from cache", url);
            return Ok(hit);
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let fetched = FetchResponse {
            final_url,
            status: status.as_u16(),
            body,
            from_cache: false,
        };
        self.store(url, &fetched).await;
        Ok(fetched)
    }
}
