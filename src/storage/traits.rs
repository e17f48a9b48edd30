//! Response cache trait and error types
//!
//! The HTTP fetcher consults a `ResponseCache` before touching the network, so
//! repeated fetches of a URL can be served without a request. The cache format
//! is up to each backend.

use thiserror::Error;
use url::Url;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache entry for {url}: {reason}")]
    Corrupt { url: String, reason: String },
}

/// Result type for cache operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A cached successful response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// URL the response was finally served from (after redirects)
    pub final_url: Url,

    /// Response body
    pub body: String,
}

/// Trait for response cache implementations
///
/// Implementations must be safe to share across fetch tasks.
pub trait ResponseCache: Send + Sync {
    /// Looks up a cached response for the requested URL
    ///
    /// # Returns
    ///
    /// * `Ok(Some(CachedResponse))` - Cache hit
    /// * `Ok(None)` - Cache miss
    /// * `Err(StorageError)` - The backend failed
    fn get(&self, url: &Url) -> StorageResult<Option<CachedResponse>>;

    /// Stores a successful response under the requested URL
    fn put(&self, url: &Url, response: &CachedResponse) -> StorageResult<()>;
}
