//! URL handling module for Web-Trawl
//!
//! This module resolves hrefs into canonical absolute URLs and decides whether
//! a URL falls inside the run's domain scope. Everything here is a pure
//! function of its inputs.

mod matcher;
mod normalize;

pub use crate::config::ScopeConfig;
pub use matcher::matches_domain;
pub use normalize::{normalize_url, resolve};

use url::Url;

/// Extracts the lowercase host of a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use web_trawl::url::extract_domain;
///
/// let url = Url::parse("https://Sub.EXAMPLE.com:8080/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("sub.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Decides whether a URL may be followed under the given scope
///
/// Returns true unconditionally for an unrestricted scope. Otherwise the
/// URL's host must match one of the allowed domain patterns (see
/// [`matches_domain`]).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use web_trawl::url::{in_scope, ScopeConfig};
///
/// let scope = ScopeConfig::allowed(["example.com"]);
/// assert!(in_scope(&Url::parse("https://example.com/a").unwrap(), &scope));
/// assert!(!in_scope(&Url::parse("https://other.com/a").unwrap(), &scope));
/// ```
pub fn in_scope(url: &Url, scope: &ScopeConfig) -> bool {
    if scope.is_unrestricted() {
        return true;
    }

    match extract_domain(url) {
        Some(host) => scope
            .allowed_domains
            .iter()
            .any(|pattern| matches_domain(pattern, &host)),
        None => false,
    }
}
