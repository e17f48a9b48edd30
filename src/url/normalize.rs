use crate::UrlError;
use url::Url;

/// Tracking query parameters dropped from the canonical form
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Resolves an href found on `base` into a canonical absolute URL
///
/// Relative references are joined against the page that produced them. With no
/// base, `raw_href` must already be absolute (seeds and pagination URLs).
///
/// # Errors
///
/// * `UrlError::Unresolvable` - empty href, fragment-only href, or a relative
///   href without a base
/// * `UrlError::Parse` - the joined URL is malformed
/// * `UrlError::InvalidScheme` - anything other than http(s) (`mailto:`,
///   `javascript:`, `data:`, ...)
/// * `UrlError::MissingDomain` - no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use web_trawl::url::resolve;
///
/// let base = Url::parse("https://example.com/docs/index.html").unwrap();
/// let url = resolve(Some(&base), "../about#team").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/about");
/// ```
pub fn resolve(base: Option<&Url>, raw_href: &str) -> Result<Url, UrlError> {
    let href = raw_href.trim();

    if href.is_empty() || href.starts_with('#') {
        return Err(UrlError::Unresolvable(raw_href.to_string()));
    }

    let joined = match base {
        Some(base) => base.join(href),
        None => Url::parse(href),
    };

    let url = match joined {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            return Err(UrlError::Unresolvable(raw_href.to_string()))
        }
        Err(e) => return Err(UrlError::Parse(e.to_string())),
    };

    normalize_url(url)
}

/// Canonicalizes an absolute URL for deduplication
///
/// # Normalization Steps
///
/// 1. Reject non-HTTP(S) schemes and host-less URLs
/// 2. Lowercase the host and drop default ports (done by the `url` parser)
/// 3. Resolve dot segments; an empty path becomes `/` (also done by the parser)
/// 4. Remove the fragment
/// 5. Remove tracking query parameters (`utm_*`, `fbclid`, `gclid`, `mc_eid`)
/// 6. Sort the remaining query parameters by key
/// 7. Remove an empty query string
///
/// Paths are otherwise left untouched, so the canonical URL is still the
/// resource that gets fetched.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use web_trawl::url::normalize_url;
///
/// let url = normalize_url(Url::parse("HTTP://Example.COM:80/a/?b=2&utm_source=x&a=1#top").unwrap()).unwrap();
/// assert_eq!(url.as_str(), "http://example.com/a/?a=1&b=2");
/// ```
pub fn normalize_url(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let original: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let mut kept: Vec<(String, String)> = original
            .iter()
            .filter(|(key, _)| !is_tracking_param(key))
            .cloned()
            .collect();
        kept.sort_by(|a, b| a.0.cmp(&b.0));

        if kept.is_empty() {
            url.set_query(None);
        } else if kept != original {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    Ok(url)
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
