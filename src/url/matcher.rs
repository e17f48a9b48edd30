/// Checks if a host matches an allowed-domain pattern
///
/// Two pattern forms are supported:
/// 1. Exact: "example.com" matches only "example.com"
/// 2. Wildcard: "*.example.com" matches "example.com" itself and any
///    subdomain at any depth
///
/// Comparison is ASCII case-insensitive.
///
/// # Examples
///
/// ```
/// use web_trawl::url::matches_domain;
///
/// assert!(matches_domain("example.com", "Example.com"));
/// assert!(!matches_domain("example.com", "blog.example.com"));
///
/// assert!(matches_domain("*.example.com", "example.com"));
/// assert!(matches_domain("*.example.com", "api.v2.example.com"));
/// assert!(!matches_domain("*.example.com", "notexample.com"));
/// ```
pub fn matches_domain(pattern: &str, host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let pattern = pattern.to_ascii_lowercase();

    match pattern.strip_prefix("*.") {
        Some(base) => {
            host == base
                || host
                    .strip_suffix(base)
                    .map_or(false, |prefix| prefix.ends_with('.'))
        }
        None => host == pattern,
    }
}
