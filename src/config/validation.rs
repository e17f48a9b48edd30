use crate::config::types::{LimitRule, PaginationSpec, RunConfig, ScopeConfig};
use crate::crawler::{compile_rules, generate_pages, DispatchLimiter};
use crate::ConfigError;
use url::Url;

/// Upper bound on the number of pages a pagination spec may generate
pub const MAX_PAGINATION_PAGES: u64 = 100_000;

/// Validates the entire configuration
pub fn validate(config: &RunConfig) -> Result<(), ConfigError> {
    validate_mode(config)?;
    if let Some(pagination) = config.active_pagination() {
        validate_pagination(pagination)?;
    }
    validate_seeds(&config.seeds)?;
    validate_scope(&config.scope)?;
    validate_limits(&config.limits)?;
    compile_rules(&config.rules)?;

    if config.fetch.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// A run uses either explicit seeds or a pagination template, never both
fn validate_mode(config: &RunConfig) -> Result<(), ConfigError> {
    match (config.seeds.is_empty(), config.active_pagination()) {
        (true, None) => Err(ConfigError::Validation(
            "no seed URLs and no pagination template supplied".to_string(),
        )),
        (false, Some(_)) => Err(ConfigError::Validation(
            "seed URLs and a pagination template are mutually exclusive".to_string(),
        )),
        _ => Ok(()),
    }
}

fn validate_pagination(spec: &PaginationSpec) -> Result<(), ConfigError> {
    if spec.template.matches("%d").count() != 1 {
        return Err(ConfigError::InvalidTemplate(spec.template.clone()));
    }

    if spec.start > spec.end {
        return Err(ConfigError::Validation(format!(
            "pagination start ({}) must not exceed end ({})",
            spec.start, spec.end
        )));
    }

    // Pages are generated eagerly at run start
    let pages = u64::from(spec.end) - u64::from(spec.start) + 1;
    if pages > MAX_PAGINATION_PAGES {
        return Err(ConfigError::Validation(format!(
            "pagination covers {} pages, at most {} are allowed",
            pages, MAX_PAGINATION_PAGES
        )));
    }

    // Every page URL shares the same shape, so checking the first is enough
    let first = PaginationSpec {
        end: spec.start,
        ..spec.clone()
    };
    for page in generate_pages(&first) {
        validate_absolute_url(&page)?;
    }

    Ok(())
}

fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    for seed in seeds {
        validate_absolute_url(seed)?;
    }
    Ok(())
}

fn validate_absolute_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}' must use the http or https scheme",
            raw
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!("'{}' has no host", raw)));
    }

    Ok(())
}

fn validate_scope(scope: &ScopeConfig) -> Result<(), ConfigError> {
    for pattern in &scope.allowed_domains {
        validate_domain_pattern(pattern)?;
    }
    Ok(())
}

fn validate_limits(limits: &[LimitRule]) -> Result<(), ConfigError> {
    if limits.is_empty() {
        return Err(ConfigError::Validation(
            "at least one limit rule is required".to_string(),
        ));
    }

    for rule in limits {
        if rule.parallelism < 1 {
            return Err(ConfigError::Validation(format!(
                "parallelism for '{}' must be >= 1, got {}",
                rule.domain_regex, rule.parallelism
            )));
        }
    }

    DispatchLimiter::new(limits).map(|_| ())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    // Check if it's a wildcard pattern
    match pattern.strip_prefix("*.") {
        // Validate the base domain part
        Some(domain) => validate_domain_string(domain),
        // Regular domain
        None => validate_domain_string(pattern),
    }
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    // Single-label host used for local testing
    if domain == "localhost" {
        return Ok(());
    }

    // Check for invalid characters
    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    // Check that it doesn't start or end with a dot or hyphen
    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    // Check for consecutive dots
    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    // Must contain at least one dot (e.g., example.com, not just "example")
    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionRule;

    fn seeded(seed: &str) -> RunConfig {
        RunConfig {
            seeds: vec![seed.to_string()],
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_validate_domain_pattern() {
        assert!(validate_domain_pattern("example.com").is_ok());
        assert!(validate_domain_pattern("*.example.com").is_ok());
        assert!(validate_domain_pattern("sub.example.com").is_ok());
        assert!(validate_domain_pattern("127.0.0.1").is_ok());
        assert!(validate_domain_pattern("localhost").is_ok());

        assert!(validate_domain_pattern("").is_err());
        assert!(validate_domain_pattern("*.").is_err());
        assert!(validate_domain_pattern("example").is_err());
        assert!(validate_domain_pattern(".example.com").is_err());
        assert!(validate_domain_pattern("example.com.").is_err());
        assert!(validate_domain_pattern("exa mple.com").is_err());
    }

    #[test]
    fn test_seed_mode_is_valid() {
        assert!(validate(&seeded("https://example.com/")).is_ok());
    }

    #[test]
    fn test_no_seeds_and_no_pagination() {
        let result = validate(&RunConfig::default());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_seeds_and_pagination_are_exclusive() {
        let mut config = seeded("https://example.com/");
        config.pagination = Some(PaginationSpec::new("https://example.com/p=%d"));
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_empty_template_falls_back_to_seeds() {
        let mut config = seeded("https://example.com/");
        config.pagination = Some(PaginationSpec::new(""));
        assert!(validate(&config).is_ok());
        assert!(config.active_pagination().is_none());
    }

    #[test]
    fn test_pagination_mode_is_valid() {
        let config = RunConfig {
            pagination: Some(PaginationSpec::new("https://example.com/list?page=%d")),
            ..RunConfig::default()
        };
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_pagination_template_needs_one_placeholder() {
        for template in ["https://example.com/", "https://example.com/%d/%d"] {
            let config = RunConfig {
                pagination: Some(PaginationSpec::new(template)),
                ..RunConfig::default()
            };
            assert!(matches!(
                validate(&config),
                Err(ConfigError::InvalidTemplate(_))
            ));
        }
    }

    #[test]
    fn test_pagination_range_order() {
        let config = RunConfig {
            pagination: Some(PaginationSpec {
                template: "https://example.com/p=%d".to_string(),
                start: 5,
                end: 4,
            }),
            ..RunConfig::default()
        };
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_pagination_range_is_capped() {
        let at_limit = RunConfig {
            pagination: Some(PaginationSpec {
                template: "https://example.com/p=%d".to_string(),
                start: 1,
                end: MAX_PAGINATION_PAGES as u32,
            }),
            ..RunConfig::default()
        };
        assert!(validate(&at_limit).is_ok());

        let huge = RunConfig {
            pagination: Some(PaginationSpec {
                template: "https://example.com/p=%d".to_string(),
                start: 0,
                end: u32::MAX,
            }),
            ..RunConfig::default()
        };
        assert!(matches!(validate(&huge), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_pagination_template_must_be_absolute() {
        let config = RunConfig {
            pagination: Some(PaginationSpec::new("/relative/p=%d")),
            ..RunConfig::default()
        };
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_invalid_seed() {
        assert!(matches!(
            validate(&seeded("not a url")),
            Err(ConfigError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate(&seeded("ftp://example.com/")),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_zero_parallelism() {
        let mut config = seeded("https://example.com/");
        config.limits[0].parallelism = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_no_limit_rules() {
        let mut config = seeded("https://example.com/");
        config.limits.clear();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_invalid_limiter_regex() {
        let mut config = seeded("https://example.com/");
        config.limits[0].domain_regex = "(unclosed".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidLimiter { .. })
        ));
    }

    #[test]
    fn test_invalid_selector() {
        let mut config = seeded("https://example.com/");
        config.rules = vec![ExtractionRule::selector("div[[")];
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_invalid_allowed_domain() {
        let mut config = seeded("https://example.com/");
        config.scope = ScopeConfig::allowed(["not_a domain"]);
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }
}
