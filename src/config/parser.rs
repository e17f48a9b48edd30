use crate::config::types::RunConfig;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(RunConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use web_trawl::config::load_config;
///
/// let config = load_config(Path::new("crawl.toml")).unwrap();
/// println!("Seeds: {}", config.seeds.len());
/// ```
pub fn load_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates a configuration from TOML text
pub fn parse_config(content: &str) -> Result<RunConfig, ConfigError> {
    let config: RunConfig = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Parses a configuration from TOML text without validating it
///
/// The CLI uses this to merge a file with command-line flags before running
/// validation over the combined result.
pub fn parse_config_unvalidated(content: &str) -> Result<RunConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionRule;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
seeds = ["https://example.com/"]
max-depth = 3

[scope]
allowed-domains = ["example.com", "*.example.org"]

[[rules]]
kind = "selector"
selector = "div.item"

[[rules]]
kind = "all-anchors"

[[limits]]
domain-regex = ".*example.*"
parallelism = 2
per-domain = true

[fetch]
user-agent = "TestBot/1.0"
timeout-secs = 5
cache-dir = "./cache"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.seeds, vec!["https://example.com/".to_string()]);
        assert_eq!(config.max_depth, Some(3));
        assert_eq!(config.scope.allowed_domains.len(), 2);
        assert!(!config.scope.is_unrestricted());
        assert_eq!(
            config.rules,
            vec![
                ExtractionRule::Selector {
                    selector: "div.item".to_string(),
                    attribute: "href".to_string(),
                },
                ExtractionRule::AllAnchors,
            ]
        );
        assert_eq!(config.limits.len(), 1);
        assert_eq!(config.limits[0].parallelism, 2);
        assert!(config.limits[0].per_domain);
        assert_eq!(config.fetch.user_agent, "TestBot/1.0");
        assert_eq!(config.fetch.timeout_secs, 5);
        assert!(config.fetch.cache_dir.is_some());
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse_config(r#"seeds = ["https://example.com/"]"#).unwrap();

        assert!(config.scope.is_unrestricted());
        assert_eq!(config.limits.len(), 1);
        assert_eq!(config.limits[0].domain_regex, ".*");
        assert_eq!(config.limits[0].parallelism, 4);
        assert!(!config.limits[0].per_domain);
        assert_eq!(config.effective_rules(), vec![ExtractionRule::AllAnchors]);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert!(config.fetch.cache_dir.is_none());
        assert!(config.deadline().is_none());
    }

    #[test]
    fn test_pagination_defaults() {
        let config = parse_config(
            r#"
[pagination]
template = "https://example.com/list?page=%d"
"#,
        )
        .unwrap();

        let pagination = config.pagination.unwrap();
        assert_eq!(pagination.start, 1);
        assert_eq!(pagination.end, 100);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/crawl.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("max-depth = 2\n");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_unvalidated_parse_skips_checks() {
        let config = parse_config_unvalidated("max-depth = 2\n").unwrap();
        assert!(config.seeds.is_empty());
        assert_eq!(config.max_depth, Some(2));
    }
}
