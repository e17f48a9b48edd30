//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with an optional response cache
//! - Link extraction by configurable rules
//! - Pagination URL generation
//! - Concurrency-limited dispatch
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod pagination;
mod parser;
mod scheduler;

pub use coordinator::{CrawlRequest, Engine, FetchReport, SubmitOutcome};
pub use fetcher::{build_http_client, FetchError, FetchResponse, Fetcher, HttpFetcher};
pub use pagination::{generate_pages, PLACEHOLDER};
pub use parser::{compile_rules, extract_links, extract_links_from_html, CompiledRule};
pub use scheduler::{DispatchLimiter, Dispatcher, QueueTicket, Slot, GLOBAL_KEY};

use crate::config::{ExtractionRule, LimitRule, PaginationSpec, RunConfig, ScopeConfig};
use crate::output::RunSummary;
use crate::ConfigResult;

/// Assembles a run from its essential parameters
///
/// Uses a single global concurrency limit of `parallelism` and default fetch
/// settings (no response cache). For the full set of options build a
/// [`RunConfig`] and call [`Engine::new`].
///
/// # Errors
///
/// Returns a `ConfigError` when neither seeds nor a pagination template is
/// given, when both are given, or when any rule or limit is invalid.
///
/// # Example
///
/// ```no_run
/// use web_trawl::{configure_run, ScopeConfig};
///
/// # async fn demo() -> web_trawl::ConfigResult<()> {
/// let mut engine = configure_run(
///     vec!["https://example.com/".to_string()],
///     Vec::new(),
///     ScopeConfig::allowed(["example.com"]),
///     None,
///     4,
/// )?;
/// let summary = engine.wait().await;
/// println!("visited {}", summary.visited);
/// # Ok(())
/// # }
/// ```
pub fn configure_run(
    seeds: Vec<String>,
    rules: Vec<ExtractionRule>,
    scope: ScopeConfig,
    pagination: Option<PaginationSpec>,
    parallelism: usize,
) -> ConfigResult<Engine> {
    let config = RunConfig {
        seeds,
        rules,
        scope,
        pagination,
        limits: vec![LimitRule {
            parallelism,
            ..LimitRule::default()
        }],
        ..RunConfig::default()
    };
    Engine::new(config)
}

/// Runs a complete crawl
///
/// This is the main entry point for a configured run. It will:
/// 1. Validate the configuration
/// 2. Build the HTTP client and response cache
/// 3. Submit seeds or pagination pages
/// 4. Fetch pages and follow extracted links within scope
/// 5. Return the run summary once no work remains
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run finished (individual fetches may have failed)
/// * `Err(CrawlError)` - The configuration was rejected before any fetch
pub async fn crawl(config: RunConfig) -> crate::Result<RunSummary> {
    let engine = Engine::new(config)?;
    Ok(engine.run().await)
}
