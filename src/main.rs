//! Web-Trawl main entry point
//!
//! This is the command-line interface for the Web-Trawl crawler. It builds a
//! run configuration from flags (optionally layered over a TOML file), hands it
//! to the engine and prints the run summary.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use web_trawl::config::{
    parse_config_unvalidated, validate, ExtractionRule, LimitRule, PaginationSpec, RunConfig,
};
use web_trawl::Engine;

/// Default response cache directory
const DEFAULT_CACHE_DIR: &str = "./web_scraper_cache";

/// Web-Trawl: a bounded-concurrency web crawler
///
/// Crawls from seed URLs (or a numbered pagination sequence), following the
/// links selected by CSS rules while staying inside the allowed domains.
#[derive(Parser, Debug)]
#[command(name = "web-trawl")]
#[command(version)]
#[command(about = "A bounded-concurrency web crawler", long_about = None)]
struct Cli {
    /// Seed URLs to start crawling from
    #[arg(value_name = "URL")]
    seeds: Vec<String>,

    /// CSS selector whose descendant-or-self anchors are followed (repeatable)
    #[arg(long = "css", value_name = "SELECTOR")]
    css: Vec<String>,

    /// Domain the crawl may follow links into, e.g. example.com or *.example.com (repeatable)
    #[arg(long = "allowed-domain", value_name = "DOMAIN")]
    allowed_domains: Vec<String>,

    /// URL template with a single %d page-number placeholder
    #[arg(long, value_name = "TEMPLATE")]
    url_pagination_pattern: Option<String>,

    /// Last page number generated from the pagination pattern
    #[arg(long, value_name = "N")]
    pages: Option<u32>,

    /// Maximum concurrent fetches
    #[arg(long, value_name = "N")]
    parallelism: Option<usize>,

    /// Apply the parallelism limit per host instead of globally
    #[arg(long)]
    per_domain: bool,

    /// Response cache directory
    #[arg(long, value_name = "DIR", conflicts_with = "no_cache")]
    cache_dir: Option<PathBuf>,

    /// Disable the response cache
    #[arg(long)]
    no_cache: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Stop accepting new work after this many seconds and drain in-flight fetches
    #[arg(long, value_name = "SECS")]
    deadline: Option<u64>,

    /// Maximum link depth from a seed
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// TOML configuration file; flags given on the command line override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Validate the configuration and show what would be crawled
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let mut engine = Engine::new(config).context("Failed to start crawl")?;

    let shutdown = engine.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight requests");
            shutdown.cancel();
        }
    });

    let summary = engine.wait().await;
    if !cli.quiet {
        summary.print_summary();
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("web_trawl=info,warn"),
            1 => EnvFilter::new("web_trawl=debug,info"),
            2 => EnvFilter::new("web_trawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the run configuration from the config file (if any) and flags
fn build_config(cli: &Cli) -> Result<RunConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse_config_unvalidated(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        }
        None => {
            let mut config = RunConfig::default();
            config.fetch.cache_dir = Some(PathBuf::from(DEFAULT_CACHE_DIR));
            config
        }
    };

    config.seeds.extend(cli.seeds.iter().cloned());
    config
        .rules
        .extend(cli.css.iter().map(|css| ExtractionRule::selector(css.as_str())));
    config
        .scope
        .allowed_domains
        .extend(cli.allowed_domains.iter().cloned());

    if let Some(template) = &cli.url_pagination_pattern {
        let mut spec = PaginationSpec::new(template.as_str());
        if let Some(pages) = cli.pages {
            spec.end = pages;
        }
        config.pagination = Some(spec);
    } else if let (Some(pages), Some(spec)) = (cli.pages, config.pagination.as_mut()) {
        spec.end = pages;
    }

    if cli.parallelism.is_some() || cli.per_domain {
        let base = config.limits.first().cloned().unwrap_or_default();
        config.limits = vec![LimitRule {
            parallelism: cli.parallelism.unwrap_or(base.parallelism),
            per_domain: cli.per_domain || base.per_domain,
            ..LimitRule::default()
        }];
    }

    if cli.no_cache {
        config.fetch.cache_dir = None;
    } else if let Some(dir) = &cli.cache_dir {
        config.fetch.cache_dir = Some(dir.clone());
    }
    if let Some(timeout) = cli.timeout {
        config.fetch.timeout_secs = timeout;
    }
    if cli.deadline.is_some() {
        config.deadline_secs = cli.deadline;
    }
    if cli.max_depth.is_some() {
        config.max_depth = cli.max_depth;
    }

    Ok(config)
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &RunConfig) {
    println!("=== Web-Trawl Dry Run ===\n");

    match config.active_pagination() {
        Some(spec) => {
            println!("Pagination:");
            println!("  Template: {}", spec.template);
            println!("  Pages: {}..={}", spec.start, spec.end);
        }
        None => {
            println!("Seeds ({}):", config.seeds.len());
            for seed in &config.seeds {
                println!("  - {}", seed);
            }
        }
    }

    println!("\nExtraction Rules:");
    for rule in config.effective_rules() {
        match rule {
            ExtractionRule::AllAnchors => println!("  - all anchors"),
            ExtractionRule::Selector {
                selector,
                attribute,
            } => println!("  - {} (attribute: {})", selector, attribute),
        }
    }

    println!("\nScope:");
    if config.scope.is_unrestricted() {
        println!("  unrestricted");
    } else {
        for domain in &config.scope.allowed_domains {
            println!("  - {}", domain);
        }
    }

    println!("\nLimits:");
    for limit in &config.limits {
        println!(
            "  - {} -> {} concurrent{}",
            limit.domain_regex,
            limit.parallelism,
            if limit.per_domain { " per host" } else { "" }
        );
    }

    println!("\nFetch:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    match &config.fetch.cache_dir {
        Some(dir) => println!("  Cache: {}", dir.display()),
        None => println!("  Cache: disabled"),
    }
    if let Some(depth) = config.max_depth {
        println!("  Max depth: {}", depth);
    }
    if let Some(deadline) = config.deadline_secs {
        println!("  Deadline: {}s", deadline);
    }

    println!("\n✓ Configuration is valid");
}
