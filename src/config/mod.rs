//! Configuration module for Web-Trawl
//!
//! This module holds the immutable run configuration, loads it from TOML files
//! and validates it before any fetch is issued.
//!
//! # Example
//!
//! ```no_run
//! use web_trawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler will start from {} seeds", config.seeds.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ExtractionRule, FetchConfig, LimitRule, PaginationSpec, RunConfig, ScopeConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config, parse_config_unvalidated};
pub use validation::{validate, MAX_PAGINATION_PAGES};
