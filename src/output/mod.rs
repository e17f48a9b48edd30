//! Output module for crawl run summaries
//!
//! This module handles:
//! - Aggregating per-request reports into a run summary
//! - Rendering the summary for the terminal

pub mod stats;

pub use stats::{FailedFetch, GateCounts, RunSummary};
