//! Run summary aggregation
//!
//! This module folds per-request reports and frontier gate counters into the
//! summary returned by `Engine::wait`, and renders it for the terminal.

use crate::crawler::FetchReport;
use crate::state::PageState;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::Write;

/// A request whose fetch did not produce a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFetch {
    pub url: String,
    pub state: PageState,
    pub reason: String,
}

/// Counters of candidates rejected at the frontier gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateCounts {
    pub out_of_scope: u64,
    pub duplicate: u64,
    pub unresolvable: u64,
    pub depth_exceeded: u64,
}

/// Summary of a finished crawl run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Pages fetched successfully
    pub visited: u64,

    /// Dispatched requests whose fetch failed
    pub failed: u64,

    /// Candidates rejected by the domain scope, including dispatched requests
    /// whose redirect left it
    pub skipped_out_of_scope: u64,

    /// Candidates already claimed earlier in the run
    pub skipped_duplicate: u64,

    /// Hrefs that could not be resolved to an http(s) URL
    pub unresolvable: u64,

    /// Candidates beyond the maximum depth
    pub skipped_depth: u64,

    /// Requests still waiting for a slot when the run was stopped
    pub abandoned: u64,

    /// Dispatched requests whose redirect left the allowed domains
    pub redirected_out_of_scope: u64,

    /// Visited pages served from the response cache
    pub from_cache: u64,

    /// Links extracted across all visited pages (before gating)
    pub links_found: u64,

    /// Every failed fetch, in completion order
    pub failures: Vec<FailedFetch>,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// False when the run was stopped by shutdown or deadline
    pub complete: bool,
}

impl RunSummary {
    /// Creates an empty summary for a run started at `started_at`
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            visited: 0,
            failed: 0,
            skipped_out_of_scope: 0,
            skipped_duplicate: 0,
            unresolvable: 0,
            skipped_depth: 0,
            abandoned: 0,
            redirected_out_of_scope: 0,
            from_cache: 0,
            links_found: 0,
            failures: Vec::new(),
            started_at,
            finished_at: None,
            complete: false,
        }
    }

    /// Folds one request report into the summary
    pub fn record(&mut self, report: &FetchReport) {
        match report.state {
            PageState::Visited => {
                self.visited += 1;
                self.links_found += report.links_found as u64;
                if report.from_cache {
                    self.from_cache += 1;
                }
            }
            PageState::Abandoned => self.abandoned += 1,
            PageState::OutOfScope => {
                self.redirected_out_of_scope += 1;
                self.skipped_out_of_scope += 1;
            }
            state => {
                self.failed += 1;
                self.failures.push(FailedFetch {
                    url: report.request.url.to_string(),
                    state,
                    reason: report
                        .error
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| state.to_string()),
                });
            }
        }
    }

    /// Marks the run finished and folds in the gate counters
    pub fn finish(&mut self, gate: GateCounts, complete: bool) {
        self.skipped_out_of_scope += gate.out_of_scope;
        self.skipped_duplicate = gate.duplicate;
        self.unresolvable = gate.unresolvable;
        self.skipped_depth = gate.depth_exceeded;
        self.complete = complete;
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration of a finished run
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.started_at)
    }

    /// Number of requests that reached the dispatcher
    pub fn dispatched(&self) -> u64 {
        self.visited + self.failed + self.abandoned + self.redirected_out_of_scope
    }

    /// Failed fetches grouped by page state
    pub fn failures_by_state(&self) -> HashMap<PageState, u64> {
        let mut counts = HashMap::new();
        for failure in &self.failures {
            *counts.entry(failure.state).or_insert(0) += 1;
        }
        counts
    }

    /// Renders the summary as plain text
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Crawl Summary ===\n");

        let _ = writeln!(out, "Overview:");
        let _ = writeln!(
            out,
            "  Status: {}",
            if self.complete { "complete" } else { "incomplete" }
        );
        if let Some(duration) = self.duration() {
            let _ = writeln!(
                out,
                "  Duration: {:.1}s",
                duration.num_milliseconds() as f64 / 1000.0
            );
        }
        let _ = writeln!(out, "  Visited: {}", self.visited);
        let _ = writeln!(out, "  Failed: {}", self.failed);
        let _ = writeln!(out, "  Served from cache: {}", self.from_cache);
        let _ = writeln!(out, "  Links found: {}", self.links_found);
        let _ = writeln!(out);

        let _ = writeln!(out, "Skipped:");
        let _ = writeln!(out, "  Out of scope: {}", self.skipped_out_of_scope);
        if self.redirected_out_of_scope > 0 {
            let _ = writeln!(out, "    via redirect: {}", self.redirected_out_of_scope);
        }
        let _ = writeln!(out, "  Duplicate: {}", self.skipped_duplicate);
        let _ = writeln!(out, "  Unresolvable: {}", self.unresolvable);
        let _ = writeln!(out, "  Beyond max depth: {}", self.skipped_depth);
        if self.abandoned > 0 {
            let _ = writeln!(out, "  Abandoned at shutdown: {}", self.abandoned);
        }

        if !self.failures.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Failures by State:");
            let mut counts: Vec<_> = self.failures_by_state().into_iter().collect();
            counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
            for (state, count) in counts {
                let _ = writeln!(out, "  {}: {}", state, count);
            }
        }

        out
    }

    /// Prints the summary to stdout
    pub fn print_summary(&self) {
        print!("{}", self.render());
    }
}
