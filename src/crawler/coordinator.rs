//! Crawl engine - frontier gate and task orchestration
//!
//! This module contains the engine that coordinates a crawl run:
//! - Gating every candidate URL (resolve, scope, depth, claim)
//! - Spawning one fetch task per accepted request
//! - Feeding extracted links back through the same gate
//! - Collecting per-request reports until no work remains
//!
//! Termination is a channel join. Every fetch task owns a clone of the report
//! sender and clones it again for each child it submits before finishing, so
//! the report channel closes exactly when no task is queued or in flight and
//! the engine has released its own sender in [`Engine::wait`].

use crate::config::{validate, RunConfig};
use crate::crawler::fetcher::{FetchError, Fetcher, HttpFetcher};
use crate::crawler::pagination::generate_pages;
use crate::crawler::parser::{compile_rules, extract_links_from_html, CompiledRule};
use crate::crawler::scheduler::{DispatchLimiter, Dispatcher, QueueTicket};
use crate::output::{GateCounts, RunSummary};
use crate::state::{EngineState, PageState, VisitedSet};
use crate::url::{extract_domain, in_scope, resolve};
use crate::ConfigResult;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Normalized absolute URL
    pub url: Url,

    /// Link depth (seeds and pagination pages are depth 0)
    pub depth: u32,

    /// Page the link was discovered on
    pub source: Option<Url>,
}

/// Result of offering a candidate URL to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Claimed and handed to the dispatcher
    Enqueued,

    /// Empty, fragment-only, relative without a base, or not http(s)
    Unresolvable,

    /// Host outside the allowed domains
    OutOfScope,

    /// Already claimed earlier in this run
    Duplicate,

    /// Deeper than the configured maximum depth
    DepthExceeded,

    /// The engine stopped accepting work (shutdown, deadline or finished)
    Closed,
}

/// Outcome of one dispatched request, sent back to the engine
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub request: CrawlRequest,
    pub state: PageState,
    pub error: Option<FetchError>,
    pub from_cache: bool,
    pub links_found: usize,
}

impl FetchReport {
    fn abandoned(request: CrawlRequest) -> Self {
        Self {
            request,
            state: PageState::Abandoned,
            error: None,
            from_cache: false,
            links_found: 0,
        }
    }

    fn failed(request: CrawlRequest, error: FetchError) -> Self {
        Self {
            request,
            state: error.state(),
            error: Some(error),
            from_cache: false,
            links_found: 0,
        }
    }
}

#[derive(Debug, Default)]
struct GateCounters {
    out_of_scope: AtomicU64,
    duplicate: AtomicU64,
    unresolvable: AtomicU64,
    depth_exceeded: AtomicU64,
}

impl GateCounters {
    fn snapshot(&self) -> GateCounts {
        GateCounts {
            out_of_scope: self.out_of_scope.load(Ordering::Relaxed),
            duplicate: self.duplicate.load(Ordering::Relaxed),
            unresolvable: self.unresolvable.load(Ordering::Relaxed),
            depth_exceeded: self.depth_exceeded.load(Ordering::Relaxed),
        }
    }
}

/// State shared by the engine and all of its fetch tasks
struct Shared {
    config: Arc<RunConfig>,
    rules: Vec<CompiledRule>,
    visited: VisitedSet,
    dispatcher: Arc<Dispatcher>,
    fetcher: Arc<dyn Fetcher>,
    shutdown: CancellationToken,
    gate: GateCounters,
    submitted: AtomicBool,
    finished: AtomicBool,
}

type ReportSender = mpsc::UnboundedSender<FetchReport>;

impl Shared {
    /// Runs a candidate href through the frontier gate and spawns a fetch task
    /// for it if every check passes
    ///
    /// Gate order: resolve, scope, depth, claim. The claim comes last so a URL
    /// rejected for scope or depth is never marked as visited.
    fn submit(
        self: &Arc<Self>,
        reports: &ReportSender,
        base: Option<&Url>,
        href: &str,
        depth: u32,
    ) -> SubmitOutcome {
        if self.shutdown.is_cancelled() || self.finished.load(Ordering::SeqCst) {
            tracing::debug!("Engine closed, dropping {}", href);
            return SubmitOutcome::Closed;
        }

        let url = match resolve(base, href) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Skipping {:?}: {}", href, e);
                self.gate.unresolvable.fetch_add(1, Ordering::Relaxed);
                return SubmitOutcome::Unresolvable;
            }
        };

        if !in_scope(&url, &self.config.scope) {
            tracing::debug!("Out of scope: {}", url);
            self.gate.out_of_scope.fetch_add(1, Ordering::Relaxed);
            return SubmitOutcome::OutOfScope;
        }

        if let Some(max_depth) = self.config.max_depth {
            if depth > max_depth {
                tracing::debug!("Depth {} exceeds {}: {}", depth, max_depth, url);
                self.gate.depth_exceeded.fetch_add(1, Ordering::Relaxed);
                return SubmitOutcome::DepthExceeded;
            }
        }

        if !self.visited.try_claim(&url) {
            self.gate.duplicate.fetch_add(1, Ordering::Relaxed);
            return SubmitOutcome::Duplicate;
        }

        let request = CrawlRequest {
            url,
            depth,
            source: base.cloned(),
        };
        let ticket = self.dispatcher.enqueue();
        self.submitted.store(true, Ordering::SeqCst);

        tokio::spawn(run_request(
            Arc::clone(self),
            reports.clone(),
            request,
            ticket,
        ));

        SubmitOutcome::Enqueued
    }
}

/// Executes one request: wait for a slot, fetch, extract, re-submit links
async fn run_request(
    shared: Arc<Shared>,
    reports: ReportSender,
    request: CrawlRequest,
    ticket: QueueTicket,
) {
    let host = extract_domain(&request.url).unwrap_or_default();
    let Some(slot) = ticket.acquire(&host, &shared.shutdown).await else {
        tracing::debug!("Abandoned {} before dispatch", request.url);
        let _ = reports.send(FetchReport::abandoned(request));
        return;
    };

    tracing::info!("Visiting {}", request.url);

    // Bounded by the request timeout so a stalled fetcher always frees its slot
    let timeout = shared.config.fetch.timeout();
    let result = match tokio::time::timeout(timeout, shared.fetcher.fetch(&request.url)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            url: request.url.to_string(),
        }),
    };

    let report = match result {
        // Cached entries and custom fetchers can still land outside the scope
        Ok(response) if !in_scope(&response.final_url, &shared.config.scope) => {
            tracing::debug!(
                "Dropping {}: redirected out of scope to {}",
                request.url,
                response.final_url
            );
            let error = FetchError::OffScopeRedirect {
                url: request.url.to_string(),
                target: response.final_url.to_string(),
            };
            FetchReport::failed(request, error)
        }
        Ok(response) => {
            let links = extract_links_from_html(&response.body, &shared.rules);
            let child_depth = request.depth.saturating_add(1);
            for href in &links {
                shared.submit(&reports, Some(&response.final_url), href, child_depth);
            }

            FetchReport {
                state: PageState::Visited,
                error: None,
                from_cache: response.from_cache,
                links_found: links.len(),
                request,
            }
        }
        Err(e) => {
            tracing::warn!("{}", e);
            FetchReport::failed(request, e)
        }
    };

    drop(slot);
    let _ = reports.send(report);
}

/// The crawl engine
///
/// # Lifecycle
///
/// 1. Build with [`Engine::new`] (or [`Engine::with_fetcher`]); the engine is
///    `Idle` and every configuration error has already been reported
/// 2. [`Engine::start`] submits the seeds or the generated pagination pages
/// 3. [`Engine::wait`] blocks until nothing is queued or in flight and returns
///    the run summary
///
/// Submitting and starting spawn tasks and must happen inside a Tokio runtime.
pub struct Engine {
    shared: Arc<Shared>,
    reports_tx: Option<ReportSender>,
    reports_rx: Option<mpsc::UnboundedReceiver<FetchReport>>,
    started: bool,
    started_at: chrono::DateTime<Utc>,
    deadline_at: Option<Instant>,
    summary: Option<RunSummary>,
}

impl Engine {
    /// Creates an engine fetching over HTTP
    ///
    /// # Returns
    ///
    /// * `Ok(Engine)` - Engine in the `Idle` state
    /// * `Err(ConfigError)` - Invalid configuration, no fetch was issued
    pub fn new(config: RunConfig) -> ConfigResult<Self> {
        validate(&config)?;
        let fetcher = HttpFetcher::from_config(&config.fetch, &config.scope)?;
        Self::build(config, Arc::new(fetcher))
    }

    /// Creates an engine using the given fetch capability
    pub fn with_fetcher(config: RunConfig, fetcher: Arc<dyn Fetcher>) -> ConfigResult<Self> {
        validate(&config)?;
        Self::build(config, fetcher)
    }

    /// Assembles an engine from an already validated configuration
    fn build(config: RunConfig, fetcher: Arc<dyn Fetcher>) -> ConfigResult<Self> {
        let rules = compile_rules(&config.rules)?;
        let dispatcher = Dispatcher::new(DispatchLimiter::new(&config.limits)?);
        let deadline_at = config.deadline().map(|d| Instant::now() + d);
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            config: Arc::new(config),
            rules,
            visited: VisitedSet::new(),
            dispatcher,
            fetcher,
            shutdown: CancellationToken::new(),
            gate: GateCounters::default(),
            submitted: AtomicBool::new(false),
            finished: AtomicBool::new(false),
        });

        Ok(Self {
            shared,
            reports_tx: Some(reports_tx),
            reports_rx: Some(reports_rx),
            started: false,
            started_at: Utc::now(),
            deadline_at,
            summary: None,
        })
    }

    /// Submits the run's initial work
    ///
    /// In explicit-seed mode every seed is submitted; in pagination mode every
    /// generated page is submitted in ascending order. Calling this more than
    /// once has no further effect.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        let initial = match self.shared.config.active_pagination() {
            Some(spec) => generate_pages(spec),
            None => self.shared.config.seeds.clone(),
        };

        tracing::info!("Starting crawl with {} initial URL(s)", initial.len());
        for url in &initial {
            let outcome = self.submit(url);
            if outcome != SubmitOutcome::Enqueued {
                tracing::debug!("Initial URL {} not enqueued: {:?}", url, outcome);
            }
        }
    }

    /// Offers an absolute URL to the engine at depth 0
    ///
    /// The URL passes through the same gate as discovered links. Returns
    /// `SubmitOutcome::Closed` once shutdown was requested or `wait` has begun.
    pub fn submit(&self, url: &str) -> SubmitOutcome {
        match &self.reports_tx {
            Some(reports) => self.shared.submit(reports, None, url, 0),
            None => SubmitOutcome::Closed,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        let dispatcher = &self.shared.dispatcher;
        EngineState::from_counts(
            self.shared.submitted.load(Ordering::SeqCst),
            dispatcher.queued(),
            dispatcher.in_flight(),
            self.shared.finished.load(Ordering::SeqCst),
        )
    }

    /// Token requesting a graceful shutdown when cancelled
    ///
    /// After cancellation no new work is accepted, requests still waiting for
    /// a slot are abandoned and in-flight fetches run to completion.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shared.shutdown.clone()
    }

    /// Number of URLs claimed so far
    pub fn claimed(&self) -> usize {
        self.shared.visited.len()
    }

    /// Blocks until the engine reaches `Done` and returns the run summary
    ///
    /// Starts the run first if [`Engine::start`] was not called. Calling
    /// `wait` again returns the same summary.
    pub async fn wait(&mut self) -> RunSummary {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }

        self.start();
        // Our sender must go or the channel never closes
        self.reports_tx = None;

        let mut summary = RunSummary::new(self.started_at);
        if let Some(mut reports) = self.reports_rx.take() {
            let deadline_at = self.deadline_at;
            let deadline = async move {
                match deadline_at {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::pin!(deadline);
            let mut deadline_passed = false;

            loop {
                tokio::select! {
                    report = reports.recv() => match report {
                        Some(report) => summary.record(&report),
                        None => break,
                    },
                    _ = &mut deadline, if !deadline_passed => {
                        deadline_passed = true;
                        tracing::warn!("Run deadline reached, draining in-flight requests");
                        self.shared.shutdown.cancel();
                    }
                }
            }
        }

        self.shared.finished.store(true, Ordering::SeqCst);
        let complete = !self.shared.shutdown.is_cancelled();
        summary.finish(self.shared.gate.snapshot(), complete);

        tracing::info!(
            "Crawl {}: {} visited, {} failed in {:?}",
            if complete { "completed" } else { "stopped early" },
            summary.visited,
            summary.failed,
            summary.duration().and_then(|d| d.to_std().ok()),
        );

        self.summary = Some(summary.clone());
        summary
    }

    /// Starts the run and waits for it to finish
    pub async fn run(mut self) -> RunSummary {
        self.wait().await
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Orphaned tasks would otherwise keep crawling in the background
        if !self.shared.finished.load(Ordering::SeqCst) {
            self.shared.shutdown.cancel();
        }
    }
}
