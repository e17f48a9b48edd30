//! Rate-limited dispatcher
//!
//! This module handles:
//! - Compiling limit rules into semaphores keyed by limiter key
//! - Tracking queued and in-flight requests
//! - Releasing a slot whenever its holder finishes, fails or panics
//!
//! A request's host is matched against the limit rules in order; the first
//! matching rule governs it. A shared rule has a single key (its pattern, "*"
//! for the default catch-all), a per-domain rule keys by host. Hosts matching
//! no rule are not limited.

use crate::config::LimitRule;
use crate::ConfigError;
use regex::Regex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Key used for the catch-all `.*` rule
pub const GLOBAL_KEY: &str = "*";

/// A compiled limit rule
#[derive(Debug)]
struct Limit {
    regex: Regex,
    key: String,
    parallelism: usize,
    per_domain: bool,
    shared: Arc<Semaphore>,
    per_host: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl Limit {
    fn semaphore(&self, host: &str) -> (String, Arc<Semaphore>) {
        if !self.per_domain {
            return (self.key.clone(), Arc::clone(&self.shared));
        }

        let mut per_host = self.per_host.lock().unwrap_or_else(PoisonError::into_inner);
        let semaphore = per_host
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.parallelism)));
        (host.to_string(), Arc::clone(semaphore))
    }
}

/// Concurrency limiter over an ordered list of limit rules
///
/// Invariant: the number of concurrently held slots for one limiter key never
/// exceeds that rule's parallelism.
#[derive(Debug)]
pub struct DispatchLimiter {
    limits: Vec<Limit>,
}

impl DispatchLimiter {
    /// Compiles limit rules
    ///
    /// # Errors
    ///
    /// * `ConfigError::InvalidLimiter` - a domain regex does not compile
    /// * `ConfigError::Validation` - a rule has zero parallelism
    pub fn new(rules: &[LimitRule]) -> Result<Self, ConfigError> {
        let limits = rules
            .iter()
            .map(|rule| {
                if rule.parallelism == 0 {
                    return Err(ConfigError::Validation(format!(
                        "parallelism for '{}' must be >= 1",
                        rule.domain_regex
                    )));
                }
                let regex =
                    Regex::new(&rule.domain_regex).map_err(|source| ConfigError::InvalidLimiter {
                        pattern: rule.domain_regex.clone(),
                        source,
                    })?;
                let key = if rule.domain_regex == ".*" {
                    GLOBAL_KEY.to_string()
                } else {
                    rule.domain_regex.clone()
                };
                Ok(Limit {
                    regex,
                    key,
                    parallelism: rule.parallelism,
                    per_domain: rule.per_domain,
                    shared: Arc::new(Semaphore::new(rule.parallelism)),
                    per_host: Mutex::new(HashMap::new()),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { limits })
    }

    /// Returns the limiter key and semaphore governing a host, if any
    pub fn semaphore_for(&self, host: &str) -> Option<(String, Arc<Semaphore>)> {
        self.limits
            .iter()
            .find(|limit| limit.regex.is_match(host))
            .map(|limit| limit.semaphore(host))
    }

    /// Returns the limiter key governing a host, if any
    pub fn key_for(&self, host: &str) -> Option<String> {
        self.semaphore_for(host).map(|(key, _)| key)
    }
}

/// Dispatcher bounding concurrently executing fetch tasks
///
/// Work is submitted in two steps: `enqueue` registers a request as waiting
/// (synchronously, so the engine's state reflects it at once), and
/// `QueueTicket::acquire` waits for a slot.
#[derive(Debug)]
pub struct Dispatcher {
    limiter: DispatchLimiter,
    queued: AtomicUsize,
    in_flight: AtomicUsize,
}

impl Dispatcher {
    pub fn new(limiter: DispatchLimiter) -> Arc<Self> {
        Arc::new(Self {
            limiter,
            queued: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
        })
    }

    /// Registers a request waiting for a slot
    pub fn enqueue(self: &Arc<Self>) -> QueueTicket {
        self.queued.fetch_add(1, Ordering::SeqCst);
        QueueTicket {
            dispatcher: Arc::clone(self),
        }
    }

    /// Requests waiting for a slot
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    /// Requests holding a slot
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn limiter(&self) -> &DispatchLimiter {
        &self.limiter
    }
}

/// A request waiting for a dispatch slot
///
/// Dropping the ticket without acquiring removes the request from the queue.
#[derive(Debug)]
pub struct QueueTicket {
    dispatcher: Arc<Dispatcher>,
}

impl QueueTicket {
    /// Waits for a slot under the limiter key governing `host`
    ///
    /// # Returns
    ///
    /// * `Some(Slot)` - the request may run; the slot is released on drop
    /// * `None` - `shutdown` fired before a slot became available
    pub async fn acquire(self, host: &str, shutdown: &CancellationToken) -> Option<Slot> {
        if shutdown.is_cancelled() {
            return None;
        }

        let (key, permit) = match self.dispatcher.limiter.semaphore_for(host) {
            Some((key, semaphore)) => {
                let permit = tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => return None,
                    permit = semaphore.acquire_owned() => permit.ok()?,
                };
                (Some(key), Some(permit))
            }
            None => (None, None),
        };

        tracing::trace!("Slot acquired for {} (key {:?})", host, key);

        // Count in-flight before leaving the queue so the engine never sees
        // both counters at zero while this request is live
        self.dispatcher.in_flight.fetch_add(1, Ordering::SeqCst);
        Some(Slot {
            dispatcher: Arc::clone(&self.dispatcher),
            _permit: permit,
        })
    }
}

impl Drop for QueueTicket {
    fn drop(&mut self) {
        self.dispatcher.queued.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A held dispatch slot
#[derive(Debug)]
pub struct Slot {
    dispatcher: Arc<Dispatcher>,
    _permit: Option<OwnedSemaphorePermit>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.dispatcher.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
