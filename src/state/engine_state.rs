use std::fmt;

/// Lifecycle of the crawl engine
///
/// ```text
/// Idle -> Running <-> Draining -> Done
/// ```
///
/// `Draining` returns to `Running` whenever an in-flight fetch discovers new
/// links. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Configuration assembled, nothing submitted yet
    Idle,

    /// Requests are queued for a dispatch slot
    Running,

    /// Nothing queued, but fetches are still in flight
    Draining,

    /// Nothing queued and nothing in flight; reached through `Engine::wait`
    Done,
}

impl EngineState {
    /// Derives the state from the engine's counters
    ///
    /// # Arguments
    ///
    /// * `submitted` - Whether any request was ever accepted
    /// * `queued` - Requests waiting for a dispatch slot
    /// * `in_flight` - Requests holding a dispatch slot
    /// * `finished` - Whether `wait` has observed termination
    pub fn from_counts(submitted: bool, queued: usize, in_flight: usize, finished: bool) -> Self {
        if finished {
            Self::Done
        } else if queued > 0 {
            Self::Running
        } else if in_flight > 0 {
            Self::Draining
        } else if submitted {
            // Between a completed fetch and its report being collected
            Self::Draining
        } else {
            Self::Idle
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}
