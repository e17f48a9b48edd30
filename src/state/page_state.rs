//! Outcome classification for dispatched requests

use std::fmt;

/// Final state of a request handed to the dispatcher
///
/// Every dispatched request ends in exactly one of these states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Success =====
    /// Page was fetched with a 2xx status and its links were extracted
    Visited,

    // ===== Fetch Failures =====
    /// HTTP 404 or 410
    DeadLink,

    /// HTTP 429
    RateLimited,

    /// Connection refused, DNS failure or timeout
    Unreachable,

    /// Any other non-2xx status or transport error
    Failed,

    // ===== Scope =====
    /// A redirect pointed outside the allowed domains and was not followed
    OutOfScope,

    // ===== Shutdown =====
    /// Request was queued but never started because the run was shut down
    Abandoned,
}

impl PageState {
    /// Returns true if this represents a successful visit
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Visited)
    }

    /// Returns true if this represents a fetch failure
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::DeadLink | Self::RateLimited | Self::Unreachable | Self::Failed
        )
    }

    /// Maps an HTTP status code to the state it produces
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Visited,
            404 | 410 => Self::DeadLink,
            429 => Self::RateLimited,
            _ => Self::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visited => "visited",
            Self::DeadLink => "dead_link",
            Self::RateLimited => "rate_limited",
            Self::Unreachable => "unreachable",
            Self::Failed => "failed",
            Self::OutOfScope => "out_of_scope",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
