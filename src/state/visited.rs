use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use url::Url;

/// Set of canonical URLs claimed during one crawl run
///
/// Grows monotonically and is discarded with the engine. The claim is a single
/// check-and-insert under one lock, so two tasks discovering the same link can
/// never both win it.
#[derive(Debug, Default)]
pub struct VisitedSet {
    claimed: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a canonical URL for this run
    ///
    /// # Returns
    ///
    /// * `true` - First claim for this URL; the caller owns the fetch
    /// * `false` - The URL was already claimed
    pub fn try_claim(&self, url: &Url) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.as_str().to_owned())
    }

    /// Returns true if the URL has been claimed
    pub fn contains(&self, url: &Url) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(url.as_str())
    }

    /// Number of claimed URLs
    pub fn len(&self) -> usize {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
