use crate::storage::traits::{CachedResponse, ResponseCache, StorageResult};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use url::Url;

/// In-memory response cache, discarded with the process
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CachedResponse>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached responses
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, url: &Url) -> StorageResult<Option<CachedResponse>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(url.as_str()).cloned())
    }

    fn put(&self, url: &Url, response: &CachedResponse) -> StorageResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(url.as_str().to_owned(), response.clone());
        Ok(())
    }
}
