//! Response cache module for Web-Trawl
//!
//! Provides the cache collaborator consulted by the HTTP fetcher:
//! - `DiskCache`: one file per URL under a cache directory
//! - `MemoryCache`: a mutex-guarded map, useful for tests and one-shot runs

mod disk;
mod memory;
mod traits;

pub use disk::DiskCache;
pub use memory::MemoryCache;
pub use traits::{CachedResponse, ResponseCache, StorageError, StorageResult};
