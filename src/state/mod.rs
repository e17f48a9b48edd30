//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `VisitedSet`: run-scoped set of claimed URLs (at-most-once enqueue)
//! - `EngineState`: lifecycle of the crawl engine
//! - `PageState`: final outcome of each dispatched request

mod engine_state;
mod page_state;
mod visited;

// Re-export main types
pub use engine_state::EngineState;
pub use page_state::PageState;
pub use visited::VisitedSet;
