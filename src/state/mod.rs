//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: lifecycle of the crawler as a whole
//! - `ItemState`: how each dispatched work item finished

mod crawl_phase;
mod item_state;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use item_state::ItemState;
