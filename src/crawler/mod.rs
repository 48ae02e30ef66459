//! Crawler module for walking the date-partitioned tree
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and directory/file classification
//! - Directory listing parsing and link extraction
//! - The bounded work queue
//! - Overall crawl coordination and lifecycle events

mod coordinator;
mod events;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::Crawler;
pub use events::{CrawlEvent, EventReceiver, EventSender};
pub use fetcher::{
    build_http_client, classify, BodyStream, FetchOutcome, Fetcher, ResponseKind,
    DIRECTORY_CONTENT_TYPE,
};
pub use parser::extract_links;
pub use scheduler::WorkQueue;

use crate::config::PartialConfig;
use crate::output::CrawlStats;
use crate::storage::FileSink;
use crate::CrawlError;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for a one-shot crawl. It will:
/// 1. Validate the user dates
/// 2. Load defaults and resolve the configuration
/// 3. Seed one directory per day
/// 4. Fetch listings and leaves until the queue drains
///
/// # Arguments
///
/// * `config` - The user configuration
/// * `sink` - Where leaf files go; `None` discards them
///
/// # Returns
///
/// * `Ok(CrawlStats)` - Crawl completed
/// * `Err(CrawlError)` - Configuration or defaults were invalid
pub async fn crawl(
    config: &PartialConfig,
    sink: Option<Arc<dyn FileSink>>,
) -> Result<CrawlStats, CrawlError> {
    let mut crawler = Crawler::new(config)?;
    if let Some(sink) = sink {
        crawler = crawler.with_sink(sink);
    }
    crawler.start()?;
    crawler.run().await
}
