//! Output module for crawl statistics and progress reporting
//!
//! This module handles:
//! - Counting requests and finished work items while a crawl runs
//! - Formatting the final crawl summary

pub mod stats;

pub use stats::{format_statistics, print_statistics, CrawlStats, Elapsed, StatsHandle};

/// One-line summary printed when a crawl finishes
///
/// # Example
///
/// ```
/// use datecrawl::output::{finish_line, CrawlStats, Elapsed};
/// use std::time::Duration;
///
/// let stats = CrawlStats {
///     request_count: 3,
///     elapsed: Elapsed::Finished(Duration::from_millis(42)),
///     directories: 1,
///     files: 2,
///     skipped: 0,
///     abandoned: 0,
/// };
/// assert_eq!(finish_line(&stats), "Finished crawl (3 requests, 42 ms)");
/// ```
pub fn finish_line(stats: &CrawlStats) -> String {
    format!(
        "Finished crawl ({} requests, {})",
        stats.request_count, stats.elapsed
    )
}
