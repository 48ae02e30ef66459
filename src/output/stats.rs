//! Crawl statistics
//!
//! This module provides the counters the crawl updates while it runs and the
//! snapshot type handed to callers.

use crate::state::ItemState;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// Elapsed crawl time, known only once the crawl has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elapsed {
    /// The queue has not drained yet
    StillRunning,

    /// Time from construction to drain
    Finished(Duration),
}

impl Elapsed {
    /// Milliseconds elapsed, if the crawl has finished
    pub fn as_millis(&self) -> Option<u128> {
        match self {
            Self::StillRunning => None,
            Self::Finished(d) => Some(d.as_millis()),
        }
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StillRunning => write!(f, "<still running>"),
            Self::Finished(d) => write!(f, "{} ms", d.as_millis()),
        }
    }
}

/// Snapshot of a crawl's statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlStats {
    /// HTTP requests actually issued (filter-skipped paths excluded)
    pub request_count: u64,

    /// Time from construction to drain
    pub elapsed: Elapsed,

    /// Directory listings fetched
    pub directories: u64,

    /// Leaf files fetched
    pub files: u64,

    /// Paths rejected by the filter
    pub skipped: u64,

    /// Paths whose fetch or storage failed
    pub abandoned: u64,
}

/// Shared, cloneable view of a crawl's counters
///
/// The crawler updates it while running; any clone can take a
/// [`CrawlStats`] snapshot at any time.
#[derive(Debug, Clone)]
pub struct StatsHandle {
    inner: Arc<Counters>,
}

#[derive(Debug)]
struct Counters {
    requests: AtomicU64,
    directories: AtomicU64,
    files: AtomicU64,
    skipped: AtomicU64,
    abandoned: AtomicU64,
    started: Instant,
    finished: OnceLock<Instant>,
}

impl StatsHandle {
    /// Starts the clock
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Counters {
                requests: AtomicU64::new(0),
                directories: AtomicU64::new(0),
                files: AtomicU64::new(0),
                skipped: AtomicU64::new(0),
                abandoned: AtomicU64::new(0),
                started: Instant::now(),
                finished: OnceLock::new(),
            }),
        }
    }

    /// Counts one request; called before the request is sent
    pub fn record_request(&self) {
        self.inner.requests.fetch_add(1, Ordering::SeqCst);
    }

    /// Counts a finished work item
    pub fn record_item(&self, state: ItemState) {
        let counter = match state {
            ItemState::Skipped => &self.inner.skipped,
            ItemState::Listed => &self.inner.directories,
            ItemState::Stored => &self.inner.files,
            ItemState::Abandoned => &self.inner.abandoned,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Fixes the end time. Returns false if it was already fixed.
    pub fn finish(&self) -> bool {
        self.inner.finished.set(Instant::now()).is_ok()
    }

    pub fn request_count(&self) -> u64 {
        self.inner.requests.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> CrawlStats {
        let elapsed = match self.inner.finished.get() {
            Some(end) => Elapsed::Finished(end.duration_since(self.inner.started)),
            None => Elapsed::StillRunning,
        };

        CrawlStats {
            request_count: self.request_count(),
            elapsed,
            directories: self.inner.directories.load(Ordering::SeqCst),
            files: self.inner.files.load(Ordering::SeqCst),
            skipped: self.inner.skipped.load(Ordering::SeqCst),
            abandoned: self.inner.abandoned.load(Ordering::SeqCst),
        }
    }
}

impl Default for StatsHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStats) {
    print!("{}", format_statistics(stats));
}

/// Formats the statistics block printed by [`print_statistics`]
pub fn format_statistics(stats: &CrawlStats) -> String {
    let mut out = String::from("=== Crawl Statistics ===\n\n");
    out.push_str(&format!("  Requests issued: {}\n", stats.request_count));
    out.push_str(&format!("  Directories listed: {}\n", stats.directories));
    out.push_str(&format!("  Files fetched: {}\n", stats.files));
    out.push_str(&format!("  Paths skipped by filter: {}\n", stats.skipped));
    out.push_str(&format!("  Paths abandoned: {}\n", stats.abandoned));
    out.push_str(&format!("  Elapsed: {}\n", stats.elapsed));
    out
}
