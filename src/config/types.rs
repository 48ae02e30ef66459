use crate::url::PathFilter;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// Crawl configuration as written by a user or a defaults file
///
/// Every field is optional here; [`resolve`](crate::config::resolve) layers a
/// user value over a defaults value and validates the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PartialConfig {
    /// First day to crawl (`YYYY-MM-DD` or RFC 3339)
    #[serde(default)]
    pub start: Option<String>,

    /// Last day to crawl, inclusive
    #[serde(default)]
    pub end: Option<String>,

    /// Base path on the remote server (e.g. `/components/game/mlb`)
    #[serde(default)]
    pub root: Option<String>,

    /// Base URL of the remote server
    #[serde(default)]
    pub server: Option<String>,

    /// Local directory fetched files are written under
    #[serde(default)]
    pub output: Option<String>,

    /// Maximum number of requests in flight
    #[serde(default)]
    pub concurrency: Option<u32>,

    /// Patterns every fetched path below the day level must match
    #[serde(default, alias = "match-all")]
    pub match_all: Option<Vec<String>>,

    /// Patterns of which a file path must match at least one
    #[serde(default, alias = "file-match")]
    pub file_match: Option<Vec<String>>,
}

impl PartialConfig {
    /// Layers `self` over `defaults`: any field set here wins.
    pub fn merged_over(&self, defaults: &PartialConfig) -> PartialConfig {
        PartialConfig {
            start: self.start.clone().or_else(|| defaults.start.clone()),
            end: self.end.clone().or_else(|| defaults.end.clone()),
            root: self.root.clone().or_else(|| defaults.root.clone()),
            server: self.server.clone().or_else(|| defaults.server.clone()),
            output: self.output.clone().or_else(|| defaults.output.clone()),
            concurrency: self.concurrency.or(defaults.concurrency),
            match_all: self
                .match_all
                .clone()
                .or_else(|| defaults.match_all.clone()),
            file_match: self
                .file_match
                .clone()
                .or_else(|| defaults.file_match.clone()),
        }
    }
}

/// Fully resolved, immutable crawl configuration
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// First instant of the date range (UTC)
    pub start: DateTime<Utc>,

    /// Last instant of the date range (UTC), inclusive
    pub end: DateTime<Utc>,

    /// Base path on the remote server
    pub root: String,

    /// Base URL requests are issued against
    pub server: Url,

    /// Local storage root, if files should be persisted
    pub output: Option<PathBuf>,

    /// Maximum simultaneous in-flight requests (always >= 1)
    pub concurrency: usize,

    /// Compiled `match_all` / `file_match` patterns
    pub filter: PathFilter,
}
