//! Datecrawl: a bounded-concurrency crawler for date-partitioned HTTP trees
//!
//! This crate walks a remote directory tree laid out as
//! `year_YYYY/month_MM/day_DD/...`, one HTML index page per directory,
//! fetching every listing and leaf file within a configured date range and
//! optionally writing the leaves to local storage.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use std::sync::Arc;
use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Defaults error: {0}")]
    Defaults(#[from] DefaultsError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("Crawl was never started")]
    NotStarted,

    #[error("Fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Crawl aborted: {0}")]
    Aborted(Arc<CrawlError>),
}

impl CrawlError {
    /// The reported error behind any `Aborted` wrappers
    pub fn root_cause(&self) -> &CrawlError {
        match self {
            Self::Aborted(inner) => inner.root_cause(),
            other => other,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid {field} date: \"{value}\"")]
    InvalidDate { field: &'static str, value: String },

    #[error("Missing required field: {0}")]
    Missing(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Errors loading the named defaults
#[derive(Debug, Error)]
pub enum DefaultsError {
    #[error("failed to read defaults {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse defaults {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Per-path HTTP failures
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request for {path} failed: {source}")]
    Request { path: String, source: reqwest::Error },

    #[error("request for {path} returned HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("reading body of {path} failed: {source}")]
    Body { path: String, source: reqwest::Error },

    #[error("cannot build request URL for {path}: {source}")]
    Url {
        path: String,
        source: ::url::ParseError,
    },
}

impl TransportError {
    /// Relative path of the work item that failed
    pub fn path(&self) -> &str {
        match self {
            Self::Request { path, .. }
            | Self::Status { path, .. }
            | Self::Body { path, .. }
            | Self::Url { path, .. } => path,
        }
    }
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::CrawlConfig;
pub use crawler::{CrawlEvent, Crawler};
pub use output::{CrawlStats, Elapsed};
pub use state::CrawlPhase;
pub use url::{should_fetch, DateRange, PathFilter};
