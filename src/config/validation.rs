use crate::config::types::{CrawlConfig, PartialConfig};
use crate::url::PathFilter;
use crate::ConfigError;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::path::PathBuf;
use url::Url;

/// Root path used when neither the user nor the defaults name one
const DEFAULT_ROOT: &str = "/";

/// Parses a configured date
///
/// Accepts a bare calendar date (`2014-01-01`, taken as midnight UTC) or a full
/// RFC 3339 timestamp. `field` names the config key in the error.
pub fn parse_date(field: &'static str, value: &str) -> Result<DateTime<Utc>, ConfigError> {
    let invalid = || ConfigError::InvalidDate {
        field,
        value: value.to_string(),
    };

    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
        return Ok(Utc.from_utc_datetime(&midnight));
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| invalid())
}

/// Parses a required date field of a user config
pub fn require_date(
    field: &'static str,
    value: Option<&String>,
) -> Result<DateTime<Utc>, ConfigError> {
    match value {
        Some(v) => parse_date(field, v),
        None => Err(ConfigError::Missing(field)),
    }
}

/// Layers `user` over `defaults` and validates the result
///
/// This is a pure function of its two inputs: the same pair always resolves
/// to the same configuration (or the same error).
pub fn resolve(defaults: &PartialConfig, user: &PartialConfig) -> Result<CrawlConfig, ConfigError> {
    let merged = user.merged_over(defaults);

    let start = require_date("start", merged.start.as_ref())?;
    let end = require_date("end", merged.end.as_ref())?;
    if start > end {
        return Err(ConfigError::Validation(format!(
            "start ({}) must not be after end ({})",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        )));
    }

    let server_str = merged.server.ok_or(ConfigError::Missing("server"))?;
    let server = Url::parse(&server_str)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid server '{}': {}", server_str, e)))?;
    if server.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(format!(
            "server '{}' cannot be used as a base URL",
            server_str
        )));
    }

    let concurrency = merged.concurrency.ok_or(ConfigError::Missing("concurrency"))?;
    if concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be >= 1, got {}",
            concurrency
        )));
    }

    let root = merged.root.unwrap_or_else(|| DEFAULT_ROOT.to_string());

    let output = match merged.output {
        Some(dir) if dir.is_empty() => {
            return Err(ConfigError::Validation("output cannot be empty".to_string()))
        }
        Some(dir) => Some(PathBuf::from(dir)),
        None => None,
    };

    let filter = PathFilter::new(
        &merged.match_all.unwrap_or_default(),
        &merged.file_match.unwrap_or_default(),
    )?;

    Ok(CrawlConfig {
        start,
        end,
        root,
        server,
        output,
        concurrency: concurrency as usize,
        filter,
    })
}
