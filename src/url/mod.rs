//! Path handling for the remote date-partitioned tree
//!
//! This module provides:
//! - Date partition path generation (`year_YYYY/month_MM/day_DD/`)
//! - The inclusion filter applied below the day level
//! - Resolution of child links and request URLs

mod matcher;
mod partition;

pub use matcher::{should_fetch, PathFilter};
pub use partition::{
    is_partition_level, partition_path, DateRange, PartitionPaths, DAY_STEP_MS, PARTITION_PREFIX,
};

use url::Url;

/// Resolves `child` relative to the directory `dir`
///
/// Both are slash-separated relative paths. `.` segments and empty segments
/// are dropped and `..` removes the previous segment. A trailing slash on
/// `child` is kept, so directory-shaped links stay directory-shaped.
///
/// Returns `None` if the result would climb above the crawl root.
///
/// # Examples
///
/// ```
/// use datecrawl::url::join_relative;
///
/// assert_eq!(
///     join_relative("year_2014/month_01/day_01/", "gid_1/").as_deref(),
///     Some("year_2014/month_01/day_01/gid_1/")
/// );
/// assert_eq!(join_relative("a/b/", "../c").as_deref(), Some("a/c"));
/// assert_eq!(join_relative("a/", "../../c"), None);
/// ```
pub fn join_relative(dir: &str, child: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();

    for segment in dir.split('/').chain(child.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return None;
    }

    let mut joined = segments.join("/");
    if child.ends_with('/') {
        joined.push('/');
    }
    Some(joined)
}

/// Joins the server-side root and a relative work path into an absolute path
///
/// Duplicate slashes are collapsed and the result always starts with `/`.
pub fn request_path(root: &str, path: &str) -> String {
    let mut joined = String::with_capacity(root.len() + path.len() + 2);
    joined.push('/');

    for segment in root.split('/').chain(path.split('/')) {
        if segment.is_empty() {
            continue;
        }
        if !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(segment);
    }

    if path.ends_with('/') && !joined.ends_with('/') {
        joined.push('/');
    }
    joined
}

/// Builds the absolute URL for a work path under `root` on `server`
pub fn request_url(server: &Url, root: &str, path: &str) -> Result<Url, url::ParseError> {
    server.join(&request_path(root, path))
}
