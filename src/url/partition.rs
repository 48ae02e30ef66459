//! Date partition paths
//!
//! The remote tree is rooted at one directory per calendar day, named
//! `year_YYYY/month_MM/day_DD/`. [`DateRange`] produces those directory paths
//! for every day between two instants.

use chrono::{DateTime, Datelike, Duration, Utc};

/// Step between consecutive partitions, in milliseconds
///
/// This is a fixed wall-clock day; calendar irregularities such as daylight
/// saving transitions are not special-cased.
pub const DAY_STEP_MS: i64 = 86_400_000;

/// Template of the date partition prefix; only its length matters
pub const PARTITION_PREFIX: &str = "year_yyyy/month_yy/day_yy/";

/// Formats the partition directory for an instant (UTC)
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use datecrawl::url::partition_path;
///
/// let when = Utc.with_ymd_and_hms(2014, 3, 7, 0, 0, 0).unwrap();
/// assert_eq!(partition_path(&when), "year_2014/month_03/day_07/");
/// ```
pub fn partition_path(when: &DateTime<Utc>) -> String {
    format!(
        "year_{}/month_{:02}/day_{:02}/",
        when.year(),
        when.month(),
        when.day()
    )
}

/// Returns true for paths no deeper than the year/month/day levels
///
/// These are always fetched, whatever the configured filters say.
pub fn is_partition_level(path: &str) -> bool {
    path.len() <= PARTITION_PREFIX.len()
}

/// Inclusive range of days to crawl
///
/// Iterating is lazy and restartable: every call to [`DateRange::iter`] starts
/// again from `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Number of partitions the range yields
    pub fn len(&self) -> usize {
        if self.start > self.end {
            return 0;
        }
        let span = (self.end - self.start).num_milliseconds();
        (span / DAY_STEP_MS) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> PartitionPaths {
        PartitionPaths {
            next: Some(self.start),
            end: self.end,
        }
    }
}

impl IntoIterator for &DateRange {
    type Item = String;
    type IntoIter = PartitionPaths;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the partition paths of a [`DateRange`]
#[derive(Debug, Clone)]
pub struct PartitionPaths {
    next: Option<DateTime<Utc>>,
    end: DateTime<Utc>,
}

impl Iterator for PartitionPaths {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let when = self.next.filter(|w| *w <= self.end)?;
        self.next = when.checked_add_signed(Duration::milliseconds(DAY_STEP_MS));
        Some(partition_path(&when))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .next
            .map(|start| DateRange::new(start, self.end).len())
            .unwrap_or(0);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PartitionPaths {}
