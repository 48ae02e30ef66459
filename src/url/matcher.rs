use crate::config::CrawlConfig;
use crate::ConfigError;
use regex::Regex;

/// Compiled inclusion patterns for paths below the day level
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    match_all: Vec<Regex>,
    file_match: Vec<Regex>,
}

impl PathFilter {
    /// Compiles both pattern lists, keeping their order
    pub fn new(match_all: &[String], file_match: &[String]) -> Result<Self, ConfigError> {
        Ok(Self {
            match_all: compile(match_all)?,
            file_match: compile(file_match)?,
        })
    }

    /// Decides whether `path` should be fetched
    ///
    /// 1. Every `match_all` pattern must match somewhere in the path; the
    ///    first miss rejects.
    /// 2. A directory-shaped path (trailing `/`) is then accepted.
    /// 3. A file-shaped path also needs at least one `file_match` hit.
    ///
    /// # Examples
    ///
    /// ```
    /// use datecrawl::url::PathFilter;
    ///
    /// let filter = PathFilter::new(&[], &[r"\.xml$".to_string()]).unwrap();
    /// assert!(filter.matches("year_2014/month_01/day_01/gid_1/"));
    /// assert!(filter.matches("year_2014/month_01/day_01/gid_1/boxscore.xml"));
    /// assert!(!filter.matches("year_2014/month_01/day_01/gid_1/boxscore.txt"));
    /// ```
    pub fn matches(&self, path: &str) -> bool {
        if !self.match_all.iter().all(|re| re.is_match(path)) {
            return false;
        }

        if path.ends_with('/') {
            return true;
        }

        self.file_match.iter().any(|re| re.is_match(path))
    }

    pub fn match_all(&self) -> impl Iterator<Item = &str> {
        self.match_all.iter().map(Regex::as_str)
    }

    pub fn file_match(&self) -> impl Iterator<Item = &str> {
        self.file_match.iter().map(Regex::as_str)
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|source| ConfigError::InvalidPattern {
                pattern: p.clone(),
                source,
            })
        })
        .collect()
}

/// Decides whether `path` should be fetched under `config`'s filters
pub fn should_fetch(path: &str, config: &CrawlConfig) -> bool {
    config.filter.matches(path)
}
