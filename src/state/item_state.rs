/// Terminal states of a single work item
use std::fmt;

/// How a dispatched work item finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    /// Rejected by the path filter; no request issued
    Skipped,

    /// Fetched as a directory listing and parsed
    Listed,

    /// Fetched as a leaf; body stored or discarded
    Stored,

    /// Request, body or storage failed; subtree not explored
    Abandoned,
}

impl ItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Listed => "listed",
            Self::Stored => "stored",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
