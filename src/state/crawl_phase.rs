/// Lifecycle phases of a crawl
///
/// This module defines the crawler's lifecycle state machine.
use std::fmt;

/// Represents the current lifecycle phase of a crawler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Start/end dates validated, user config copied
    Constructing,

    /// Reading the defaults file and merging the user config over it
    LoadingDefaults,

    /// Configuration resolved, queue and HTTP client built
    Ready,

    /// Queue seeded and dispatching
    Running,

    /// Nothing left to dispatch; waiting for in-flight fetches
    Draining,

    /// Queue drained, stats final
    Done,

    /// Initialization failed; the crawl will never run
    Errored,
}

impl CrawlPhase {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Errored)
    }

    /// Returns true if `next` is a legal successor of this phase
    ///
    /// `Errored` is reachable from every non-terminal phase. `Draining` may
    /// fall back to `Running` when in-flight fetches discover more work.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == Self::Errored {
            return true;
        }
        matches!(
            (self, next),
            (Self::Constructing, Self::LoadingDefaults)
                | (Self::LoadingDefaults, Self::Ready)
                | (Self::Ready, Self::Running)
                | (Self::Running, Self::Draining)
                | (Self::Draining, Self::Running)
                | (Self::Draining, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constructing => "constructing",
            Self::LoadingDefaults => "loading_defaults",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
