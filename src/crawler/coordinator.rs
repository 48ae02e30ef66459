//! Crawler coordinator - lifecycle and main crawl loop
//!
//! This module contains the crawler state machine and the dispatch loop that
//! coordinates all aspects of a crawl, including:
//! - Validating dates and owning the user configuration
//! - Loading defaults and resolving the final configuration
//! - Seeding the work queue with the date partitions
//! - Dispatching fetches up to the concurrency ceiling
//! - Re-queueing discovered children and detecting drain
//! - Finalizing statistics

use crate::config::{load_defaults, require_date, resolve, CrawlConfig, PartialConfig, DEFAULTS_PATH};
use crate::crawler::events::{emit, CrawlEvent, EventReceiver, EventSender};
use crate::crawler::fetcher::{build_http_client, FetchOutcome, Fetcher};
use crate::crawler::scheduler::WorkQueue;
use crate::output::{CrawlStats, StatsHandle};
use crate::state::CrawlPhase;
use crate::storage::FileSink;
use crate::url::DateRange;
use crate::{ConfigError, CrawlError};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Crawler for one date range
///
/// # Lifecycle
///
/// ```text
/// Constructing -> LoadingDefaults -> Ready -> Running <-> Draining -> Done
///        \______________\_______________\________\___________\-> Errored
/// ```
///
/// [`Crawler::start`] may be called in any phase before `Ready`; the request
/// is kept as a pending transition and taken as soon as `Ready` is reached.
pub struct Crawler {
    /// Owned copy of the caller's configuration
    user: PartialConfig,

    /// Days to crawl, from the validated user dates
    range: DateRange,

    defaults_path: PathBuf,
    phase: CrawlPhase,

    /// Transition requested before the crawler could take it
    pending: Option<CrawlPhase>,

    config: Option<CrawlConfig>,
    queue: Option<WorkQueue>,
    client: Option<Client>,
    sink: Option<Arc<dyn FileSink>>,
    events: Option<EventSender>,
    stats: StatsHandle,
}

impl Crawler {
    /// Creates a crawler from a user configuration
    ///
    /// `start` and `end` are validated here; everything else is validated
    /// once defaults have been merged in. The configuration is copied, so
    /// later changes to the caller's value have no effect.
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Crawler in the `Constructing` phase
    /// * `Err(ConfigError)` - `start` or `end` is missing or not a date
    pub fn new(user: &PartialConfig) -> Result<Self, ConfigError> {
        let start = require_date("start", user.start.as_ref())?;
        let end = require_date("end", user.end.as_ref())?;

        Ok(Self {
            user: user.clone(),
            range: DateRange::new(start, end),
            defaults_path: PathBuf::from(DEFAULTS_PATH),
            phase: CrawlPhase::Constructing,
            pending: None,
            config: None,
            queue: None,
            client: None,
            sink: None,
            events: None,
            stats: StatsHandle::new(),
        })
    }

    /// Reads defaults from `path` instead of the shipped defaults file
    pub fn with_defaults_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.defaults_path = path.into();
        self
    }

    /// Registers a sink for leaf files; without one, bodies are discarded
    pub fn with_sink(mut self, sink: Arc<dyn FileSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Subscribes to crawl events
    ///
    /// Must be called before [`Crawler::initialize`] to observe `Ready`.
    /// A second call replaces the previous subscription.
    pub fn subscribe(&mut self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// The resolved configuration, once defaults are loaded
    pub fn config(&self) -> Option<&CrawlConfig> {
        self.config.as_ref()
    }

    pub fn date_range(&self) -> &DateRange {
        &self.range
    }

    /// Current statistics; `elapsed` is a sentinel until the crawl is done
    pub fn stats(&self) -> CrawlStats {
        self.stats.snapshot()
    }

    /// Requests the crawl to start
    ///
    /// Before `Ready`, the request is recorded and replayed once defaults are
    /// loaded. In `Ready`, the queue is seeded immediately. Calling it again
    /// once running has no effect.
    pub fn start(&mut self) -> Result<(), CrawlError> {
        match self.phase {
            CrawlPhase::Constructing | CrawlPhase::LoadingDefaults => {
                tracing::debug!("start() before ready; deferring");
                self.pending = Some(CrawlPhase::Running);
                Ok(())
            }
            CrawlPhase::Ready => self.begin(),
            CrawlPhase::Running | CrawlPhase::Draining => {
                tracing::warn!("start() called on a running crawl; ignoring");
                Ok(())
            }
            CrawlPhase::Done | CrawlPhase::Errored => Err(CrawlError::InvalidTransition {
                from: self.phase,
                to: CrawlPhase::Running,
            }),
        }
    }

    /// Loads defaults, resolves the configuration and builds the queue
    ///
    /// On failure the crawler moves to `Errored`, an error event is emitted,
    /// and `ready` is never raised.
    pub async fn initialize(&mut self) -> Result<(), CrawlError> {
        self.transition(CrawlPhase::LoadingDefaults)?;
        tracing::debug!("Loading defaults from {}", self.defaults_path.display());

        let defaults = match load_defaults(&self.defaults_path).await {
            Ok(defaults) => defaults,
            Err(e) => return Err(self.fail(e.into())),
        };

        let config = match resolve(&defaults, &self.user) {
            Ok(config) => config,
            Err(e) => return Err(self.fail(e.into())),
        };

        let client = match build_http_client(config.concurrency) {
            Ok(client) => client,
            Err(e) => return Err(self.fail(e.into())),
        };

        tracing::info!(
            "Resolved configuration: {} -> {} from {}{} ({} concurrent)",
            config.start.format("%Y-%m-%d"),
            config.end.format("%Y-%m-%d"),
            config.server,
            config.root,
            config.concurrency
        );

        self.range = DateRange::new(config.start, config.end);
        self.queue = Some(WorkQueue::new(config.concurrency));
        self.client = Some(client);
        self.config = Some(config);

        self.transition(CrawlPhase::Ready)?;
        emit(self.events.as_ref(), CrawlEvent::Ready);

        if let Some(next) = self.pending.take() {
            tracing::debug!("Replaying deferred transition to {}", next);
            self.begin()?;
        }

        Ok(())
    }

    /// Runs the crawl until the queue drains
    ///
    /// Initializes first if that has not happened yet. The crawl must have
    /// been started, before or after initialization.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStats)` - Final statistics
    /// * `Err(CrawlError)` - Initialization failed or the crawl was never started
    pub async fn run(&mut self) -> Result<CrawlStats, CrawlError> {
        if self.phase == CrawlPhase::Constructing {
            self.initialize().await?;
        }

        match self.phase {
            CrawlPhase::Running | CrawlPhase::Draining => {}
            CrawlPhase::Ready => return Err(CrawlError::NotStarted),
            CrawlPhase::Done => return Ok(self.stats()),
            phase => {
                return Err(CrawlError::InvalidTransition {
                    from: phase,
                    to: CrawlPhase::Running,
                })
            }
        }

        let (Some(mut queue), Some(client), Some(config)) =
            (self.queue.take(), self.client.take(), self.config.as_ref())
        else {
            return Err(CrawlError::NotStarted);
        };

        let fetcher = Arc::new(
            Fetcher::new(
                client,
                config.server.clone(),
                config.root.clone(),
                config.filter.clone(),
                self.stats.clone(),
            )
            .with_sink(self.sink.clone())
            .with_events(self.events.clone()),
        );

        let mut in_flight: JoinSet<(String, FetchOutcome)> = JoinSet::new();

        loop {
            while let Some(path) = queue.next_dispatch() {
                let fetcher = Arc::clone(&fetcher);
                in_flight.spawn(async move {
                    let outcome = fetcher.fetch(&path).await;
                    (path, outcome)
                });
            }

            if queue.is_empty() && self.phase == CrawlPhase::Running {
                self.transition(CrawlPhase::Draining)?;
            }

            if queue.take_drain() {
                break;
            }

            match in_flight.join_next().await {
                Some(Ok((path, outcome))) => self.handle_outcome(&mut queue, &path, outcome)?,
                Some(Err(e)) => {
                    tracing::error!("Fetch task failed: {}", e);
                    self.stats.record_item(crate::state::ItemState::Abandoned);
                    emit(
                        self.events.as_ref(),
                        CrawlEvent::Error(Arc::new(CrawlError::Task(e))),
                    );
                    queue.complete();
                }
                None => {
                    // in_flight can only be empty here if the queue is idle
                    tracing::error!(
                        "No fetch in flight with {} items pending",
                        queue.len()
                    );
                    break;
                }
            }
        }

        // dropping the last fetcher releases the HTTP client
        drop(fetcher);
        self.finish()
    }

    /// Records a finished item and queues any children it discovered
    fn handle_outcome(
        &mut self,
        queue: &mut WorkQueue,
        path: &str,
        outcome: FetchOutcome,
    ) -> Result<(), CrawlError> {
        let state = outcome.item_state();

        match outcome {
            FetchOutcome::Skipped => {}
            FetchOutcome::Directory(children) => {
                let discovered = children.len();
                for child in children {
                    queue.push(child);
                }
                if discovered > 0 && self.phase == CrawlPhase::Draining {
                    self.transition(CrawlPhase::Running)?;
                }
            }
            FetchOutcome::File(bytes) => {
                tracing::debug!("Fetched {} ({} bytes)", path, bytes);
            }
            FetchOutcome::Abandoned(e) => {
                tracing::warn!("Abandoning {}: {}", path, e);
                emit(self.events.as_ref(), CrawlEvent::Error(Arc::new(e)));
            }
        }

        self.stats.record_item(state);
        queue.complete();
        Ok(())
    }

    /// Seeds the queue with one directory per day
    fn begin(&mut self) -> Result<(), CrawlError> {
        let queue = self.queue.as_mut().ok_or(CrawlError::NotStarted)?;
        let seeded = queue.seed(self.range.iter());
        tracing::info!("Seeded {} date partitions", seeded);
        self.transition(CrawlPhase::Running)
    }

    /// Fixes the end time and reports the final statistics
    fn finish(&mut self) -> Result<CrawlStats, CrawlError> {
        self.stats.finish();
        self.transition(CrawlPhase::Done)?;

        let stats = self.stats();
        tracing::debug!(
            "Crawl done: {} directories, {} files, {} skipped, {} abandoned",
            stats.directories,
            stats.files,
            stats.skipped,
            stats.abandoned
        );
        emit(self.events.as_ref(), CrawlEvent::End { stats });
        Ok(stats)
    }

    /// Moves to `Errored` and reports `err`
    ///
    /// # Returns
    ///
    /// The error to hand back to the caller, wrapping the reported one
    fn fail(&mut self, err: CrawlError) -> CrawlError {
        tracing::error!("Crawl failed during {}: {}", self.phase, err);
        self.phase = CrawlPhase::Errored;

        let shared = Arc::new(err);
        emit(self.events.as_ref(), CrawlEvent::Error(Arc::clone(&shared)));
        CrawlError::Aborted(shared)
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<(), CrawlError> {
        if !self.phase.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Crawler phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }
}
