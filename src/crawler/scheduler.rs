//! Bounded work queue for the crawl frontier
//!
//! This module handles:
//! - FIFO ordering of pending work paths
//! - The concurrency ceiling on dispatched (in-flight) items
//! - Drain detection: nothing pending and nothing in flight
//!
//! The queue itself never performs I/O. The coordinator's run loop asks it
//! for items to dispatch, reports each completion back, and polls for drain.

use std::collections::VecDeque;

/// FIFO queue of work paths with a fixed concurrency ceiling
#[derive(Debug)]
pub struct WorkQueue {
    /// Paths waiting to be dispatched
    pending: VecDeque<String>,

    /// Items dispatched and not yet completed
    in_flight: usize,

    /// Maximum simultaneous in-flight items
    concurrency: usize,

    /// Set once the initial seed has been pushed
    seeded: bool,

    /// Set once drain has been reported
    drained: bool,

    /// Total items ever dispatched
    dispatched: u64,

    /// Highest in-flight count observed
    peak_in_flight: usize,
}

impl WorkQueue {
    /// Creates an empty queue; a ceiling of 0 is raised to 1
    pub fn new(concurrency: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            in_flight: 0,
            concurrency: concurrency.max(1),
            seeded: false,
            drained: false,
            dispatched: 0,
            peak_in_flight: 0,
        }
    }

    /// Pushes the initial work items and arms drain detection
    ///
    /// Drain can only be reported after seeding, even when the seed is empty.
    ///
    /// # Returns
    ///
    /// The number of items seeded
    pub fn seed<I>(&mut self, items: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.pending.len();
        self.pending.extend(items);
        self.seeded = true;
        self.pending.len() - before
    }

    /// Appends a work item
    ///
    /// Pushes after drain has been reported are dropped.
    pub fn push(&mut self, item: String) -> bool {
        if self.drained {
            tracing::warn!("Dropping {} pushed after drain", item);
            return false;
        }
        self.pending.push_back(item);
        true
    }

    /// Takes the next item to dispatch, if a concurrency slot is free
    ///
    /// The caller must call [`WorkQueue::complete`] exactly once for every
    /// item returned here.
    pub fn next_dispatch(&mut self) -> Option<String> {
        if self.in_flight >= self.concurrency {
            return None;
        }
        let item = self.pending.pop_front()?;
        self.in_flight += 1;
        self.dispatched += 1;
        self.peak_in_flight = self.peak_in_flight.max(self.in_flight);
        Some(item)
    }

    /// Releases the slot of a dispatched item
    ///
    /// Work discovered by the item must be pushed before this is called, so
    /// the queue never looks idle while that work is outstanding.
    pub fn complete(&mut self) {
        debug_assert!(self.in_flight > 0, "complete() without a dispatched item");
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Reports drain exactly once
    ///
    /// Returns true the first time the queue is seeded, empty and has nothing
    /// in flight; false on every other call.
    pub fn take_drain(&mut self) -> bool {
        if self.drained || !self.seeded || !self.is_idle() {
            return false;
        }
        self.drained = true;
        true
    }

    /// Returns true when nothing is pending and nothing is in flight
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.in_flight == 0
    }

    pub fn is_drained(&self) -> bool {
        self.drained
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Number of items waiting to be dispatched
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight
    }
}
