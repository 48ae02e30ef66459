//! Events a running crawl reports to the embedding application

use crate::output::CrawlStats;
use crate::CrawlError;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Event types emitted during a crawl
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    /// Configuration resolved, queue and HTTP client built
    Ready,

    /// A directory listing was fetched (emitted before it is parsed)
    Directory { path: String },

    /// The queue drained; stats are final
    End { stats: CrawlStats },

    /// Initialization failed, or one path was abandoned
    Error(Arc<CrawlError>),
}

/// Sending half of a crawl's event channel
pub type EventSender = mpsc::UnboundedSender<CrawlEvent>;

/// Receiving half of a crawl's event channel
pub type EventReceiver = mpsc::UnboundedReceiver<CrawlEvent>;

/// Sends `event` if anyone subscribed; a dropped receiver is not an error
pub(crate) fn emit(events: Option<&EventSender>, event: CrawlEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}
