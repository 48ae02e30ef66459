//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client, sized to the crawl's concurrency
//! - Applying the path filter before any request is issued
//! - Classifying responses as directory listings or leaf files
//! - Parsing listings into child work paths
//! - Streaming leaf bodies into the storage sink (or discarding them)

use crate::crawler::events::{emit, CrawlEvent, EventSender};
use crate::crawler::parser::extract_links;
use crate::output::StatsHandle;
use crate::state::ItemState;
use crate::storage::FileSink;
use crate::url::{is_partition_level, join_relative, request_url, PathFilter};
use crate::{CrawlError, TransportError};
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Content-Type prefix that marks a response as a directory listing
pub const DIRECTORY_CONTENT_TYPE: &str = "text/html";

/// How a successful response is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// HTML index page; parsed for children
    Directory,

    /// Anything else; streamed to storage or discarded
    File,
}

/// Classifies a response by its Content-Type header
///
/// # Examples
///
/// ```
/// use datecrawl::crawler::{classify, ResponseKind};
///
/// assert_eq!(classify(Some("text/html; charset=UTF-8")), ResponseKind::Directory);
/// assert_eq!(classify(Some("application/xml")), ResponseKind::File);
/// assert_eq!(classify(None), ResponseKind::File);
/// ```
pub fn classify(content_type: Option<&str>) -> ResponseKind {
    match content_type {
        Some(ct) if ct.starts_with(DIRECTORY_CONTENT_TYPE) => ResponseKind::Directory,
        _ => ResponseKind::File,
    }
}

/// Result of fetching one work path
#[derive(Debug)]
pub enum FetchOutcome {
    /// The filter rejected the path; no request was issued
    Skipped,

    /// A listing was fetched; holds the resolved child paths
    Directory(Vec<String>),

    /// A leaf was fetched and its body fully consumed; holds the byte count
    File(u64),

    /// The request, body or storage failed; the subtree is not explored
    Abandoned(CrawlError),
}

impl FetchOutcome {
    /// The terminal state this outcome puts its work item in
    pub fn item_state(&self) -> ItemState {
        match self {
            Self::Skipped => ItemState::Skipped,
            Self::Directory(_) => ItemState::Listed,
            Self::File(_) => ItemState::Stored,
            Self::Abandoned(_) => ItemState::Abandoned,
        }
    }
}

/// Streaming body of a leaf file
///
/// Handed to a [`FileSink`] so it can persist the body chunk by chunk.
#[derive(Debug)]
pub struct BodyStream {
    path: String,
    source: BodySource,
    read: u64,
}

#[derive(Debug)]
enum BodySource {
    Response(Response),
    Chunks(VecDeque<Bytes>),
}

impl BodyStream {
    pub(crate) fn from_response(path: &str, response: Response) -> Self {
        Self {
            path: path.to_string(),
            source: BodySource::Response(response),
            read: 0,
        }
    }

    /// Builds a stream over in-memory chunks
    pub fn from_chunks(path: &str, chunks: Vec<Bytes>) -> Self {
        Self {
            path: path.to_string(),
            source: BodySource::Chunks(chunks.into()),
            read: 0,
        }
    }

    /// Relative path of the file this body belongs to
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Reads the next chunk; `None` once the body is exhausted
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        let next = match &mut self.source {
            BodySource::Response(response) => {
                response
                    .chunk()
                    .await
                    .map_err(|source| TransportError::Body {
                        path: self.path.clone(),
                        source,
                    })?
            }
            BodySource::Chunks(chunks) => chunks.pop_front(),
        };

        if let Some(chunk) = &next {
            self.read += chunk.len() as u64;
        }
        Ok(next)
    }

    /// Reads and drops whatever is left of the body
    ///
    /// # Returns
    ///
    /// The total number of bytes read from the body
    pub async fn discard(&mut self) -> Result<u64, TransportError> {
        while self.chunk().await?.is_some() {}
        Ok(self.read)
    }
}

/// Builds the HTTP client for a crawl
///
/// The connection pool is sized to the crawl's concurrency ceiling, which is
/// passed in rather than configured process-wide. No overall request timeout
/// is set: leaf files may be large.
pub fn build_http_client(concurrency: usize) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("datecrawl/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(concurrency.max(1))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches work paths for one crawl
///
/// Shared between in-flight fetch tasks; every field is read-only except the
/// counters behind `stats`.
pub struct Fetcher {
    client: Client,
    server: Url,
    root: String,
    filter: PathFilter,
    sink: Option<Arc<dyn FileSink>>,
    events: Option<EventSender>,
    stats: StatsHandle,
}

impl Fetcher {
    pub fn new(
        client: Client,
        server: Url,
        root: String,
        filter: PathFilter,
        stats: StatsHandle,
    ) -> Self {
        Self {
            client,
            server,
            root,
            filter,
            sink: None,
            events: None,
            stats,
        }
    }

    /// Streams leaf bodies into `sink` instead of discarding them
    pub fn with_sink(mut self, sink: Option<Arc<dyn FileSink>>) -> Self {
        self.sink = sink;
        self
    }

    /// Reports discovered directories on `events`
    pub fn with_events(mut self, events: Option<EventSender>) -> Self {
        self.events = events;
        self
    }

    /// Returns true if `path` passes the filter
    ///
    /// The year, month and day levels are always admitted so every date in
    /// range can be descended into, whatever the filter says.
    pub fn admits(&self, path: &str) -> bool {
        is_partition_level(path) || self.filter.matches(path)
    }

    /// Fetches one work path
    ///
    /// # Request Flow
    ///
    /// 1. Skip without a request if the filter rejects the path
    /// 2. Count the request, then GET `server` + `root` + `path`
    /// 3. HTTP status >= 400 or a connection failure abandons the path
    /// 4. `text/html` responses are listings: report the directory, read
    ///    the body, return the resolved children
    /// 5. Anything else is a leaf: stream it to the sink (or discard it)
    ///    until the body is exhausted
    pub async fn fetch(&self, path: &str) -> FetchOutcome {
        if !self.admits(path) {
            tracing::debug!("Skipping {} (filtered)", path);
            return FetchOutcome::Skipped;
        }

        let url = match request_url(&self.server, &self.root, path) {
            Ok(url) => url,
            Err(source) => {
                return FetchOutcome::Abandoned(
                    TransportError::Url {
                        path: path.to_string(),
                        source,
                    }
                    .into(),
                )
            }
        };

        tracing::debug!("fetch {}", url);
        self.stats.record_request();

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(source) => {
                return FetchOutcome::Abandoned(
                    TransportError::Request {
                        path: path.to_string(),
                        source,
                    }
                    .into(),
                )
            }
        };

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return FetchOutcome::Abandoned(
                TransportError::Status {
                    path: path.to_string(),
                    status: status.as_u16(),
                }
                .into(),
            );
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());

        match classify(content_type) {
            ResponseKind::Directory => match self.got_directory(path, response).await {
                Ok(children) => FetchOutcome::Directory(children),
                Err(e) => FetchOutcome::Abandoned(e.into()),
            },
            ResponseKind::File => match self.got_file(path, response).await {
                Ok(bytes) => FetchOutcome::File(bytes),
                Err(e) => FetchOutcome::Abandoned(e),
            },
        }
    }

    /// Reads a listing and resolves its children against `path`
    async fn got_directory(
        &self,
        path: &str,
        response: Response,
    ) -> Result<Vec<String>, TransportError> {
        emit(
            self.events.as_ref(),
            CrawlEvent::Directory {
                path: path.to_string(),
            },
        );

        let body = response
            .bytes()
            .await
            .map_err(|source| TransportError::Body {
                path: path.to_string(),
                source,
            })?;
        let text = String::from_utf8_lossy(&body);

        let children: Vec<String> = extract_links(&text)
            .into_iter()
            .filter_map(|href| {
                let child = join_relative(path, &href);
                if child.is_none() {
                    tracing::debug!("Ignoring link {} above the crawl root", href);
                }
                child
            })
            .collect();

        tracing::debug!("{} lists {} children", path, children.len());
        Ok(children)
    }

    /// Consumes a leaf body, through the sink if one is registered
    async fn got_file(&self, path: &str, response: Response) -> Result<u64, CrawlError> {
        let mut body = BodyStream::from_response(path, response);

        if let Some(sink) = &self.sink {
            sink.store(path, &mut body).await?;
        }

        Ok(body.discard().await?)
    }
}
