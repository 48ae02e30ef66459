//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small date-partitioned tree and run
//! the full crawl cycle end-to-end.

use datecrawl::config::PartialConfig;
use datecrawl::crawler::EventReceiver;
use datecrawl::storage::open_storage;
use datecrawl::{CrawlError, CrawlEvent, CrawlPhase, Crawler, Elapsed, TransportError};
use std::io::Write;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DAY: &str = "/gd2/year_2014/month_01/day_01/";

/// Writes a defaults file pointing the crawl at the mock server
fn defaults_for(server: &MockServer, file_match: &[&str]) -> NamedTempFile {
    write_defaults(&server.uri(), 1, file_match)
}

fn write_defaults(server: &str, concurrency: u32, file_match: &[&str]) -> NamedTempFile {
    let patterns: Vec<String> = file_match.iter().map(|p| format!("'{}'", p)).collect();
    let content = format!(
        "root = \"/gd2\"\nserver = \"{}\"\nconcurrency = {}\nmatch_all = []\nfile_match = [{}]\n",
        server,
        concurrency,
        patterns.join(", ")
    );

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn one_day() -> PartialConfig {
    PartialConfig {
        start: Some("2014-01-01".to_string()),
        end: Some("2014-01-01".to_string()),
        ..Default::default()
    }
}

/// Renders an Apache-style index page
fn listing(links: &[&str]) -> String {
    let mut body = String::from("<html><body><ul>\n<li><a href=\"/gd2/\"> Parent Directory</a></li>\n");
    for link in links {
        body.push_str(&format!("<li><a href=\"{0}\"> {0}</a></li>\n", link));
    }
    body.push_str("</ul></body></html>\n");
    body
}

async fn mount_listing(server: &MockServer, at: &str, links: &[&str]) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(listing(links), "text/html"))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_file(server: &MockServer, at: &str, body: &str, expected: u64) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/xml"))
        .expect(expected)
        .mount(server)
        .await;
}

/// Collects every event sent before the crawler was dropped
fn drain_events(mut rx: EventReceiver) -> Vec<CrawlEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn directories(events: &[CrawlEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            CrawlEvent::Directory { path } => Some(path.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_listing_with_two_children() {
    let server = MockServer::start().await;
    let defaults = defaults_for(&server, &[".*"]);

    mount_listing(&server, DAY, &["game1/", "game2/"]).await;
    for game in ["game1/", "game2/"] {
        Mock::given(method("GET"))
            .and(path(format!("{}{}", DAY, game)))
            .respond_with(ResponseTemplate::new(200).set_body_raw("", "text/plain"))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut crawler = Crawler::new(&one_day())
        .unwrap()
        .with_defaults_path(defaults.path());
    let rx = crawler.subscribe();

    crawler.start().unwrap();
    let stats = crawler.run().await.unwrap();
    assert_eq!(crawler.phase(), CrawlPhase::Done);
    drop(crawler);

    assert_eq!(stats.request_count, 3);
    assert_eq!(stats.directories, 1);
    assert_eq!(stats.files, 2);
    assert!(stats.elapsed.as_millis().is_some());

    let events = drain_events(rx);
    assert!(matches!(events.first(), Some(CrawlEvent::Ready)));
    assert_eq!(directories(&events), vec!["year_2014/month_01/day_01/"]);

    let ends: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, CrawlEvent::End { .. }))
        .collect();
    assert_eq!(ends.len(), 1, "end must fire exactly once");
    assert!(matches!(events.last(), Some(CrawlEvent::End { stats: s }) if *s == stats));
}

#[tokio::test]
async fn test_malformed_listing_drains() {
    let server = MockServer::start().await;
    let defaults = defaults_for(&server, &[".*"]);

    Mock::given(method("GET"))
        .and(path(DAY))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><p>not an index</p><a href=\"x/\">x</a></html>", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut crawler = Crawler::new(&one_day())
        .unwrap()
        .with_defaults_path(defaults.path());
    crawler.start().unwrap();
    let stats = crawler.run().await.unwrap();

    assert_eq!(stats.request_count, 1);
    assert_eq!(stats.directories, 1);
    assert_eq!(stats.files, 0);
}

#[tokio::test]
async fn test_file_match_skips_without_request() {
    let server = MockServer::start().await;
    let defaults = defaults_for(&server, &[r"\.xml$"]);

    mount_listing(&server, DAY, &["boxscore.xml", "boxscore.txt"]).await;
    mount_file(&server, &format!("{}boxscore.xml", DAY), "<boxscore/>", 1).await;
    mount_file(&server, &format!("{}boxscore.txt", DAY), "nope", 0).await;

    let mut crawler = Crawler::new(&one_day())
        .unwrap()
        .with_defaults_path(defaults.path());
    crawler.start().unwrap();
    let stats = crawler.run().await.unwrap();

    assert_eq!(stats.request_count, 2);
    assert_eq!(stats.files, 1);
    assert_eq!(stats.skipped, 1);
}

#[tokio::test]
async fn test_files_written_to_output() {
    let server = MockServer::start().await;
    let defaults = defaults_for(&server, &[".*"]);
    let output = TempDir::new().unwrap();

    mount_listing(&server, DAY, &["gid_1/", "miniscoreboard.xml"]).await;
    mount_listing(&server, &format!("{}gid_1/", DAY), &["boxscore.xml"]).await;
    mount_file(&server, &format!("{}miniscoreboard.xml", DAY), "<games/>", 1).await;
    mount_file(&server, &format!("{}gid_1/boxscore.xml", DAY), "<boxscore id=\"1\"/>", 1).await;

    let mut crawler = Crawler::new(&one_day())
        .unwrap()
        .with_defaults_path(defaults.path())
        .with_sink(open_storage(output.path()));
    let rx = crawler.subscribe();
    crawler.start().unwrap();
    let stats = crawler.run().await.unwrap();
    drop(crawler);

    assert_eq!(stats.request_count, 4);
    assert_eq!(stats.directories, 2);
    assert_eq!(stats.files, 2);

    let day = output.path().join("year_2014/month_01/day_01");
    assert_eq!(
        std::fs::read_to_string(day.join("miniscoreboard.xml")).unwrap(),
        "<games/>"
    );
    assert_eq!(
        std::fs::read_to_string(day.join("gid_1/boxscore.xml")).unwrap(),
        "<boxscore id=\"1\"/>"
    );

    let events = drain_events(rx);
    assert_eq!(
        directories(&events),
        vec!["year_2014/month_01/day_01/", "year_2014/month_01/day_01/gid_1/"]
    );
}

#[tokio::test]
async fn test_http_error_abandons_item() {
    let server = MockServer::start().await;
    let defaults = defaults_for(&server, &[".*"]);

    mount_listing(&server, DAY, &["missing.xml", "present.xml"]).await;
    Mock::given(method("GET"))
        .and(path(format!("{}missing.xml", DAY)))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_file(&server, &format!("{}present.xml", DAY), "<ok/>", 1).await;

    let mut crawler = Crawler::new(&one_day())
        .unwrap()
        .with_defaults_path(defaults.path());
    let rx = crawler.subscribe();
    crawler.start().unwrap();
    let stats = crawler.run().await.unwrap();
    drop(crawler);

    assert_eq!(stats.request_count, 3);
    assert_eq!(stats.files, 1);
    assert_eq!(stats.abandoned, 1);

    let events = drain_events(rx);
    let errors: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            CrawlEvent::Error(err) => Some(err.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(errors.len(), 1);
    match &*errors[0] {
        CrawlError::Transport(e @ TransportError::Status { status, .. }) => {
            assert_eq!(*status, 404);
            assert_eq!(e.path(), "year_2014/month_01/day_01/missing.xml");
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(matches!(events.last(), Some(CrawlEvent::End { .. })));
}

#[tokio::test]
async fn test_one_partition_per_day() {
    let server = MockServer::start().await;
    let defaults = defaults_for(&server, &[".*"]);

    for day in ["day_30", "day_31"] {
        mount_listing(&server, &format!("/gd2/year_2013/month_12/{}/", day), &[]).await;
    }
    mount_listing(&server, DAY, &[]).await;

    let user = PartialConfig {
        start: Some("2013-12-30".to_string()),
        end: Some("2014-01-01".to_string()),
        ..Default::default()
    };
    let mut crawler = Crawler::new(&user)
        .unwrap()
        .with_defaults_path(defaults.path());
    crawler.start().unwrap();
    let stats = crawler.run().await.unwrap();

    assert_eq!(stats.request_count, 3);
    assert_eq!(stats.directories, 3);
}

#[tokio::test]
async fn test_links_above_root_are_dropped() {
    let server = MockServer::start().await;
    let defaults = defaults_for(&server, &[".*"]);

    mount_listing(&server, DAY, &["../../../../etc/", "gid_1/"]).await;
    mount_listing(&server, &format!("{}gid_1/", DAY), &[]).await;

    let mut crawler = Crawler::new(&one_day())
        .unwrap()
        .with_defaults_path(defaults.path());
    crawler.start().unwrap();
    let stats = crawler.run().await.unwrap();

    assert_eq!(stats.request_count, 2);
    assert_eq!(stats.directories, 2);
}

#[tokio::test]
async fn test_user_config_overrides_defaults() {
    let server = MockServer::start().await;
    // defaults point at a closed port; the user's server must win
    let mut defaults = NamedTempFile::new().unwrap();
    defaults
        .write_all(b"root = \"/gd2\"\nserver = \"http://127.0.0.1:9\"\nconcurrency = 4\nfile_match = [\".*\"]\n")
        .unwrap();
    defaults.flush().unwrap();

    mount_listing(&server, "/other/year_2014/month_01/day_01/", &[]).await;

    let user = PartialConfig {
        server: Some(server.uri()),
        root: Some("/other/".to_string()),
        concurrency: Some(2),
        ..one_day()
    };
    let mut crawler = Crawler::new(&user)
        .unwrap()
        .with_defaults_path(defaults.path());
    crawler.initialize().await.unwrap();

    let config = crawler.config().unwrap();
    assert_eq!(config.concurrency, 2);
    assert_eq!(config.root, "/other/");

    crawler.start().unwrap();
    let stats = crawler.run().await.unwrap();
    assert_eq!(stats.request_count, 1);
}

#[tokio::test]
async fn test_missing_defaults_raises_error_event() {
    let mut crawler = Crawler::new(&one_day())
        .unwrap()
        .with_defaults_path("/nonexistent/datecrawl/defaults.toml");
    let rx = crawler.subscribe();
    crawler.start().unwrap();

    let err = crawler.run().await.unwrap_err();
    assert!(matches!(err.root_cause(), CrawlError::Defaults(_)));
    assert_eq!(crawler.phase(), CrawlPhase::Errored);
    drop(crawler);

    let events = drain_events(rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], CrawlEvent::Error(e) if matches!(**e, CrawlError::Defaults(_))));
}

#[tokio::test]
async fn test_stats_still_running_before_crawl() {
    let crawler = Crawler::new(&one_day()).unwrap();
    let stats = crawler.stats();
    assert_eq!(stats.request_count, 0);
    assert_eq!(stats.elapsed, Elapsed::StillRunning);
}

#[test]
fn test_invalid_dates_fail_construction() {
    let user = PartialConfig {
        start: Some("yesterday".to_string()),
        end: Some("2014-01-01".to_string()),
        ..Default::default()
    };
    let err = Crawler::new(&user).err().unwrap();
    assert!(err.to_string().contains("start"));
    assert!(err.to_string().contains("yesterday"));
}

fn error_events(events: &[CrawlEvent]) -> Vec<&CrawlError> {
    events
        .iter()
        .filter_map(|e| match e {
            CrawlEvent::Error(err) => Some(&**err),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_storage_failure_abandons_item() {
    let server = MockServer::start().await;
    let defaults = defaults_for(&server, &[".*"]);
    // a regular file cannot hold the partition directories
    let output = NamedTempFile::new().unwrap();

    mount_listing(&server, DAY, &["a.xml", "b.xml"]).await;
    mount_file(&server, &format!("{}a.xml", DAY), "<a/>", 1).await;
    mount_file(&server, &format!("{}b.xml", DAY), "<b/>", 1).await;

    let mut crawler = Crawler::new(&one_day())
        .unwrap()
        .with_defaults_path(defaults.path())
        .with_sink(open_storage(output.path()));
    let rx = crawler.subscribe();
    crawler.start().unwrap();
    let stats = crawler.run().await.unwrap();
    drop(crawler);

    assert_eq!(stats.request_count, 3);
    assert_eq!(stats.files, 0);
    assert_eq!(stats.abandoned, 2);

    let events = drain_events(rx);
    let errors = error_events(&events);
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| matches!(e, CrawlError::Storage(_))));
    assert!(matches!(events.last(), Some(CrawlEvent::End { .. })));
}

#[tokio::test]
async fn test_refused_connections_abandon_every_day() {
    // nothing listens on the discard port
    let defaults = write_defaults("http://127.0.0.1:9", 1, &[".*"]);
    let user = PartialConfig {
        start: Some("2014-01-01".to_string()),
        end: Some("2014-01-03".to_string()),
        ..Default::default()
    };

    let mut crawler = Crawler::new(&user)
        .unwrap()
        .with_defaults_path(defaults.path());
    let rx = crawler.subscribe();
    crawler.start().unwrap();
    let stats = crawler.run().await.unwrap();
    assert_eq!(crawler.phase(), CrawlPhase::Done);
    drop(crawler);

    assert_eq!(stats.request_count, 3);
    assert_eq!(stats.abandoned, 3);
    assert_eq!(stats.directories, 0);

    let events = drain_events(rx);
    let errors = error_events(&events);
    assert_eq!(errors.len(), 3);
    assert!(errors
        .iter()
        .all(|e| matches!(e, CrawlError::Transport(TransportError::Request { .. }))));
    assert!(matches!(events.last(), Some(CrawlEvent::End { .. })));
}

#[tokio::test]
async fn test_concurrency_caps_in_flight_fetches() {
    let server = MockServer::start().await;
    let defaults = write_defaults(&server.uri(), 2, &[".*"]);

    let leaves = ["1.xml", "2.xml", "3.xml", "4.xml", "5.xml", "6.xml"];
    mount_listing(&server, DAY, &leaves).await;
    for leaf in leaves {
        Mock::given(method("GET"))
            .and(path(format!("{}{}", DAY, leaf)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<x/>", "application/xml")
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut crawler = Crawler::new(&one_day())
        .unwrap()
        .with_defaults_path(defaults.path());
    crawler.start().unwrap();
    let stats = crawler.run().await.unwrap();

    assert_eq!(stats.files, 6);
    // six delayed leaves, two at a time, take at least three rounds
    let elapsed = stats.elapsed.as_millis().unwrap();
    assert!(elapsed >= 900, "finished in {} ms", elapsed);
}
