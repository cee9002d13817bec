#![allow(clippy::unwrap_used)]
// End-to-end tests: canned event streams through DataSubscriber and Feed.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use companies_api::{DatabaseClient, TransportConfig};
use companies_core::{
    DataSubscriber, DecodeStats, Feed, FeedConfig, SnapshotEvent, ViewPhase, ViewState,
    ViewStream,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn sse(events: &[(&str, serde_json::Value)]) -> ResponseTemplate {
    let body: String = events
        .iter()
        .map(|(name, data)| format!("event: {name}\ndata: {data}\n\n"))
        .collect();
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

fn put_root(data: serde_json::Value) -> (&'static str, serde_json::Value) {
    ("put", json!({"path": "/", "data": data}))
}

fn config(server: &MockServer) -> FeedConfig {
    FeedConfig::new(Url::parse(&server.uri()).unwrap())
}

fn subscriber(server: &MockServer) -> DataSubscriber {
    let client = DatabaseClient::new(
        Url::parse(&server.uri()).unwrap(),
        None,
        &TransportConfig::default(),
    )
    .unwrap();
    DataSubscriber::new(client)
}

async fn wait_for(stream: &mut ViewStream, done: impl Fn(&ViewState) -> bool) -> Arc<ViewState> {
    let latest = stream.latest();
    if done(&latest) {
        return latest;
    }
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let state = stream.changed().await.expect("projector dropped");
            if done(&state) {
                return state;
            }
        }
    })
    .await
    .expect("state never reached")
}

fn titles(state: &ViewState) -> Vec<&str> {
    state.records.iter().map(|c| c.title.as_str()).collect()
}

// ── DataSubscriber ──────────────────────────────────────────────────

#[tokio::test]
async fn test_subscription_delivers_then_fails_terminally() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies.json"))
        .respond_with(sse(&[put_root(json!({
            "x": {"id": 2, "title": "B"},
            "y": {"id": 1, "title": "A"}
        }))]))
        .mount(&server)
        .await;

    let mut sub = subscriber(&server).subscribe("companies");

    let Some(SnapshotEvent::Success(companies)) = sub.next().await else {
        panic!("expected a success event");
    };
    // Key order, not id order: sorting happens in the projector.
    let titles: Vec<_> = companies.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, ["B", "A"]);

    let Some(SnapshotEvent::Error(err)) = sub.next().await else {
        panic!("expected a terminal error");
    };
    assert_eq!(err.message(), "Disconnected");
    assert!(sub.next().await.is_none());
}

#[tokio::test]
async fn test_rejected_read_is_permission_denied_whatever_the_wording() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies.json"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Unauthorized request."})),
        )
        .mount(&server)
        .await;

    let mut sub = subscriber(&server).subscribe("companies");
    let Some(SnapshotEvent::Error(err)) = sub.next().await else {
        panic!("expected a terminal error");
    };
    assert_eq!(err.message(), "Unauthorized request.");
    assert!(err.is_permission_denied());
}

#[tokio::test]
async fn test_connection_error_does_not_reveal_token() {
    let client = DatabaseClient::new(
        Url::parse("http://127.0.0.1:9").unwrap(),
        Some(SecretString::from("SUPERSECRET".to_owned())),
        &TransportConfig::default(),
    )
    .unwrap();

    let mut sub = DataSubscriber::new(client).subscribe("companies");
    let Some(SnapshotEvent::Error(err)) = sub.next().await else {
        panic!("expected a terminal error");
    };
    assert!(!err.message().contains("SUPERSECRET"), "{}", err.message());
    assert!(!err.is_permission_denied());
}

#[tokio::test]
async fn test_malformed_child_is_dropped_and_observed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies.json"))
        .respond_with(sse(&[put_root(json!({
            "a": "garbage",
            "b": {"id": 1, "title": "Valid"}
        }))]))
        .mount(&server)
        .await;

    let stats = Arc::new(DecodeStats::new());
    let mut sub = subscriber(&server)
        .with_observer(stats.clone())
        .subscribe("companies");

    let Some(SnapshotEvent::Success(companies)) = sub.next().await else {
        panic!("expected a success event");
    };
    assert_eq!(companies.len(), 1);
    assert_eq!(companies[0].title, "Valid");
    assert_eq!(stats.rejected_count(), 1);
}

#[tokio::test]
async fn test_cancelled_subscription_yields_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies.json"))
        .respond_with(sse(&[put_root(json!({"a": {"id": 1}}))]).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let mut sub = subscriber(&server).subscribe("companies");
    sub.cancel();
    sub.cancel();
    assert!(sub.is_cancelled());
    assert!(sub.next().await.is_none());
}

// ── Feed ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_feed_projects_sorted_records_and_keeps_them_on_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies.json"))
        .respond_with(sse(&[
            put_root(json!({"2": {"id": 2, "title": "B"}, "1": {"id": 1, "title": "A"}})),
            ("patch", json!({"path": "/", "data": {"3": {"id": 0, "title": "Z"}}})),
        ]))
        .mount(&server)
        .await;

    let feed = Feed::new(config(&server)).unwrap();
    let mut state = feed.state();
    feed.start().await;

    let failed = wait_for(&mut state, |s| s.error.is_some()).await;
    assert!(!failed.loading);
    assert_eq!(failed.error.as_deref(), Some("Disconnected"));
    assert_eq!(titles(&failed), ["Z", "A", "B"]);
    assert_eq!(failed.phase(), ViewPhase::Failed);

    feed.shutdown().await;
}

#[tokio::test]
async fn test_feed_permission_denied_on_first_event() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies.json"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Permission denied"})),
        )
        .mount(&server)
        .await;

    let feed = Feed::new(config(&server)).unwrap();
    let mut state = feed.state();
    feed.start().await;

    let failed = wait_for(&mut state, |s| !s.loading).await;
    assert_eq!(failed.error.as_deref(), Some("Permission denied"));
    assert!(failed.records.is_empty());
}

#[tokio::test]
async fn test_feed_resubscribe_recovers_after_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies.json"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Permission denied"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/companies.json"))
        .respond_with(
            sse(&[put_root(json!({"a": {"id": 1, "title": "A"}}))])
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;

    let feed = Feed::new(config(&server)).unwrap();
    let mut state = feed.state();
    feed.start().await;
    wait_for(&mut state, |s| s.error.is_some()).await;
    assert!(feed.failure().is_some_and(|e| e.is_permission_denied()));

    feed.resubscribe().await;
    assert!(feed.snapshot().loading, "resubscribe restarts from loading");
    assert_eq!(feed.failure(), None);

    let ready = wait_for(&mut state, |s| !s.records.is_empty()).await;
    assert_eq!(titles(&ready), ["A"]);

    feed.shutdown().await;
}

#[tokio::test]
async fn test_fetch_once_sorts_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "k1": {"id": 9, "title": "Last"},
            "k2": {"id": 1, "title": "First"},
            "k3": 42
        })))
        .mount(&server)
        .await;

    let feed = Feed::new(config(&server)).unwrap();
    let companies = feed.fetch_once().await.unwrap();
    let titles: Vec<_> = companies.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, ["First", "Last"]);
}
