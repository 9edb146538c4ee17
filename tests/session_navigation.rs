//! Integration tests for the navigation state machine
//!
//! These drive `BrowserSession` end to end against an in-memory fetch
//! collaborator: connect semantics, the three navigation operations, error
//! surfacing, and last-writer-wins fencing for superseded requests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use sta_browser::error::{BrowserError, FetchFailure};
use sta_browser::http::{Credentials, Fetch};
use sta_browser::session::{BrowserSession, CommitOutcome};
use sta_browser::view::View;

// =========================================================================
// TEST INFRASTRUCTURE
// =========================================================================

/// Canned-response fetcher keyed by absolute URL
#[derive(Default)]
struct FakeFetch {
    bodies: HashMap<String, Value>,
    failures: HashMap<String, u16>,
}

impl FakeFetch {
    fn with(mut self, url: &str, body: Value) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }

    fn failing(mut self, url: &str, status: u16) -> Self {
        self.failures.insert(url.to_string(), status);
        self
    }
}

#[async_trait]
impl Fetch for FakeFetch {
    async fn get_json(
        &self,
        url: &str,
        _credentials: Option<&Credentials>,
    ) -> Result<Value, FetchFailure> {
        if let Some(status) = self.failures.get(url) {
            return Err(FetchFailure::http(
                *status,
                format!("HTTP {} from {}", status, url),
            ));
        }
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| FetchFailure::http(404, format!("HTTP 404 Not Found: {}", url)))
    }
}

const BASE: &str = "http://h/v1/";

fn service_root() -> Value {
    json!({
        "value": [
            {"name": "Things", "url": "http://h/v1/Things"},
            {"name": "Sensors", "href": "Sensors", "description": "all sensors"},
            {"name": "Observations"},
            {"description": "no name, dropped"}
        ]
    })
}

async fn connected_session(fetch: FakeFetch) -> BrowserSession {
    let fetch = fetch.with(BASE, service_root());
    let mut session = BrowserSession::new(Arc::new(fetch));
    session.connect(BASE, None).await.expect("connect should succeed");
    session
}

fn trail_pairs(session: &BrowserSession) -> Vec<(String, String)> {
    session
        .trail()
        .iter()
        .map(|c| (c.label.clone(), c.url.clone()))
        .collect()
}

// =========================================================================
// CONNECT
// =========================================================================

#[tokio::test]
async fn connect_builds_catalog_with_synthesized_and_resolved_urls() {
    let fetch = FakeFetch::default().with(BASE, service_root());
    let mut session = BrowserSession::new(Arc::new(fetch));

    session.connect("http://h/v1", None).await.expect("connect");

    assert_eq!(session.base_url(), BASE);
    assert_eq!(session.root_error(), None);

    let sets = session.entity_sets();
    assert_eq!(sets.len(), 3, "the nameless entry is dropped");
    assert_eq!(sets[0].url, "http://h/v1/Things");
    assert_eq!(sets[1].url, "http://h/v1/Sensors", "href resolved against base");
    assert_eq!(sets[1].description.as_deref(), Some("all sensors"));
    assert_eq!(sets[2].url, "http://h/v1/Observations", "synthesized from name");
}

#[tokio::test]
async fn connect_with_empty_value_array_fails_with_empty_catalog() {
    let fetch = FakeFetch::default().with(BASE, json!({"value": []}));
    let mut session = BrowserSession::new(Arc::new(fetch));

    let err = session.connect(BASE, None).await.unwrap_err();
    assert!(matches!(err, BrowserError::EmptyCatalog));
    assert!(session.entity_sets().is_empty());
    assert!(session.root_error().is_some());
    // The attempted base is still adopted so the resolver has a base
    assert_eq!(session.base_url(), BASE);
}

#[tokio::test]
async fn connect_failure_surfaces_status_and_clears_navigation() {
    let good = FakeFetch::default()
        .with(BASE, service_root())
        .with("http://h/v1/Things", json!({"value": [], "@iot.count": 0}));
    let mut session = BrowserSession::new(Arc::new(good));
    session.connect(BASE, None).await.expect("connect");
    session.open("http://h/v1/Things", "Things").await.expect("open");
    assert_eq!(session.trail().len(), 1);

    // Reconnect against a denying server: catalog emptied, trail cleared,
    // status visible in the root error
    let denied = FakeFetch::default().failing("http://h2/v1/", 401);
    let mut session2 = BrowserSession::new(Arc::new(denied));
    let err = session2.connect("http://h2/v1", None).await.unwrap_err();
    assert!(err.to_string().contains("401"), "got: {}", err);
    assert!(session2.root_error().unwrap_or_default().contains("401"));

    // And a reconnect on the same session discards prior navigation
    let err = session.connect("http://h2/v1", None).await.unwrap_err();
    assert!(matches!(err, BrowserError::ConnectFailed(_)));
    assert!(session.trail().is_empty());
    assert!(session.view().is_none());
    assert!(session.entity_sets().is_empty());
    assert_eq!(session.base_url(), "http://h2/v1/");
}

// =========================================================================
// VIEW CLASSIFICATION THROUGH THE SESSION
// =========================================================================

#[tokio::test]
async fn open_classifies_collection_and_resolves_next_link() {
    let fetch = FakeFetch::default().with(
        "http://h/v1/Things",
        json!({
            "value": [{"@iot.id": 1, "name": "A"}],
            "@iot.nextLink": "Things?$skip=1",
            "@iot.count": 7
        }),
    );
    let mut session = connected_session(fetch).await;

    session.open("Things", "Things").await.expect("open");

    match session.view() {
        Some(View::Collection {
            items,
            next_link,
            total_count,
        }) => {
            assert_eq!(items.len(), 1);
            assert_eq!(next_link.as_deref(), Some("http://h/v1/Things?$skip=1"));
            assert_eq!(*total_count, Some(7));
        }
        other => panic!("expected a collection view, got {:?}", other),
    }
    assert_eq!(
        trail_pairs(&session),
        vec![("Things".to_string(), "http://h/v1/Things".to_string())]
    );
}

#[tokio::test]
async fn follow_wraps_entity_bodies_whole() {
    let entity = json!({"@iot.id": 1, "name": "A", "properties": {"k": "v"}});
    let fetch = FakeFetch::default().with("http://h/v1/Things(1)", entity.clone());
    let mut session = connected_session(fetch).await;

    session.follow("Things(1)", "Thing 1").await.expect("follow");

    assert_eq!(session.view(), Some(&View::Single { entity }));
}

// =========================================================================
// NAVIGATION STACK SEMANTICS
// =========================================================================

#[tokio::test]
async fn paginate_replaces_last_url_and_keeps_depth_and_label() {
    let fetch = FakeFetch::default()
        .with("http://h/v1/u1", json!({"value": [], "page": 1}))
        .with("http://h/v1/u2", json!({"value": [], "page": 2}))
        .with("http://h/v1/u3", json!({"value": [], "page": 3}));
    let mut session = connected_session(fetch).await;

    session.open("u1", "L1").await.expect("open");
    session.follow("u2", "L2").await.expect("follow");
    session.paginate("u3").await.expect("paginate");

    assert_eq!(
        trail_pairs(&session),
        vec![
            ("L1".to_string(), "http://h/v1/u1".to_string()),
            ("L2".to_string(), "http://h/v1/u3".to_string()),
        ]
    );
}

#[tokio::test]
async fn paginate_without_trail_or_link_is_a_noop() {
    let fetch = FakeFetch::default();
    let mut session = connected_session(fetch).await;

    session.paginate("u3").await.expect("noop");
    assert!(session.trail().is_empty());
    assert!(session.view().is_none());
}

#[tokio::test]
async fn revisit_truncates_and_reloads_at_index() {
    let fetch = FakeFetch::default()
        .with("http://h/v1/u1", json!({"value": []}))
        .with("http://h/v1/u2", json!({"value": [], "gen": 1}))
        .with("http://h/v1/u3", json!({"value": []}));
    let mut session = connected_session(fetch).await;

    session.open("u1", "L1").await.expect("open");
    session.follow("u2", "L2").await.expect("follow");
    session.follow("u3", "L3").await.expect("follow");

    session.revisit(1).await.expect("revisit");
    assert_eq!(
        trail_pairs(&session),
        vec![
            ("L1".to_string(), "http://h/v1/u1".to_string()),
            ("L2".to_string(), "http://h/v1/u2".to_string()),
        ]
    );

    // Revisiting the current (last) step changes nothing
    session.revisit(1).await.expect("noop");
    assert_eq!(session.trail().len(), 2);
}

#[tokio::test]
async fn revisit_far_out_of_range_is_a_noop() {
    let fetch = FakeFetch::default()
        .with("http://h/v1/u1", json!({"value": []}))
        .with("http://h/v1/u2", json!({"value": []}));
    let mut session = connected_session(fetch).await;

    session.open("u1", "L1").await.expect("open");
    session.follow("u2", "L2").await.expect("follow");
    let before = trail_pairs(&session);

    // Arbitrary user input: any index at or past the end must change nothing
    session.revisit(2).await.expect("noop");
    session.revisit(usize::MAX).await.expect("noop");
    assert_eq!(trail_pairs(&session), before);
}

// =========================================================================
// FAILURE ISOLATION
// =========================================================================

#[tokio::test]
async fn failed_navigation_leaves_committed_state_untouched() {
    let fetch = FakeFetch::default()
        .with("http://h/v1/u1", json!({"value": [{"@iot.id": 1}]}))
        .failing("http://h/v1/denied", 401);
    let mut session = connected_session(fetch).await;

    session.open("u1", "L1").await.expect("open");
    let before = trail_pairs(&session);

    let err = session.follow("denied", "Denied").await.unwrap_err();
    assert!(err.to_string().contains("401"), "got: {}", err);

    assert_eq!(trail_pairs(&session), before, "trail unchanged on failure");
    assert!(
        matches!(session.view(), Some(View::Collection { .. })),
        "prior view still displayed"
    );
    assert!(session.content_error().unwrap_or_default().contains("401"));
    assert!(session.root_error().is_none());

    // The next successful navigation clears the content error
    session.revisit(0).await.expect("noop revisit of only crumb");
    session.paginate("u1").await.expect("reload in place");
    assert!(session.content_error().is_none());
}

// =========================================================================
// FENCING: LAST WRITER WINS
// =========================================================================

#[tokio::test]
async fn stale_navigation_result_is_discarded() {
    let mut session = connected_session(FakeFetch::default()).await;

    // Two navigations issued back to back; the older one completes last
    let slow = session.begin_open("slow", "Slow");
    let fast = session.begin_follow("fast", "Fast");
    assert_eq!(slow.url(), "http://h/v1/slow");
    assert_eq!(fast.url(), "http://h/v1/fast");

    let fast_view = View::Single {
        entity: json!({"origin": "fast"}),
    };
    let slow_view = View::Collection {
        items: vec![],
        next_link: None,
        total_count: None,
    };

    assert_eq!(
        session.commit(fast, Ok(fast_view)).expect("commit fast"),
        CommitOutcome::Committed
    );
    assert_eq!(
        session.commit(slow, Ok(slow_view)).expect("stale commit"),
        CommitOutcome::Superseded
    );

    // The fresher result stayed committed
    assert_eq!(
        session.view(),
        Some(&View::Single {
            entity: json!({"origin": "fast"})
        })
    );
    assert_eq!(trail_pairs(&session).len(), 1, "only the follow committed");
}

#[tokio::test]
async fn reconnect_fences_out_inflight_navigation() {
    let fetch = FakeFetch::default()
        .with(BASE, service_root())
        .with(
            "http://h2/v1/",
            json!({"value": [{"name": "Sensors"}]}),
        );
    let mut session = BrowserSession::new(Arc::new(fetch));
    session.connect(BASE, None).await.expect("first connect");

    // A navigation issued under the first connection is still in flight
    // when the session reconnects elsewhere
    let stale = session.begin_open("Things", "Things");
    session.connect("http://h2/v1", None).await.expect("reconnect");
    assert_eq!(session.base_url(), "http://h2/v1/");

    let outcome = session
        .commit(
            stale,
            Ok(View::Collection {
                items: vec![],
                next_link: None,
                total_count: None,
            }),
        )
        .expect("stale commit");
    assert_eq!(outcome, CommitOutcome::Superseded);

    // The reconnect's clean slate survives: no resurrected trail or view
    assert!(session.trail().is_empty());
    assert!(session.view().is_none());
    assert_eq!(session.entity_sets().len(), 1);
}

#[tokio::test]
async fn stale_failure_does_not_set_an_error() {
    let fetch = FakeFetch::default().with("http://h/v1/u1", json!({"value": []}));
    let mut session = connected_session(fetch).await;
    session.open("u1", "L1").await.expect("open");

    let stale = session.begin_follow("gone", "Gone");
    let _fresh = session.begin_paginate("u1").expect("pending paginate");

    let outcome = session
        .commit(stale, Err(BrowserError::Fetch("HTTP 500".to_string())))
        .expect("stale failures are swallowed");
    assert_eq!(outcome, CommitOutcome::Superseded);
    assert!(session.content_error().is_none());
}
