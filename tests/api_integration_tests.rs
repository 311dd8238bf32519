//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycles for the booking wizard and the
//! read-through cache, against a manual clock and a local upstream.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Path,
    http::{Request, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use inkbook::{
    api::create_router,
    api_cache::{TtlPolicy, UpstreamClient},
    booking::{BookingRequest, BookingSubmitter, RetryPolicy, SimulatedSubmitter},
    cache::{ExpiringStore, ManualClock},
    error::SubmitError,
    AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::at_date(
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
    ))
}

fn test_state(submitter: Arc<dyn BookingSubmitter>) -> AppState {
    AppState::new(ExpiringStore::in_memory(test_clock()), submitter)
        .with_retry(RetryPolicy::new(3, Duration::from_millis(1)))
}

fn create_test_app() -> Router {
    let submitter = SimulatedSubmitter::new(0.0, Duration::ZERO);
    create_router(test_state(Arc::new(submitter)))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn fill_step_one(app: &Router, session: &str) {
    let (status, _) = send(
        app,
        "PATCH",
        &format!("/sessions/{}/steps/1", session),
        Some(json!({
            "artist": "alex-morgan",
            "location": "berlin",
            "date": "2026-11-02",
            "time": "2:00 PM"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn fill_all_steps(app: &Router, session: &str) {
    fill_step_one(app, session).await;
    let rest = [
        json!({
            "first_name": "Ana",
            "last_name": "Silva",
            "email": "ana@example.com",
            "confirm_email": "ana@example.com",
            "phone": "+49 30 1234567",
            "birth_date": "1994-05-02",
            "contact_method": "email"
        }),
        json!({
            "placement": "forearm",
            "size": "medium",
            "style": "fine-line",
            "description": "a fern curling around the wrist"
        }),
        json!({ "health_consent": true, "aftercare_consent": true }),
        json!({
            "deposit_method": "card",
            "accept_terms": true,
            "accept_cancellation_policy": true
        }),
    ];
    for (i, record) in rest.into_iter().enumerate() {
        let uri = format!("/sessions/{}/steps/{}", session, i + 2);
        let (status, json) = send(app, "PATCH", &uri, Some(record)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["valid"], true, "step {} should be valid: {}", i + 2, json);
    }
}

/// Submitter whose every attempt fails on the network.
struct DownSubmitter {
    calls: AtomicUsize,
}

#[async_trait]
impl BookingSubmitter for DownSubmitter {
    async fn submit(&self, _booking: &BookingRequest) -> Result<String, SubmitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SubmitError::Network("connection reset".to_string()))
    }
}

/// Starts a local studio backend counting requests per path.
async fn spawn_upstream() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));

    let list_hits = hits.clone();
    let item_hits = hits.clone();
    let app = Router::new()
        .route(
            "/api/artists",
            get(move || {
                let hits = list_hits.clone();
                async move {
                    let n = hits.fetch_add(1, Ordering::SeqCst) + 1;
                    Json(json!({ "artists": ["alex-morgan", "sam-lee"], "served": n }))
                }
            }),
        )
        .route(
            "/api/artists/:id",
            get(move |Path(id): Path<String>| {
                let hits = item_hits.clone();
                async move {
                    let n = hits.fetch_add(1, Ordering::SeqCst) + 1;
                    Json(json!({ "id": id, "served": n }))
                }
            }),
        )
        .route(
            "/api/search",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "search is down") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), hits)
}

async fn create_cached_app() -> (Router, Arc<AtomicUsize>) {
    let (base_url, hits) = spawn_upstream().await;
    let upstream = UpstreamClient::new(base_url, Duration::from_secs(5)).unwrap();
    let submitter = SimulatedSubmitter::new(0.0, Duration::ZERO);
    let state = test_state(Arc::new(submitter))
        .with_api_cache(TtlPolicy::default(), true)
        .with_upstream(upstream);
    (create_router(state), hits)
}

// == Session Tests ==

#[tokio::test]
async fn test_fresh_session_starts_at_step_one() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/sessions/tab-1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current_step"], 1);
    assert_eq!(json["progress"], 0);
    assert_eq!(json["complete"], false);
    assert_eq!(json["steps"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_invalid_session_id_rejected() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/sessions/bad%20id", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_new_booking_discards_draft() {
    let app = create_test_app();
    fill_step_one(&app, "tab-1").await;

    let (_, before) = send(&app, "GET", "/sessions/tab-1", None).await;
    assert_eq!(before["progress"], 20);

    let (status, after) = send(&app, "GET", "/sessions/tab-1?new_booking=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["progress"], 0);
}

// == Wizard Scenario ==

#[tokio::test]
async fn test_fill_step_one_and_advance() {
    let app = create_test_app();

    fill_step_one(&app, "tab-1").await;
    let (status, step) = send(&app, "GET", "/sessions/tab-1/steps/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(step["valid"], true);
    assert_eq!(step["record"]["artist"], "alex-morgan");

    let (status, nav) = send(&app, "POST", "/sessions/tab-1/next", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(nav["current_step"], 2);
    assert_eq!(nav["progress"], 20);
}

#[tokio::test]
async fn test_next_blocked_by_incomplete_step() {
    let app = create_test_app();

    send(
        &app,
        "PATCH",
        "/sessions/tab-1/steps/1",
        Some(json!({ "artist": "alex-morgan" })),
    )
    .await;
    let (status, json) = send(&app, "POST", "/sessions/tab-1/next", None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains('1'));
}

#[tokio::test]
async fn test_jump_ahead_is_noop() {
    let app = create_test_app();

    let (status, nav) = send(&app, "POST", "/sessions/tab-1/jump/4", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(nav["current_step"], 1);
}

#[tokio::test]
async fn test_jump_back_after_advancing() {
    let app = create_test_app();
    fill_step_one(&app, "tab-1").await;
    send(&app, "POST", "/sessions/tab-1/next", None).await;

    let (status, nav) = send(&app, "POST", "/sessions/tab-1/jump/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(nav["current_step"], 1);

    let (status, _) = send(&app, "POST", "/sessions/tab-1/jump/0", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_email_case_mismatch_invalid() {
    let app = create_test_app();

    let (status, json) = send(
        &app,
        "PATCH",
        "/sessions/tab-1/steps/2",
        Some(json!({
            "first_name": "Ana",
            "last_name": "Silva",
            "email": "ana@example.com",
            "confirm_email": "Ana@example.com",
            "phone": "+49 30 1234567",
            "birth_date": "1994-05-02",
            "contact_method": "email"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["valid"], false);
    assert_eq!(json["messages"][0]["field"], "confirm_email");
}

#[tokio::test]
async fn test_non_text_values_do_not_validate() {
    let app = create_test_app();

    let (status, json) = send(
        &app,
        "PATCH",
        "/sessions/tab-1/steps/2",
        Some(json!({
            "first_name": "Ana",
            "last_name": "Silva",
            "email": true,
            "confirm_email": false,
            "phone": "+49 30 1234567",
            "birth_date": 2015,
            "contact_method": "email"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["valid"], false);
    let flagged: Vec<&str> = json["messages"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m["field"].as_str())
        .collect();
    assert_eq!(flagged, vec!["email", "confirm_email", "birth_date"]);

    let (_, step_one) = send(
        &app,
        "PATCH",
        "/sessions/tab-1/steps/1",
        Some(json!({
            "artist": "alex-morgan",
            "location": "berlin",
            "date": 1,
            "time": "2:00 PM"
        })),
    )
    .await;
    assert_eq!(step_one["valid"], false);
}

#[tokio::test]
async fn test_clear_step() {
    let app = create_test_app();
    fill_step_one(&app, "tab-1").await;

    let (status, json) = send(&app, "DELETE", "/sessions/tab-1/steps/1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["valid"], false);
    assert_eq!(json["record"]["artist"], "");
    assert_eq!(json["time_remaining_ms"], 0);
}

#[tokio::test]
async fn test_close_discards_sensitive_steps() {
    let app = create_test_app();
    fill_all_steps(&app, "tab-1").await;

    let (status, json) = send(&app, "POST", "/sessions/tab-1/close", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleared"], json!([2, 4]));

    let (_, summary) = send(&app, "GET", "/sessions/tab-1", None).await;
    assert_eq!(summary["progress"], 60);
}

// == Submission Tests ==

#[tokio::test]
async fn test_submit_incomplete_booking() {
    let app = create_test_app();
    fill_step_one(&app, "tab-1").await;

    let (status, json) = send(&app, "POST", "/sessions/tab-1/submit", None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_submit_success_resets_draft() {
    let app = create_test_app();
    fill_all_steps(&app, "tab-1").await;

    let (status, json) = send(&app, "POST", "/sessions/tab-1/submit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["confirmation_id"].as_str().unwrap().starts_with("BK-"));
    assert_eq!(json["attempts"], 1);

    let (_, summary) = send(&app, "GET", "/sessions/tab-1", None).await;
    assert_eq!(summary["progress"], 0);
}

#[tokio::test]
async fn test_submit_failures_keep_draft() {
    let submitter = Arc::new(DownSubmitter {
        calls: AtomicUsize::new(0),
    });
    let app = create_router(test_state(submitter.clone()));
    fill_all_steps(&app, "tab-1").await;

    let (status, json) = send(&app, "POST", "/sessions/tab-1/submit", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"].as_str().unwrap().contains('3'));
    assert_eq!(submitter.calls.load(Ordering::SeqCst), 3);

    let (_, summary) = send(&app, "GET", "/sessions/tab-1", None).await;
    assert_eq!(summary["complete"], true);
    assert_eq!(summary["progress"], 100);
}

// == Read-Through Tests ==

#[tokio::test]
async fn test_cached_read_without_upstream() {
    let app = create_test_app();

    let (status, _) = send(&app, "GET", "/api/artists", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_cached_read_served_from_cache() {
    let (app, hits) = create_cached_app().await;

    let (status, first) = send(&app, "GET", "/api/artists", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["served"], 1);

    let (status, second) = send(&app, "GET", "/api/artists", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, first);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_query_order_shares_entry() {
    let (app, hits) = create_cached_app().await;

    send(&app, "GET", "/api/artists/7?b=2&a=1", None).await;
    let (status, json) = send(&app, "GET", "/api/artists/7?a=1&b=2", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "7");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let (app, hits) = create_cached_app().await;
    send(&app, "GET", "/api/artists/7", None).await;
    send(&app, "GET", "/api/artists/8", None).await;

    let (status, json) = send(
        &app,
        "POST",
        "/cache/artists/invalidate",
        Some(json!({ "pattern": "^7$", "regex": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 1);

    let (_, refetched) = send(&app, "GET", "/api/artists/7", None).await;
    assert_eq!(refetched["served"], 3);
    send(&app, "GET", "/api/artists/8", None).await;
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_invalidate_bad_regex() {
    let app = create_test_app();

    let (status, _) = send(
        &app,
        "POST",
        "/cache/artists/invalidate",
        Some(json!({ "pattern": "(", "regex": true })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_namespace_reserved() {
    let (app, _) = create_cached_app().await;

    let (status, _) = send(&app, "GET", "/api/session/tab-1", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let (app, _) = create_cached_app().await;

    let (status, json) = send(&app, "GET", "/api/search", None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json.get("error").is_some());
}

// == Stats and Health ==

#[tokio::test]
async fn test_stats_reflect_activity() {
    let (app, _) = create_cached_app().await;
    send(&app, "GET", "/api/artists", None).await;
    send(&app, "GET", "/api/artists", None).await;

    let (status, json) = send(&app, "GET", "/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["api"]["fetches"], 1);
    assert_eq!(json["api"]["fresh_hits"], 1);
    assert!(json["store"]["total_entries"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}
