//! HTTP handler tests for the tracking endpoints.
//!
//! Tests the actual HTTP responses from the API handlers against an in-memory store.

mod common;

use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use common::{UnreachableStore, create_test_config, create_test_server, create_test_store};
use email_open_tracker::{
    config::StoreFailurePolicy, entity::open_event::NewOpenEvent, pixel::TRANSPARENT_GIF,
    store::EventStore,
};
use serde_json::Value;
use std::sync::Arc;
use time::{OffsetDateTime, format_description::well_known::Rfc3339, macros::datetime};

fn opened_at(event: &Value) -> OffsetDateTime {
    OffsetDateTime::parse(event["opened_at"].as_str().expect("opened_at"), &Rfc3339)
        .expect("RFC 3339 timestamp")
}

// =============================================================================
// Pixel Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_pixel_records_open_and_returns_gif() {
    let store = create_test_store().await;
    let server = create_test_server(store.clone(), create_test_config());

    let before = OffsetDateTime::now_utc();
    let response = server
        .get("/track/abc123")
        .add_header(header::USER_AGENT, HeaderValue::from_static("Thunderbird/128.0"))
        .await;
    let after = OffsetDateTime::now_utc();

    response.assert_status_ok();
    assert_eq!(response.header(header::CONTENT_TYPE), "image/gif");
    assert_eq!(
        response.header(header::CACHE_CONTROL),
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(response.header(header::PRAGMA), "no-cache");
    assert_eq!(response.header(header::EXPIRES), "0");
    assert_eq!(response.header(header::CONTENT_LENGTH), "42");
    assert_eq!(response.as_bytes().as_ref(), TRANSPARENT_GIF);

    let events = store.list_recent().await.expect("list");
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.email_id, "abc123");
    assert_eq!(event.user_agent.as_deref(), Some("Thunderbird/128.0"));
    assert!(event.opened_at >= before - time::Duration::milliseconds(1));
    assert!(event.opened_at <= after + time::Duration::milliseconds(1));
}

#[tokio::test]
async fn test_pixel_then_query_shows_exactly_one_new_row() {
    let store = create_test_store().await;
    let server = create_test_server(store, create_test_config());

    server.get("/track/existing").await.assert_status_ok();
    let before: Vec<Value> = server.get("/api/tracking").await.json();

    let start = OffsetDateTime::now_utc();
    server.get("/track/msg-42").await.assert_status_ok();
    let end = OffsetDateTime::now_utc();

    let after: Vec<Value> = server.get("/api/tracking").await.json();
    assert_eq!(after.len(), before.len() + 1);

    let new_rows: Vec<&Value> = after.iter().filter(|e| e["email_id"] == "msg-42").collect();
    assert_eq!(new_rows.len(), 1);
    let ts = opened_at(new_rows[0]);
    assert!(ts >= start - time::Duration::milliseconds(1));
    assert!(ts <= end + time::Duration::milliseconds(1));
}

#[tokio::test]
async fn test_repeated_opens_are_not_deduplicated() {
    let store = create_test_store().await;
    let server = create_test_server(store.clone(), create_test_config());

    let mut bodies = Vec::new();
    for _ in 0..3 {
        let response = server.get("/track/newsletter-7").await;
        response.assert_status_ok();
        bodies.push(response.as_bytes().to_vec());
    }

    assert!(bodies.iter().all(|b| b == TRANSPARENT_GIF));
    let events = store.list_recent().await.expect("list");
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.email_id == "newsletter-7"));

    let mut ids: Vec<i64> = events.iter().map(|e| e.id).collect();
    ids.dedup();
    assert_eq!(ids.len(), 3, "each open gets its own row");
}

#[tokio::test]
async fn test_pixel_keeps_non_ascii_user_agent() {
    let store = create_test_store().await;
    let server = create_test_server(store.clone(), create_test_config());

    server
        .get("/track/ua")
        .add_header(
            header::USER_AGENT,
            HeaderValue::from_bytes("Outlook Müller/1.0".as_bytes()).expect("header value"),
        )
        .await
        .assert_status_ok();

    let events = store.list_recent().await.expect("list");
    assert_eq!(events[0].user_agent.as_deref(), Some("Outlook Müller/1.0"));
}

#[tokio::test]
async fn test_pixel_records_forwarded_client_address_when_trusted() {
    let store = create_test_store().await;
    let mut config = create_test_config();
    config.trust_forwarded_for = true;
    let server = create_test_server(store.clone(), config);

    server
        .get("/track/via-proxy")
        .add_header(
            HeaderName::from_static("x-forwarded-for"),
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        )
        .await
        .assert_status_ok();

    let events = store.list_recent().await.expect("list");
    assert_eq!(events[0].ip_address.as_deref(), Some("203.0.113.9"));
}

#[tokio::test]
async fn test_pixel_accepts_arbitrary_identifiers() {
    let store = create_test_store().await;
    let server = create_test_server(store.clone(), create_test_config());

    server
        .get("/track/user%40example.com%3Acampaign")
        .await
        .assert_status_ok();

    let events = store.list_recent().await.expect("list");
    assert_eq!(events[0].email_id, "user@example.com:campaign");
}

#[tokio::test]
async fn test_pixel_fails_visibly_when_store_unreachable() {
    let server = create_test_server(Arc::new(UnreachableStore), create_test_config());

    let response = server.get("/track/abc123").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_text("Tracking failed");
    assert_ne!(response.as_bytes().as_ref(), TRANSPARENT_GIF);
}

#[tokio::test]
async fn test_pixel_served_anyway_with_serve_pixel_policy() {
    let mut config = create_test_config();
    config.tracking.on_store_failure = StoreFailurePolicy::ServePixel;
    let server = create_test_server(Arc::new(UnreachableStore), config);

    let response = server.get("/track/abc123").await;

    response.assert_status_ok();
    assert_eq!(response.header(header::CONTENT_TYPE), "image/gif");
    assert_eq!(response.as_bytes().as_ref(), TRANSPARENT_GIF);
}

// =============================================================================
// Query Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_query_on_empty_store_returns_empty_array() {
    let server = create_test_server(create_test_store().await, create_test_config());

    let response = server.get("/api/tracking").await;

    response.assert_status_ok();
    response.assert_json(&serde_json::json!([]));
}

#[tokio::test]
async fn test_query_is_sorted_most_recent_first() {
    let store = create_test_store().await;
    for (email_id, at) in [
        ("first", datetime!(2026-10-01 08:00:00 UTC)),
        ("third", datetime!(2026-10-03 08:00:00 UTC)),
        ("second", datetime!(2026-10-02 08:00:00 UTC)),
    ] {
        store
            .append(NewOpenEvent {
                email_id: email_id.to_string(),
                opened_at: at,
                user_agent: None,
                ip_address: None,
            })
            .await
            .expect("append");
    }
    let server = create_test_server(store, create_test_config());

    let events: Vec<Value> = server.get("/api/tracking").await.json();

    let ids: Vec<&str> = events
        .iter()
        .map(|e| e["email_id"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(ids, ["third", "second", "first"]);
    assert!(
        events
            .windows(2)
            .all(|pair| opened_at(&pair[0]) >= opened_at(&pair[1]))
    );
}

#[tokio::test]
async fn test_query_rows_carry_every_field() {
    let store = create_test_store().await;
    let server = create_test_server(store, create_test_config());
    server.get("/track/fields").await.assert_status_ok();

    let events: Vec<Value> = server.get("/api/tracking").await.json();
    let event = events[0].as_object().expect("object");

    for key in [
        "id",
        "email_id",
        "opened_at",
        "user_agent",
        "ip_address",
        "created_at",
    ] {
        assert!(event.contains_key(key), "missing {key}");
    }
    assert!(event["id"].is_i64());
    assert_eq!(event["email_id"], "fields");
}

#[tokio::test]
async fn test_query_reports_store_failure_as_json() {
    let server = create_test_server(Arc::new(UnreachableStore), create_test_config());

    let response = server.get("/api/tracking").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Failed to fetch tracking data");
    assert!(
        body["details"]
            .as_str()
            .is_some_and(|d| d.contains("connection refused"))
    );
}

// =============================================================================
// Health Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_reports_configuration_presence() {
    let mut config = create_test_config();
    config.store.password = Some("service-role".into());
    let server = create_test_server(create_test_store().await, config);

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "OK");
    assert_eq!(body["store_url"], "Configured");
    assert_eq!(body["store_credential"], "Configured");
    assert!(
        body["timestamp"]
            .as_str()
            .is_some_and(|ts| OffsetDateTime::parse(ts, &Rfc3339).is_ok())
    );
}

#[tokio::test]
async fn test_health_is_ok_when_store_unreachable() {
    let server = create_test_server(Arc::new(UnreachableStore), create_test_config());

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "OK");
    assert_eq!(body["store_credential"], "Missing");
}

// =============================================================================
// Static Dashboard Tests
// =============================================================================

#[tokio::test]
async fn test_dashboard_served_at_root() {
    let server = create_test_server(create_test_store().await, create_test_config());

    let response = server.get("/").await;

    response.assert_status_ok();
    assert!(response.text().contains("/api/tracking"));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let server = create_test_server(create_test_store().await, create_test_config());

    server
        .get("/no/such/asset.js")
        .await
        .assert_status_not_found();
}
