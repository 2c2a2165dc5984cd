//! FILENAME: tests/test_rows.rs
//! Integration tests for saving, clearing and inspecting stored rows.

mod common;

use app_lib::ServerConfig;
use axum::http::StatusCode;
use common::{SalesFixture, TestHarness};
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let harness = TestHarness::new();
    let response = harness.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"status": "ok"}));
}

#[tokio::test]
async fn test_save_replaces_previous_rows() {
    let harness = TestHarness::new();

    let first = harness
        .post_json("/save", json!({"rows": SalesFixture::rows()}))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.json(), json!({"stored": 6}));

    let second = harness
        .post_json("/save", json!({"rows": [{"city": "Oslo", "pop": 700}, {"city": "Bergen", "pop": 290}]}))
        .await;
    assert_eq!(second.json(), json!({"stored": 2}));
    assert_eq!(harness.stored_count(), 2);

    let headers = harness.get("/headers").await.json();
    assert_eq!(headers, json!({"headers": ["city", "pop"]}));
}

#[tokio::test]
async fn test_headers_follow_record_order() {
    let harness = TestHarness::with_sales_data();
    let headers = harness.get("/headers").await.json();

    assert_eq!(headers["headers"], json!(["region", "product", "sales", "units"]));
}

#[tokio::test]
async fn test_headers_on_empty_store() {
    let harness = TestHarness::new();
    assert_eq!(harness.get("/headers").await.json(), json!({"headers": []}));
}

#[tokio::test]
async fn test_clear() {
    let harness = TestHarness::with_sales_data();

    let response = harness.post("/clear").await;
    assert_eq!(response.json(), json!({"cleared": 6}));
    assert_eq!(harness.stored_count(), 0);
}

#[tokio::test]
async fn test_save_empty_batch() {
    let harness = TestHarness::with_sales_data();
    let response = harness.post_json("/save", json!({"rows": []})).await;

    assert_eq!(response.json(), json!({"stored": 0}));
    assert_eq!(harness.stored_count(), 0);
}

#[tokio::test]
async fn test_save_rejects_nested_values() {
    let harness = TestHarness::with_sales_data();
    let response = harness
        .post_json("/save", json!({"rows": [{"region": {"name": "North"}}]}))
        .await;

    response.assert_error(StatusCode::UNPROCESSABLE_ENTITY);
    // A rejected batch leaves the previous rows in place.
    assert_eq!(harness.stored_count(), 6);
}

#[tokio::test]
async fn test_save_requires_rows() {
    let harness = TestHarness::new();
    let response = harness.post_json("/save", json!({"data": []})).await;
    response.assert_error(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_malformed_json_gets_envelope() {
    let harness = TestHarness::new();
    let response = harness.post_raw_json("/save", "{\"rows\": [".to_string()).await;
    response.assert_error(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route() {
    let harness = TestHarness::new();
    harness.get("/nope").await.assert_error(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        store_path: Some(dir.path().join("rows.json")),
        ..ServerConfig::default()
    };

    let harness = TestHarness::with_config(config.clone());
    let saved = harness
        .post_json("/save", json!({"rows": [{"k": "v", "n": 1}]}))
        .await;
    assert_eq!(saved.json(), json!({"stored": 1}));

    let restarted = TestHarness::with_config(config);
    assert_eq!(restarted.stored_count(), 1);
    assert_eq!(
        restarted.get("/headers").await.json(),
        json!({"headers": ["k", "n"]})
    );
}
