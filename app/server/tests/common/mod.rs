//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for GroupSheet server integration tests.

use std::io::Cursor;
use std::sync::Arc;

use app_lib::{build_router, create_app_state, create_app_state_with, AppState, ServerConfig};
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request, StatusCode};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use engine::Record;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const BOUNDARY: &str = "groupsheet-test-boundary";

/// Test harness for creating and managing test state.
pub struct TestHarness {
    pub state: Arc<AppState>,
}

/// A fully buffered response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "response is not JSON ({}): {}",
                e,
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn header(&self, name: header::HeaderName) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// First worksheet of an xlsx body.
    pub fn worksheet(&self) -> Range<Data> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(self.body.to_vec())).unwrap();
        workbook.worksheet_range_at(0).unwrap().unwrap()
    }

    /// Asserts the failure envelope and returns its message.
    pub fn assert_error(&self, status: StatusCode) -> String {
        assert_eq!(self.status, status, "body: {}", String::from_utf8_lossy(&self.body));
        let body = self.json();
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
        body["message"].as_str().unwrap_or_default().to_string()
    }
}

impl TestHarness {
    /// Create a new test harness with an empty in-memory store.
    pub fn new() -> Self {
        TestHarness {
            state: Arc::new(create_app_state()),
        }
    }

    pub fn with_config(config: ServerConfig) -> Self {
        TestHarness {
            state: Arc::new(create_app_state_with(config)),
        }
    }

    /// Create a harness whose store already holds `rows`.
    pub fn with_rows(rows: Value) -> Self {
        let harness = Self::new();
        harness.seed(rows);
        harness
    }

    /// Create a harness with the sales fixture stored.
    pub fn with_sales_data() -> Self {
        Self::with_rows(SalesFixture::rows())
    }

    /// Replace the stored rows directly, bypassing HTTP.
    pub fn seed(&self, rows: Value) {
        let records: Vec<Record> = serde_json::from_value(rows).unwrap();
        self.state
            .with_store(|store| store.replace_all(records))
            .unwrap();
    }

    pub fn stored_count(&self) -> usize {
        self.state.with_store(|store| store.len()).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = build_router(self.state.clone())
            .oneshot(request)
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
            .await
            .unwrap();

        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.post_raw_json(uri, body.to_string()).await
    }

    pub async fn post_raw_json(&self, uri: &str, body: String) -> TestResponse {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// POST a multipart form with one file part named `field`.
    pub async fn post_file(&self, uri: &str, field: &str, file_name: &str, bytes: &[u8]) -> TestResponse {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(field, file_name, bytes)))
                .unwrap(),
        )
        .await
    }
}

pub fn multipart_body(field: &str, file_name: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"{n}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n",
        b = BOUNDARY,
        f = field,
        n = file_name
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Small sales table: two regions, two products.
pub struct SalesFixture;

impl SalesFixture {
    pub fn rows() -> Value {
        json!([
            {"region": "North", "product": "Apples", "sales": 100, "units": 10},
            {"region": "North", "product": "Pears",  "sales": 40,  "units": 4},
            {"region": "South", "product": "Apples", "sales": 70,  "units": 7},
            {"region": "North", "product": "Apples", "sales": 60,  "units": 5},
            {"region": "South", "product": "Pears",  "sales": "n/a", "units": 2},
            {"region": null,    "product": "Figs",   "sales": 5,   "units": 1}
        ])
    }
}

/// The three-record scenario: A has 10 and 20, B has 5.
pub fn scenario_rows() -> Value {
    json!([
        {"region": "A", "sales": 10},
        {"region": "A", "sales": 20},
        {"region": "B", "sales": 5}
    ])
}

/// Cell text at (row, col) of a worksheet, if it is a string.
pub fn cell_text(range: &Range<Data>, row: usize, col: usize) -> Option<String> {
    match range.get((row, col)) {
        Some(Data::String(s)) => Some(s.clone()),
        _ => None,
    }
}

/// Cell number at (row, col) of a worksheet, if it is numeric.
pub fn cell_number(range: &Range<Data>, row: usize, col: usize) -> Option<f64> {
    match range.get((row, col)) {
        Some(Data::Float(f)) => Some(*f),
        Some(Data::Int(i)) => Some(*i as f64),
        _ => None,
    }
}
