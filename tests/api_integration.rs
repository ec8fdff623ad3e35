//! Integration tests for the Custom ID Worker API.
//!
//! These tests spin up a real server instance and make HTTP requests to verify
//! the complete request/response cycle.

use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use regex::Regex;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

use customid_worker::api::{AppState, create_router};
use customid_worker::config::{
    AppConfig, FileStorageConfig, ObservabilityConfig, SequenceConfig, StorageBackend,
    StorageConfig,
};
use customid_worker::storage::create_storage;

// ============================================================================
// Test Harness
// ============================================================================

/// Test server instance.
struct TestServer {
    addr: SocketAddr,
    client: Client,
    _temp_dir: TempDir,
}

impl TestServer {
    async fn new() -> Self {
        Self::with_start_value(1).await
    }

    async fn with_start_value(start_value: u64) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let config = AppConfig {
            storage: StorageConfig {
                backend: StorageBackend::File,
                file: FileStorageConfig {
                    data_dir: temp_dir.path().to_path_buf(),
                },
                ..Default::default()
            },
            sequence: SequenceConfig { start_value },
            observability: ObservabilityConfig {
                log_level: "warn".to_string(),
                log_format: "text".to_string(),
                metrics_enabled: true,
                metrics_path: "/metrics".to_string(),
            },
            ..Default::default()
        };

        let storage = create_storage(&config.storage)
            .await
            .expect("Failed to create storage");

        // Not installed globally: tests share one process.
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let state = AppState::new(Arc::new(config), storage).with_metrics(handle);
        let app = create_router(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        Self {
            addr,
            client: Client::new(),
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    async fn post_empty(&self, path: &str) -> Response {
        self.client
            .post(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    async fn put<T: Serialize>(&self, path: &str, body: &T) -> Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    async fn generate(&self, inventory: &str) -> String {
        let response = self
            .post_empty(&format!("/v1/inventories/{inventory}/custom-id/generate"))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<GenerateData> = response.json().await.unwrap();
        body.data.unwrap().custom_id
    }
}

/// API response structure.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    code: i32,
    #[allow(dead_code)]
    message: String,
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn is_success(&self) -> bool {
        self.code == 0
    }
}

#[derive(Debug, Deserialize)]
struct PreviewData {
    preview: String,
}

#[derive(Debug, Deserialize)]
struct GenerateData {
    inventory_id: String,
    custom_id: String,
}

#[derive(Debug, Deserialize)]
struct SequenceData {
    next_value: u64,
    initialized: bool,
}

fn sku_elements() -> Value {
    json!({
        "elements": [
            { "elementType": "FIXED_TEXT", "value": "SKU-" },
            { "elementType": "SEQUENCE", "format": "D4" }
        ]
    })
}

// ============================================================================
// Health Endpoint Tests
// ============================================================================

#[derive(Debug, Deserialize)]
struct HealthData {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ReadyData {
    ready: bool,
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::new().await;
    let response = server.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body: ApiResponse<HealthData> = response.json().await.unwrap();
    assert!(body.is_success());
    assert_eq!(body.data.unwrap().status, "healthy");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let server = TestServer::new().await;
    let response = server.get("/ready").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<ReadyData> = response.json().await.unwrap();
    assert!(body.is_success());
    assert!(body.data.unwrap().ready);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let server = TestServer::new().await;
    let response = server.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Element Type Tests
// ============================================================================

#[tokio::test]
async fn test_element_types_catalogue() {
    let server = TestServer::new().await;
    let response = server.get("/v1/element-types").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<Vec<Value>> = response.json().await.unwrap();
    let types = body.data.unwrap();
    assert_eq!(types.len(), 8);

    let sequence = types
        .iter()
        .find(|t| t["element_type"] == "SEQUENCE")
        .expect("SEQUENCE listed");
    assert_eq!(sequence["requires_format"], true);
    assert_eq!(sequence["max_occurrences"], Value::Null);
}

// ============================================================================
// Draft Tests
// ============================================================================

#[tokio::test]
async fn test_validate_reports_every_error() {
    let server = TestServer::new().await;

    let response = server
        .post(
            "/v1/custom-id/validate",
            &json!({
                "elements": [
                    { "elementType": "FIXED_TEXT", "value": "" },
                    { "elementType": "RANDOM_6DIGIT", "format": "Q6" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    let errors = body["data"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["kind"], "MissingRequiredValue");
    assert_eq!(errors[0]["index"], 0);
    assert_eq!(errors[1]["kind"], "InvalidFormatSpecifier");
    assert_eq!(errors[1]["field"], "format");
}

#[tokio::test]
async fn test_validate_accepts_valid_list() {
    let server = TestServer::new().await;
    let response = server.post("/v1/custom-id/validate", &sku_elements()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<Value> = response.json().await.unwrap();
    assert_eq!(body.data.unwrap()["element_count"], 2);
}

#[tokio::test]
async fn test_preview_of_draft_list() {
    let server = TestServer::new().await;

    let response = server.post("/v1/custom-id/preview", &sku_elements()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: ApiResponse<PreviewData> = response.json().await.unwrap();
    assert_eq!(body.data.unwrap().preview, "SKU-0001");

    let response = server
        .post("/v1/custom-id/preview", &json!({ "elements": [] }))
        .await;
    let body: ApiResponse<PreviewData> = response.json().await.unwrap();
    assert_eq!(body.data.unwrap().preview, "");
}

#[tokio::test]
async fn test_unknown_element_type() {
    let server = TestServer::new().await;
    let response = server
        .post(
            "/v1/custom-id/preview",
            &json!({ "elements": [{ "elementType": "RANDOM_64BIT" }] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"][0]["kind"], "UnknownElementType");
}

// ============================================================================
// Inventory Configuration Tests
// ============================================================================

#[tokio::test]
async fn test_configuration_lifecycle() {
    let server = TestServer::new().await;
    let path = "/v1/inventories/books/custom-id";

    let response = server.get(path).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server.put(path, &sku_elements()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = server.get(path).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: ApiResponse<Value> = response.json().await.unwrap();
    let data = body.data.unwrap();
    assert_eq!(data["inventory_id"], "books");
    assert_eq!(data["elements"][1]["element_type"], "SEQUENCE");
    assert_eq!(data["elements"][1]["format"], "D4");

    let response = server.delete(path).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = server.delete(path).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_configuration_is_rejected() {
    let server = TestServer::new().await;
    let path = "/v1/inventories/books/custom-id";

    let response = server.put(path, &json!({ "elements": [] })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"][0]["kind"], "EmptyConfiguration");

    let bad_radix = json!({
        "elements": [
            { "elementType": "FIXED_TEXT", "value": "SKU-" },
            { "elementType": "SEQUENCE", "format": "Z4" }
        ]
    });
    let response = server.put(path, &bad_radix).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server.get(path).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_too_many_elements() {
    let server = TestServer::new().await;
    let elements: Vec<Value> = (0..11)
        .map(|_| json!({ "elementType": "FIXED_TEXT", "value": "A" }))
        .collect();

    let response = server
        .put(
            "/v1/inventories/books/custom-id",
            &json!({ "elements": elements }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"][0]["kind"], "TooManyElements");
}

// ============================================================================
// Generation Tests
// ============================================================================

#[tokio::test]
async fn test_generate_from_stored_configuration() {
    let server = TestServer::new().await;
    server
        .put("/v1/inventories/books/custom-id", &sku_elements())
        .await;

    assert_eq!(server.generate("books").await, "SKU-0001");
    assert_eq!(server.generate("books").await, "SKU-0002");

    let response = server.get("/v1/inventories/books/sequence").await;
    let body: ApiResponse<SequenceData> = response.json().await.unwrap();
    let data = body.data.unwrap();
    assert!(data.initialized);
    assert_eq!(data.next_value, 3);
}

#[tokio::test]
async fn test_preview_does_not_consume_sequence() {
    let server = TestServer::new().await;
    server
        .put("/v1/inventories/books/custom-id", &sku_elements())
        .await;

    for _ in 0..3 {
        let response = server
            .post_empty("/v1/inventories/books/custom-id/preview")
            .await;
        let body: ApiResponse<PreviewData> = response.json().await.unwrap();
        assert_eq!(body.data.unwrap().preview, "SKU-0001");
    }

    assert_eq!(server.generate("books").await, "SKU-0001");

    let response = server
        .post_empty("/v1/inventories/books/custom-id/preview")
        .await;
    let body: ApiResponse<PreviewData> = response.json().await.unwrap();
    assert_eq!(body.data.unwrap().preview, "SKU-0002");
}

#[tokio::test]
async fn test_generate_with_supplied_elements() {
    let server = TestServer::new().await;

    let response = server
        .post(
            "/v1/inventories/orders/custom-id/generate",
            &json!({
                "elements": [
                    { "elementType": "FIXED_TEXT", "value": "INV-" },
                    { "elementType": "DATE_TIME", "format": "yyyyMMdd" },
                    { "elementType": "FIXED_TEXT", "value": "-" },
                    { "elementType": "RANDOM_32BIT", "format": "X8" },
                    { "elementType": "FIXED_TEXT", "value": "-" },
                    { "elementType": "SEQUENCE", "format": "D3" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<GenerateData> = response.json().await.unwrap();
    let data = body.data.unwrap();
    assert_eq!(data.inventory_id, "orders");
    let pattern = Regex::new(r"^INV-[0-9]{8}-[0-9a-f]{8}-001$").unwrap();
    assert!(pattern.is_match(&data.custom_id), "{}", data.custom_id);
}

#[tokio::test]
async fn test_generate_without_configuration() {
    let server = TestServer::new().await;
    let response = server
        .post_empty("/v1/inventories/unknown/custom-id/generate")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_render_keeps_sequence() {
    let server = TestServer::new().await;
    let response = server
        .post(
            "/v1/inventories/books/custom-id/generate",
            &json!({
                "elements": [
                    { "elementType": "SEQUENCE", "format": "D4" },
                    { "elementType": "DATE_TIME", "format": "" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server.get("/v1/inventories/books/sequence").await;
    let body: ApiResponse<SequenceData> = response.json().await.unwrap();
    let data = body.data.unwrap();
    assert!(!data.initialized);
    assert_eq!(data.next_value, 1);
}

#[tokio::test]
async fn test_sequence_per_inventory() {
    let server = TestServer::new().await;
    server
        .put("/v1/inventories/books/custom-id", &sku_elements())
        .await;
    server
        .put("/v1/inventories/music/custom-id", &sku_elements())
        .await;

    assert_eq!(server.generate("books").await, "SKU-0001");
    assert_eq!(server.generate("books").await, "SKU-0002");
    assert_eq!(server.generate("music").await, "SKU-0001");
}

#[tokio::test]
async fn test_zero_start_value() {
    let server = TestServer::with_start_value(0).await;
    server
        .put("/v1/inventories/books/custom-id", &sku_elements())
        .await;

    assert_eq!(server.generate("books").await, "SKU-0000");
    assert_eq!(server.generate("books").await, "SKU-0001");
}

#[tokio::test]
async fn test_malformed_body() {
    let server = TestServer::new().await;
    let response = server
        .client
        .post(server.url("/v1/inventories/books/custom-id/generate"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
