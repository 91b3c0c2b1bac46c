//! API endpoint integration tests

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use triggercmd_gateway::{ApiServerBuilder, ConfigRegistry, RelayClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{TEST_CONFIG_ID, mount_list, registry_for, sample_list};

/// Build a test API router
fn build_test_router(registry: ConfigRegistry, api_key: Option<&str>) -> axum::Router {
    ApiServerBuilder::new(registry)
        .api_key(api_key.map(str::to_string))
        .client(RelayClient::new())
        .build()
        .router()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router(ConfigRegistry::new(), None);

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_ready_without_credentials_is_degraded() {
    let app = build_test_router(ConfigRegistry::new(), None);

    let response = app.oneshot(get("/ready")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = json_body(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["credentials"]["status"], "fail");
}

#[tokio::test]
async fn test_command_list_returns_canonical_catalog() {
    let server = MockServer::start().await;
    mount_list(&server, sample_list(), 1).await;
    let app = build_test_router(registry_for(&server), None);

    let response = app
        .oneshot(get(&format!("/triggercmd/{TEST_CONFIG_ID}/commandList")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["computers"], json!(["PC1", "PC2", "PC3"]));
    assert_eq!(json["triggersByComputer"]["PC1"], json!(["A", "C"]));
    assert_eq!(json["triggersByComputer"]["PC2"], json!(["B"]));
    assert_eq!(json["triggersByComputer"]["PC3"], json!([]));
}

#[tokio::test]
async fn test_command_list_is_cached_per_config() {
    let server = MockServer::start().await;
    // A second remote call would fail the expectation on drop
    mount_list(&server, sample_list(), 1).await;
    let app = build_test_router(registry_for(&server), None);
    let uri = format!("/triggercmd/{TEST_CONFIG_ID}/commandList");

    let first = app.clone().oneshot(get(&uri)).await.unwrap();
    let second = app.oneshot(get(&uri)).await.unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(json_body(first).await, json_body(second).await);
}

#[tokio::test]
async fn test_command_list_unknown_config() {
    let app = build_test_router(ConfigRegistry::new(), None);

    let response = app
        .oneshot(get("/triggercmd/nope/commandList"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Invalid TRIGGERcmd config");
}

#[tokio::test]
async fn test_command_list_remote_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/command/list"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    let app = build_test_router(registry_for(&server), None);

    let response = app
        .oneshot(get(&format!("/triggercmd/{TEST_CONFIG_ID}/commandList")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["error"], "List failed: 503");
}

#[tokio::test]
async fn test_probe_without_token_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let app = build_test_router(ConfigRegistry::new(), None);

    let response = app
        .oneshot(post_json("/triggercmd/test", &json!({"baseUrl": server.uri()})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json, json!({"error": "missing token"}));
}

#[tokio::test]
async fn test_probe_with_empty_body_is_missing_token() {
    let app = build_test_router(ConfigRegistry::new(), None);

    let request = Request::builder()
        .method("POST")
        .uri("/triggercmd/test")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_probe_reports_sample_size() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/command/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{}, {}, {}]})))
        .expect(1)
        .mount(&server)
        .await;
    let app = build_test_router(ConfigRegistry::new(), None);

    let response = app
        .oneshot(post_json(
            "/triggercmd/test",
            &json!({"baseUrl": server.uri(), "token": "T"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json, json!({"ok": true, "status": 200, "sample": 3}));
}

#[tokio::test]
async fn test_probe_mirrors_remote_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/command/list"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .expect(1)
        .mount(&server)
        .await;
    let app = build_test_router(ConfigRegistry::new(), None);

    let response = app
        .oneshot(post_json(
            "/triggercmd/test",
            &json!({"baseUrl": server.uri(), "token": "bad"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["sample"], 0);
}

#[tokio::test]
async fn test_admin_routes_require_api_key() {
    let app = build_test_router(ConfigRegistry::new(), Some("test-api-key"));

    let response = app
        .oneshot(get("/triggercmd/home/commandList"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_with_api_key() {
    let server = MockServer::start().await;
    mount_list(&server, sample_list(), 1).await;
    let app = build_test_router(registry_for(&server), Some("test-api-key"));

    let request = Request::builder()
        .uri(format!("/triggercmd/{TEST_CONFIG_ID}/commandList"))
        .header("Authorization", "Bearer test-api-key")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_is_not_guarded() {
    let app = build_test_router(ConfigRegistry::new(), Some("test-api-key"));

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_routes_accept_api_key_header() {
    let app = build_test_router(ConfigRegistry::new(), Some("test-api-key"));

    let request = Request::builder()
        .method("POST")
        .uri("/triggercmd/test")
        .header("X-Api-Key", "test-api-key")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    // Past the guard, the probe itself rejects the missing token
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_api_key_is_rejected() {
    let app = build_test_router(ConfigRegistry::new(), Some("test-api-key"));

    let request = Request::builder()
        .uri("/triggercmd/home/commandList")
        .header("Authorization", "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await;
    assert_eq!(json["error"], "invalid API key");
}

#[tokio::test]
async fn test_connection_report_survives_no_content_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/command/list"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let app = build_test_router(ConfigRegistry::new(), None);

    let response = app
        .oneshot(post_json(
            "/triggercmd/test",
            &json!({"baseUrl": server.uri(), "token": "T"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = json_body(response).await;
    assert_eq!(json, json!({"ok": true, "status": 204, "sample": 0}));
}
