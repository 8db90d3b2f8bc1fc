#![allow(clippy::unwrap_used)]
// Integration tests for `TelemetryClient` and `BackendClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use seele_api::{BackendClient, Error, TelemetryClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, TelemetryClient) {
    let server = MockServer::start().await;
    let key = SecretString::from("test-key".to_string());
    let client =
        TelemetryClient::from_api_key(&server.uri(), &key, &TransportConfig::default()).unwrap();
    (server, client)
}

// ── Directory ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_nodes_sends_credentials_and_bypasses_cache() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/nodes"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("accept", "application/json"))
        .and(header("pragma", "no-cache"))
        .and(header_exists("cache-control"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "uuid": "abc", "name": "Tokyo 01", "region": "JP", "group": "asia" },
                { "uuid": "def", "name": null }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let nodes = client.list_nodes().await.unwrap();

    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].uuid.as_deref(), Some("abc"));
    assert_eq!(nodes[0].name.as_deref(), Some("Tokyo 01"));
    assert_eq!(nodes[0].region.as_deref(), Some("JP"));
    assert_eq!(nodes[1].uuid.as_deref(), Some("def"));
    assert!(nodes[1].name.is_none());
}

#[tokio::test]
async fn test_list_nodes_drops_non_object_records() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [ "garbage", 12, { "uuid": "ok" } ]
        })))
        .mount(&server)
        .await;

    let nodes = client.list_nodes().await.unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].uuid.as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_list_nodes_server_error_is_distinct() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/nodes"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = client.list_nodes().await;
    match result {
        Err(Error::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected Status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/nodes"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_nodes().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.list_nodes().await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Ping history ────────────────────────────────────────────────────

#[tokio::test]
async fn test_ping_records_passes_uuid_and_hours() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/records/ping"))
        .and(query_param("uuid", "abc"))
        .and(query_param("hours", "6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "tasks": [ { "id": 1, "interval": 60, "name": "CN-CT", "loss": 1.5 } ],
                "records": [
                    { "task_id": 1, "time": "2026-01-01T00:00:00Z", "value": 10 },
                    { "task_id": 1, "time": "2026-01-01T00:01:00Z", "value": 20.5 }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let history = client.ping_records("abc", 6).await.unwrap();

    assert_eq!(history.tasks.len(), 1);
    assert_eq!(history.tasks[0].id, Some(1));
    assert_eq!(history.tasks[0].interval, Some(60));
    assert_eq!(history.tasks[0].name.as_deref(), Some("CN-CT"));
    assert_eq!(history.records.len(), 2);
    assert_eq!(history.records[1].value, Some(20.5));
}

// ── Guest config ────────────────────────────────────────────────────

#[tokio::test]
async fn test_guest_config_unwraps_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/guest/comm/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "is_email_verify": 0, "app_description": "Seele Cloud" }
        })))
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri(), &TransportConfig::default()).unwrap();
    let config = client.guest_config().await.unwrap();
    assert_eq!(config["app_description"], "Seele Cloud");
}
