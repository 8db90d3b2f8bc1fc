#![allow(clippy::unwrap_used)]
// Gateway routes served on an ephemeral port, upstreams mocked with wiremock.

use std::net::SocketAddr;

use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use seele_api::{BackendClient, TelemetryClient, TransportConfig};
use seele_core::GuestConfigCache;
use seele_gateway::{GatewayError, GatewayState, serve};

// ── Helpers ─────────────────────────────────────────────────────────

struct Harness {
    telemetry: MockServer,
    backend: MockServer,
    addr: SocketAddr,
    cancel: CancellationToken,
    task: JoinHandle<Result<(), GatewayError>>,
    http: reqwest::Client,
}

impl Harness {
    async fn start() -> Self {
        let telemetry = MockServer::start().await;
        let backend = MockServer::start().await;

        let key = SecretString::from("server-side-key".to_string());
        let telemetry_client =
            TelemetryClient::from_api_key(&telemetry.uri(), &key, &TransportConfig::default())
                .unwrap();
        let backend_client =
            BackendClient::new(&backend.uri(), &TransportConfig::default()).unwrap();
        // Each harness gets its own cache so tests do not share state.
        let cache: &'static GuestConfigCache = Box::leak(Box::new(GuestConfigCache::new()));
        let state = GatewayState::with_guest_cache(telemetry_client, backend_client, cache);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(serve(listener, state, cancel.clone()));

        Self {
            telemetry,
            backend,
            addr,
            cancel,
            task,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    async fn get_json(&self, path: &str) -> (u16, Value) {
        let resp = self.http.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn stop(self) {
        self.cancel.cancel();
        self.task.await.unwrap().unwrap();
    }
}

// ── Telemetry passthrough ───────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_nodes_passthrough_injects_credentials() {
    let h = Harness::start().await;
    let upstream = json!({ "data": [{ "uuid": "abc", "name": "Tokyo 01" }] });
    Mock::given(method("GET"))
        .and(path("/api/nodes"))
        .and(header("authorization", "Bearer server-side-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream.clone()))
        .expect(1)
        .mount(&h.telemetry)
        .await;

    let (status, body) = h.get_json("/api/telemetry/nodes").await;
    assert_eq!(status, 200);
    assert_eq!(body, upstream);

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_nodes_upstream_failure_is_reported() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/nodes"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
        .mount(&h.telemetry)
        .await;

    let (status, body) = h.get_json("/api/telemetry/nodes").await;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("500"));

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ping_history_is_normalized() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/records/ping"))
        .and(query_param("uuid", "abc"))
        .and(query_param("hours", "6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "tasks": [
                    { "id": 1, "name": "HKG", "interval": 60, "loss": 1.5 },
                    { "id": 2, "name": "LAX", "interval": 60, "loss": 0 }
                ],
                "records": [
                    { "task_id": 1, "time": "2026-01-01T00:00:00Z", "value": 10 },
                    { "task_id": 1, "time": "2026-01-01T00:01:00Z", "value": 20 },
                    { "task_id": 1, "time": "bogus", "value": 99 }
                ]
            }
        })))
        .mount(&h.telemetry)
        .await;

    let (status, body) = h.get_json("/api/telemetry/ping?uuid=abc&hours=6").await;
    assert_eq!(status, 200);

    let data = &body["data"];
    assert_eq!(data["lastUpdated"], "2026-01-01T00:01:00Z");
    let tasks = data["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["name"], "HKG");
    assert_eq!(tasks[0]["latest"]["value"], 20.0);
    assert_eq!(tasks[0]["latest"]["time"], "2026-01-01T00:01:00Z");
    assert!(tasks[1]["latest"].is_null());

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ping_defaults_to_24_hours_and_requires_uuid() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/records/ping"))
        .and(query_param("hours", "24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "tasks": [], "records": [] }
        })))
        .expect(1)
        .mount(&h.telemetry)
        .await;

    let (status, body) = h.get_json("/api/telemetry/ping?uuid=abc").await;
    assert_eq!(status, 200);
    assert!(body["data"]["lastUpdated"].is_null());

    let (status, body) = h.get_json("/api/telemetry/ping").await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("uuid"));

    h.stop().await;
}

// ── Guest config ────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_guest_config_is_cached() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/guest/comm/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "is_email_verify": 0, "app_description": "Seele" }
        })))
        .expect(1)
        .mount(&h.backend)
        .await;

    for _ in 0..3 {
        let (status, body) = h.get_json("/api/guest/config").await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["app_description"], "Seele");
    }

    h.stop().await;
}

// ── Reverse proxy ───────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_reverse_proxy_forwards_request_and_strips_hop_by_hop() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/passport/auth/login"))
        .and(query_param("lang", "en"))
        .and(header("x-client", "dashboard"))
        .and(body_string(r#"{"email":"a@b.c"}"#))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("x-upstream", "yes")
                .insert_header("proxy-authenticate", "Basic")
                .set_body_json(json!({ "data": { "token": "t" } })),
        )
        .expect(1)
        .mount(&h.backend)
        .await;

    let resp = h
        .http
        .post(h.url("/api/v1/passport/auth/login?lang=en"))
        .header("x-client", "dashboard")
        .header("proxy-authorization", "Basic c2VjcmV0")
        .header("content-type", "application/json")
        .body(r#"{"email":"a@b.c"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 201);
    assert_eq!(resp.headers()["x-upstream"], "yes");
    assert!(resp.headers().get("proxy-authenticate").is_none());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["token"], "t");

    let received = h.backend.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(!received[0].headers.contains_key("proxy-authorization"));

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reverse_proxy_passes_upstream_errors_through() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/info"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "forbidden" })))
        .mount(&h.backend)
        .await;

    let (status, body) = h.get_json("/api/v1/user/info").await;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "forbidden");

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reverse_proxy_never_leaves_the_backend_origin() {
    let h = Harness::start().await;
    let elsewhere = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("elsewhere"))
        .mount(&elsewhere)
        .await;

    let resp = h
        .http
        .get(h.url(&format!("/{}/steal", elsewhere.uri())))
        .header("authorization", "Bearer user-session-token")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 404);
    assert!(elsewhere.received_requests().await.unwrap().is_empty());
    let received = h.backend.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].url.path().ends_with("/steal"));

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reverse_proxy_returns_redirects_unfollowed() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/passport/auth/login"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/dashboard")
                .insert_header("set-cookie", "sid=abc; Path=/"),
        )
        .expect(1)
        .mount(&h.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_string("dashboard"))
        .expect(0)
        .mount(&h.backend)
        .await;

    let browser = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let resp = browser
        .post(h.url("/api/v1/passport/auth/login"))
        .body("email=a%40b.c")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 302);
    assert_eq!(resp.headers()["location"], "/dashboard");
    assert_eq!(resp.headers()["set-cookie"], "sid=abc; Path=/");

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_stops_accepting() {
    let h = Harness::start().await;
    let addr = h.addr;
    h.stop().await;

    let err = reqwest::Client::new()
        .get(format!("http://{addr}/api/telemetry/nodes"))
        .send()
        .await;
    assert!(err.is_err());
}
