// Async HTTP client for the telemetry backend's REST surface.
//
// Endpoints: GET /api/nodes, GET /api/records/ping
// Auth: `Authorization: Bearer <key>` default header

use reqwest::header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{DataEnvelope, RawNode, RawPingHistory};
use crate::transport::TransportConfig;

/// Maximum number of body bytes echoed back in error messages.
const BODY_PREVIEW_LEN: usize = 200;

/// Async client for the telemetry REST API.
///
/// Every request carries the bearer credential and `Accept: application/json`.
/// Nothing is cached: each call is a fresh round trip to the upstream.
#[derive(Clone)]
pub struct TelemetryClient {
    http: reqwest::Client,
    base_url: Url,
}

impl TelemetryClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API key and transport config.
    ///
    /// Injects `Authorization: Bearer <key>` as a sensitive default header.
    pub fn from_api_key(
        base_url: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid API key header value: {e}"),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
        })
    }

    /// The normalized base URL (always ends in `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the full node directory.
    ///
    /// Records that are not JSON objects are dropped; fields inside a record
    /// that have the wrong type decode to `None`.
    pub async fn list_nodes(&self) -> Result<Vec<RawNode>, Error> {
        let envelope: DataEnvelope<Vec<serde_json::Value>> = self.get("api/nodes", &[]).await?;

        let nodes = envelope
            .data
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<RawNode>(raw) {
                Ok(node) => Some(node),
                Err(e) => {
                    debug!(error = %e, "skipping malformed node record");
                    None
                }
            })
            .collect();
        Ok(nodes)
    }

    /// Fetch ping tasks and raw latency records for one node.
    pub async fn ping_records(&self, uuid: &str, hours: u32) -> Result<RawPingHistory, Error> {
        let envelope: DataEnvelope<RawPingHistory> = self
            .get(
                "api/records/ping",
                &[("uuid", uuid.to_owned()), ("hours", hours.to_string())],
            )
            .await?;
        Ok(envelope.data)
    }

    /// Fetch an endpoint and return the raw JSON body untouched.
    ///
    /// Used by the gateway's directory passthrough.
    pub async fn get_raw(&self, path: &str) -> Result<serde_json::Value, Error> {
        self.get(path, &[]).await
    }

    // ── HTTP plumbing ────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self
            .http
            .get(url)
            .query(params)
            .header(CACHE_CONTROL, "no-cache, no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;
        handle_response(resp).await
    }
}

/// Parse a success body as JSON, or turn a non-success status into
/// [`Error::Status`].
pub(crate) async fn handle_response<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: "API key rejected (HTTP 401)".into(),
        });
    }

    let body = resp.text().await?;

    if !status.is_success() {
        return Err(Error::Status {
            status: status.as_u16(),
            body: preview(&body).to_owned(),
        });
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body,
    })
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(BODY_PREVIEW_LEN);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Parse the base URL and make sure it ends with `/` so relative joins
/// append instead of replacing the last path segment.
pub(crate) fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
