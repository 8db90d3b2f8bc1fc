// ── Reverse proxy ──
//
// Every request no other route claims is forwarded to the backend origin:
// same method, path, query, and body, headers minus hop-by-hop ones. The
// response comes back the same way.

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::header::CONTENT_LENGTH;
use axum::http::{HeaderMap, HeaderName};
use axum::response::{IntoResponse, Response};
use tracing::debug;
use url::Url;

use crate::error::ApiError;
use crate::state::GatewayState;

/// Headers that describe one connection and must not be forwarded.
pub const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

/// Largest request body the proxy buffers.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub(crate) async fn reverse_proxy(State(state): State<GatewayState>, req: Request) -> Response {
    match forward(&state, req).await {
        Ok(resp) => resp,
        Err(e) => e.into_response(),
    }
}

async fn forward(state: &GatewayState, req: Request) -> Result<Response, ApiError> {
    let (parts, body) = req.into_parts();

    let backend = state.backend();
    let target = backend_target(backend.base_url(), parts.uri.path(), parts.uri.query());

    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::bad_request(format!("unreadable request body: {e}")))?;

    debug!(method = %parts.method, %target, "proxy");
    let upstream = backend
        .passthrough()
        .request(parts.method, target)
        .headers(strip_hop_by_hop(&parts.headers))
        .body(body)
        .send()
        .await
        .map_err(|e| ApiError::bad_gateway(format!("backend unreachable: {e}")))?;

    let status = upstream.status();
    let headers = strip_hop_by_hop(upstream.headers());
    let bytes = upstream
        .bytes()
        .await
        .map_err(|e| ApiError::bad_gateway(format!("backend response interrupted: {e}")))?;

    let mut resp = Response::new(Body::from(bytes));
    *resp.status_mut() = status;
    *resp.headers_mut() = headers;
    Ok(resp)
}

/// The request path appended to the backend's base path. The result always
/// has the backend's scheme, host, and port, whatever the path contains.
pub(crate) fn backend_target(base: &Url, path: &str, query: Option<&str>) -> Url {
    let mut target = base.clone();
    let joined = format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    target.set_path(&joined);
    target.set_query(query);
    target
}

/// Copy `headers` without hop-by-hop entries, anything the `Connection`
/// header names, and `Content-Length` (the body is re-framed).
pub(crate) fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let named_by_connection: Vec<HeaderName> = headers
        .get_all("connection")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::try_from(name.trim()).ok())
        .collect();

    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let hop = HOP_BY_HOP_HEADERS.contains(&name.as_str())
            || named_by_connection.contains(name)
            || *name == CONTENT_LENGTH;
        if !hop {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn target_stays_on_the_backend_origin() {
        let base = Url::parse("https://api.seele.cloud/").unwrap();

        let t = backend_target(&base, "/api/v1/user/info", Some("lang=en"));
        assert_eq!(t.as_str(), "https://api.seele.cloud/api/v1/user/info?lang=en");

        let t = backend_target(&base, "/http://evil.example/steal", None);
        assert_eq!(t.host_str(), Some("api.seele.cloud"));
        assert_eq!(t.path(), "/http://evil.example/steal");

        let t = backend_target(&base, "//evil.example/steal", None);
        assert_eq!(t.host_str(), Some("api.seele.cloud"));
    }

    #[test]
    fn target_keeps_a_base_path_prefix() {
        let base = Url::parse("https://seele.cloud/backend/").unwrap();
        let t = backend_target(&base, "/api/v1/plans", None);
        assert_eq!(t.as_str(), "https://seele.cloud/backend/api/v1/plans");
    }

    #[test]
    fn strips_standard_and_connection_listed_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("connection", HeaderValue::from_static("keep-alive, x-session"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-session", HeaderValue::from_static("abc"));
        headers.insert("host", HeaderValue::from_static("dash.seele.cloud"));
        headers.insert("content-length", HeaderValue::from_static("12"));
        headers.insert("authorization", HeaderValue::from_static("Bearer t"));
        headers.append("accept", HeaderValue::from_static("text/html"));
        headers.append("accept", HeaderValue::from_static("application/json"));

        let out = strip_hop_by_hop(&headers);
        let mut names: Vec<&str> = out.keys().map(HeaderName::as_str).collect();
        names.sort_unstable();
        assert_eq!(names, ["accept", "authorization"]);
        assert_eq!(out.get_all("accept").iter().count(), 2);
    }
}
