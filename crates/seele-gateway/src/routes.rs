// Telemetry passthrough and guest config handlers.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use seele_core::fetch_ping_history;
use seele_core::history::DEFAULT_HOURS;

use crate::error::ApiError;
use crate::state::GatewayState;

/// `GET /api/telemetry/nodes`: the upstream directory, untouched.
pub(crate) async fn nodes(State(state): State<GatewayState>) -> Result<Json<Value>, ApiError> {
    let body = state.telemetry().get_raw("api/nodes").await?;
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
pub(crate) struct PingParams {
    uuid: Option<String>,
    hours: Option<u32>,
}

/// `GET /api/telemetry/ping?uuid=&hours=`: history reduced to the latest
/// sample per task.
pub(crate) async fn ping(
    State(state): State<GatewayState>,
    Query(params): Query<PingParams>,
) -> Result<Json<Value>, ApiError> {
    let uuid = params
        .uuid
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("query parameter 'uuid' is required"))?;
    let hours = params.hours.unwrap_or(DEFAULT_HOURS);
    debug!(uuid, hours, "ping passthrough");

    // A dropped request future drops the fetch with it; the token only
    // satisfies the shared fetch signature.
    let history =
        fetch_ping_history(state.telemetry(), uuid, hours, &CancellationToken::new()).await?;
    Ok(Json(json!({ "data": history })))
}

/// `GET /api/guest/config`: fetched once per process, then served from
/// memory.
pub(crate) async fn guest_config(
    State(state): State<GatewayState>,
) -> Result<Json<Value>, ApiError> {
    let config = state.guest().get_or_fetch(state.backend()).await?;
    Ok(Json(json!({ "data": config })))
}
