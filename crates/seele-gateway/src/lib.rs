//! HTTP gateway in front of the telemetry and subscription backends.
//!
//! Browsers never see the telemetry API key: the two passthrough routes
//! inject it server-side. Everything else is reverse-proxied to the
//! subscription backend origin with hop-by-hop headers removed.
//!
//! | Route                       | Behaviour |
//! |-----------------------------|-----------|
//! | `GET /api/telemetry/nodes`  | Upstream node directory, verbatim |
//! | `GET /api/telemetry/ping`   | Ping history reduced to `{ data: { tasks, lastUpdated } }` |
//! | `GET /api/guest/config`     | Process-wide cached guest config |
//! | anything else               | Reverse proxy to the backend origin |

mod error;
mod proxy;
mod routes;
mod state;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{ApiError, GatewayError};
pub use proxy::HOP_BY_HOP_HEADERS;
pub use state::GatewayState;

/// Build the gateway router.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/telemetry/nodes", get(routes::nodes))
        .route("/api/telemetry/ping", get(routes::ping))
        .route("/api/guest/config", get(routes::guest_config))
        .fallback(proxy::reverse_proxy)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `cancel` fires, then drain in-flight requests and return.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), GatewayError> {
    let addr = listener.local_addr()?;
    info!(%addr, "gateway listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    info!("gateway stopped");
    Ok(())
}
