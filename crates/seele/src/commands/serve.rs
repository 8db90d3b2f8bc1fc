//! `seele serve`: run the dashboard gateway until Ctrl-C.

use seele_core::{BackendConfig, TelemetryConfig};
use seele_gateway::GatewayState;
use tokio::net::TcpListener;

use super::util;
use crate::cli::ServeArgs;
use crate::error::CliError;

pub async fn handle(
    telemetry: &TelemetryConfig,
    backend: &BackendConfig,
    args: &ServeArgs,
) -> Result<(), CliError> {
    let state = GatewayState::from_configs(telemetry, backend)?;
    let listener = TcpListener::bind(args.listen).await?;
    eprintln!("Gateway listening on http://{}", listener.local_addr()?);

    let cancel = util::cancel_on_ctrl_c();
    seele_gateway::serve(listener, state, cancel).await?;
    Ok(())
}
