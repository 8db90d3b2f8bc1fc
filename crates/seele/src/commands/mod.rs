//! Command dispatch: resolves connection settings, runs the handler,
//! formats the result.

pub mod config_cmd;
pub mod guest;
pub mod history;
pub mod nodes;
pub mod serve;
pub mod util;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Dispatch a network-bound command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Nodes => nodes::handle(&config::telemetry_config(global)?, global).await,
        Command::Watch(args) => {
            watch::handle(&config::telemetry_config(global)?, &args, global).await
        }
        Command::History(args) => {
            history::handle(&config::telemetry_config(global)?, args, global).await
        }
        Command::Guest => guest::handle(&config::backend_config(global)?, global).await,
        Command::Serve(args) => {
            let telemetry = config::telemetry_config(global)?;
            let backend = config::backend_config(global)?;
            serve::handle(&telemetry, &backend, &args).await
        }
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are handled before dispatch".into(),
        )),
    }
}
