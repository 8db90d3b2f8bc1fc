//! Shared helpers for command handlers.

use bytesize::ByteSize;
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use seele_core::ConnectionState;
use tokio_util::sync::CancellationToken;

/// `12.3 KB/s`
pub fn format_rate(bytes_per_sec: u64) -> String {
    format!("{}/s", ByteSize::b(bytes_per_sec))
}

pub fn format_total(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Local wall-clock time, or `-`.
pub fn format_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(
        || "-".into(),
        |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

pub fn state_badge(state: ConnectionState, color: bool) -> String {
    let label = state.to_string();
    if !color {
        return label;
    }
    match state {
        ConnectionState::Connected => label.green().to_string(),
        ConnectionState::Connecting => label.yellow().to_string(),
        ConnectionState::Disconnected => label.dimmed().to_string(),
        ConnectionState::Error => label.red().to_string(),
    }
}

pub fn online_badge(online: bool, color: bool) -> String {
    match (online, color) {
        (true, true) => "online".green().to_string(),
        (false, true) => "offline".red().to_string(),
        (true, false) => "online".into(),
        (false, false) => "offline".into(),
    }
}

/// Token cancelled on Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupt received");
            token.cancel();
        }
    });
    cancel
}
