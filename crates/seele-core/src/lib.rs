//! Realtime node telemetry for the Seele Cloud dashboard.
//!
//! This crate owns the domain model and the client-side logic that sits
//! between `seele-api` and the presentation layer (CLI / gateway):
//!
//! - **[`RealtimeMonitor`]**: Owns the live WebSocket stream for the
//!   lifetime of one view. Decodes every push message into a fresh
//!   [`LiveFrame`] (replace, never merge) and publishes it together with the
//!   [`ConnectionState`] through `watch` channels. Closing it tears down the
//!   socket and every timer; nothing is published afterwards.
//!
//! - **Telemetry decoder** ([`decode`]): Turns one raw push message into the
//!   normalized [`NodeRealtimeSnapshot`] list.
//!
//! - **Directory** ([`directory`]): One-shot, uncached fetch of node
//!   metadata ([`NodeMeta`]), tolerant of malformed records.
//!
//! - **History** ([`history`]): Ping task definitions joined with the
//!   latest sample per task, reduced client-side from the raw series.
//!
//! - **[`Dashboard`]**: Runs the directory fetch and the monitor side by
//!   side and joins their latest outputs by node uuid.
//!
//! - **[`GuestConfigCache`]**: Process-wide memoized guest config with at
//!   most one request in flight.

pub mod config;
pub mod convert;
pub mod dashboard;
pub mod decode;
pub mod directory;
pub mod error;
pub mod guest;
pub mod history;
pub mod model;
pub mod realtime;
pub mod time;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{BackendConfig, TelemetryConfig, TlsVerification};
pub use dashboard::{Dashboard, DirectoryState, NodeRow, merge_rows};
pub use decode::{DecodeError, decode_frame};
pub use directory::{NodeDirectory, fetch_directory};
pub use error::{CoreError, FailureKind};
pub use guest::GuestConfigCache;
pub use history::{
    HistoryQuery, HistoryView, Reduction, build_history, fetch_ping_history, reduce_latest,
};
pub use realtime::RealtimeMonitor;

pub use model::{
    LatestSample, LiveFrame, NetworkStats, NodeMeta, NodeRealtimeSnapshot, PingHistory, PingTask,
    TaskWithLatest,
};

// Connection types live with the stream loop in `seele-api`.
pub use seele_api::{ConnectionState, ReconnectConfig, StreamConfig};
