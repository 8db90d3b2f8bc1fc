// ── Domain model ──
//
// Canonical types shared by the monitor, the history view, and the
// presentation layer. Wire types live in `seele_api::models`.

pub mod node;
pub mod ping;

pub use node::{LiveFrame, NetworkStats, NodeMeta, NodeRealtimeSnapshot};
pub use ping::{LatestSample, PingHistory, PingTask, TaskWithLatest};
