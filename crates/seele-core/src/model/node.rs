// ── Node domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Static node metadata from the directory. Immutable for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMeta {
    pub uuid: String,
    /// Display name; the uuid when the directory had none.
    pub name: String,
    pub region: Option<String>,
    pub group: Option<String>,
}

/// Network counters for one node, in bytes per second / bytes.
///
/// Values are whole bytes. Fractional upstream numbers are truncated toward
/// zero, so a rate below one byte per second reads as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub up: u64,
    pub down: u64,
    pub total_up: u64,
    pub total_down: u64,
}

/// Realtime state of one node as of a single push message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRealtimeSnapshot {
    pub uuid: String,
    pub is_online: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub network: NetworkStats,
}

/// The complete realtime picture decoded from one push message.
///
/// Each message produces a new frame that replaces the previous one
/// wholesale; a node missing from a message is missing from its frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveFrame {
    pub nodes: Vec<NodeRealtimeSnapshot>,
    /// Newest snapshot timestamp in the message, or the receive time.
    /// `None` only for the empty frame before the first message.
    pub updated_at: Option<DateTime<Utc>>,
    /// Number of messages decoded so far, 0 before the first.
    pub sequence: u64,
}

impl LiveFrame {
    pub fn node(&self, uuid: &str) -> Option<&NodeRealtimeSnapshot> {
        self.nodes.iter().find(|n| n.uuid == uuid)
    }

    pub fn online_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_online).count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
