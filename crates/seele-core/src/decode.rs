// ── Telemetry decoder ──
//
// One push message in, one complete `LiveFrame` out. The message envelope
// must parse; everything inside a node's metric blob is coerced field by
// field (missing, non-numeric, or negative values become zero).

use chrono::{DateTime, Utc};
use seele_api::models::LiveEnvelope;
use serde_json::{Map, Value};

use crate::model::{LiveFrame, NetworkStats, NodeRealtimeSnapshot};
use crate::time::parse_timestamp_value;

/// A push message whose envelope could not be parsed. The message is
/// dropped as a whole; no partial frame is produced.
#[derive(Debug, thiserror::Error)]
#[error("malformed live message: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// Keys a metric blob may carry its own sample time under.
const TIMESTAMP_KEYS: [&str; 3] = ["updated_at", "updatedAt", "time"];

/// Decode one raw push message.
///
/// Nodes come out sorted by uuid. A node is online only when it appears in
/// the message's `online` list. The frame's `updated_at` is the newest node
/// timestamp, or `received_at` when no node carries a usable one.
/// `sequence` is left at 0 for the caller to stamp.
pub fn decode_frame(text: &str, received_at: DateTime<Utc>) -> Result<LiveFrame, DecodeError> {
    let envelope: LiveEnvelope = serde_json::from_str(text)?;
    let payload = envelope.data;

    let mut nodes: Vec<NodeRealtimeSnapshot> = payload
        .data
        .iter()
        .map(|(uuid, blob)| NodeRealtimeSnapshot {
            uuid: uuid.clone(),
            is_online: payload.online.iter().any(|id| id == uuid),
            updated_at: blob_timestamp(blob),
            network: network_stats(blob),
        })
        .collect();
    nodes.sort_by(|a, b| a.uuid.cmp(&b.uuid));

    let updated_at = nodes
        .iter()
        .filter_map(|n| n.updated_at)
        .max()
        .unwrap_or(received_at);

    Ok(LiveFrame {
        nodes,
        updated_at: Some(updated_at),
        sequence: 0,
    })
}

fn blob_timestamp(blob: &Value) -> Option<DateTime<Utc>> {
    let obj = blob.as_object()?;
    TIMESTAMP_KEYS
        .iter()
        .filter_map(|key| obj.get(*key))
        .find_map(parse_timestamp_value)
}

fn network_stats(blob: &Value) -> NetworkStats {
    let Some(network) = blob.get("network").and_then(Value::as_object) else {
        return NetworkStats::default();
    };
    NetworkStats {
        up: counter(network, &["up"]),
        down: counter(network, &["down"]),
        total_up: counter(network, &["totalUp", "total_up"]),
        total_down: counter(network, &["totalDown", "total_down"]),
    }
}

/// First present key wins; its value is coerced to a non-negative integer.
fn counter(obj: &Map<String, Value>, keys: &[&str]) -> u64 {
    keys.iter()
        .find_map(|key| obj.get(*key))
        .map_or(0, coerce_u64)
}

fn coerce_u64(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(float_to_u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map_or(0, float_to_u64),
        _ => 0,
    }
}

#[allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn float_to_u64(v: f64) -> u64 {
    // Saturating cast: NaN → 0, negatives → 0, overflow → u64::MAX.
    if v.is_finite() && v > 0.0 { v as u64 } else { 0 }
}
