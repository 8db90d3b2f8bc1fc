// Wire types for the telemetry backend.
//
// These mirror the JSON the upstream actually sends and are deliberately
// lenient: individual fields that are missing or of the wrong type decode
// to `None` instead of failing the whole response. `seele-core` converts
// them into domain types and decides what to do with the gaps.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Generic `{ "data": ... }` response envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

// ── Directory ────────────────────────────────────────────────────────

/// One record from `GET /api/nodes`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawNode {
    #[serde(default, deserialize_with = "lenient_id")]
    pub uuid: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub region: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub group: Option<String>,
}

// ── Ping history ─────────────────────────────────────────────────────

/// Payload of `GET /api/records/ping`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPingHistory {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<RawPingTask>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub records: Vec<RawPingRecord>,
}

/// A configured latency probe.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPingTask {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,

    #[serde(default, deserialize_with = "lenient_u64")]
    pub interval: Option<u64>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub loss: Option<f64>,
}

/// A single latency sample. `time` stays a string; parsing is the
/// reducer's job so unparsable timestamps can be skipped individually.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPingRecord {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub task_id: Option<i64>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub time: Option<String>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: Option<f64>,
}

// ── Live stream ──────────────────────────────────────────────────────

/// Server→client push message: `{ data: { data: { uuid: metrics }, online: [uuid] } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct LiveEnvelope {
    pub data: LivePayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LivePayload {
    /// Per-node metric blobs, keyed by node uuid. Left untyped: the decoder
    /// coerces each field on its own.
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Map<String, Value>,

    /// Node uuids currently reporting.
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub online: Vec<String>,
}

// ── Lenient field decoders ───────────────────────────────────────────

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The non-empty strings of an array. Other entries are skipped and a
/// non-array value reads as empty.
fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Non-empty string, anything else is `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

/// Identifiers arrive as strings, occasionally as bare integers.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_i64())
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_u64())
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?
        .as_f64()
        .filter(|v| v.is_finite()))
}
