// ── Timestamp parsing ──
//
// The telemetry backend is not consistent about time formats: RFC 3339
// strings from the Go side, naive `YYYY-MM-DD HH:MM:SS` from SQLite-backed
// records, and epoch numbers inside some metric blobs. Anything else is
// treated as unparsable and the caller skips it.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Epoch values above this are taken to be milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Parse a textual timestamp (RFC 3339 or naive UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Parse a JSON timestamp: a string as above, or an epoch number
/// (seconds or milliseconds).
pub fn parse_timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => {
            let epoch = n.as_i64()?;
            if epoch <= 0 {
                return None;
            }
            if epoch >= EPOCH_MILLIS_THRESHOLD {
                Utc.timestamp_millis_opt(epoch).single()
            } else {
                Utc.timestamp_opt(epoch, 0).single()
            }
        }
        _ => None,
    }
}
