// ── Ping / latency domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured latency probe target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingTask {
    pub id: i64,
    /// Probe interval in seconds.
    pub interval: u64,
    pub name: String,
    /// Packet loss percentage, 0–100.
    pub loss: f64,
}

/// Newest sample for one task in the queried window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatestSample {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// A task definition annotated with its newest sample, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskWithLatest {
    #[serde(flatten)]
    pub task: PingTask,
    pub latest: Option<LatestSample>,
}

/// Joined history view for one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingHistory {
    pub tasks: Vec<TaskWithLatest>,
    /// Newest parsable timestamp across every record, if any parsed.
    pub last_updated: Option<DateTime<Utc>>,
}

impl PingHistory {
    /// Task definitions with no latency values, for degraded views.
    pub fn without_latency(tasks: &[PingTask]) -> Self {
        Self {
            tasks: tasks
                .iter()
                .cloned()
                .map(|task| TaskWithLatest { task, latest: None })
                .collect(),
            last_updated: None,
        }
    }
}
