// ── Ping history ──
//
// Task definitions joined with the newest sample per task. The upstream
// returns the raw series; the reduction to "latest per task" happens here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use seele_api::TelemetryClient;
use seele_api::models::{RawPingHistory, RawPingRecord};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::convert::task_from_raw;
use crate::error::CoreError;
use crate::model::{LatestSample, PingHistory, PingTask, TaskWithLatest};
use crate::time::parse_timestamp;

/// Default lookback window.
pub const DEFAULT_HOURS: u32 = 24;

/// Result of scanning a record series once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reduction {
    /// Newest sample per task id.
    pub latest: HashMap<i64, LatestSample>,
    /// Newest parsable timestamp across all records.
    pub last_updated: Option<DateTime<Utc>>,
}

/// Reduce a record series to the newest sample per task.
///
/// Records are scanned in order and a record replaces the current latest
/// when its time is greater than *or equal to* it, so the last of several
/// equal timestamps wins. Records whose time does not parse are skipped
/// entirely, for both the per-task result and `last_updated`. Records with
/// a time but no task id or value still count toward `last_updated`.
pub fn reduce_latest(records: &[RawPingRecord]) -> Reduction {
    let mut out = Reduction::default();

    for record in records {
        let Some(time) = record.time.as_deref().and_then(parse_timestamp) else {
            continue;
        };

        if out.last_updated.is_none_or(|newest| time > newest) {
            out.last_updated = Some(time);
        }

        let (Some(task_id), Some(value)) = (record.task_id, record.value) else {
            continue;
        };
        let replace = out
            .latest
            .get(&task_id)
            .is_none_or(|current| time >= current.time);
        if replace {
            out.latest.insert(task_id, LatestSample { time, value });
        }
    }

    out
}

/// Join task definitions with their reduced latest samples.
///
/// Task order follows the upstream; tasks without an id are dropped.
pub fn build_history(raw: RawPingHistory) -> PingHistory {
    let Reduction {
        mut latest,
        last_updated,
    } = reduce_latest(&raw.records);

    let tasks = raw
        .tasks
        .into_iter()
        .filter_map(task_from_raw)
        .map(|task| TaskWithLatest {
            latest: latest.remove(&task.id),
            task,
        })
        .collect();

    PingHistory {
        tasks,
        last_updated,
    }
}

/// Fetch and reduce the ping history for one node.
///
/// Returns [`CoreError::Cancelled`] as soon as `cancel` fires; the in-flight
/// request is dropped.
pub async fn fetch_ping_history(
    client: &TelemetryClient,
    uuid: &str,
    hours: u32,
    cancel: &CancellationToken,
) -> Result<PingHistory, CoreError> {
    let raw = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(CoreError::Cancelled),
        result = client.ping_records(uuid, hours) => result?,
    };
    debug!(
        uuid,
        hours,
        tasks = raw.tasks.len(),
        records = raw.records.len(),
        "fetched ping history"
    );
    Ok(build_history(raw))
}

// ── HistoryQuery ─────────────────────────────────────────────────────

/// What a detail view renders after one refresh.
#[derive(Debug)]
pub struct HistoryView {
    pub history: PingHistory,
    /// Set when the refresh failed; `history` then holds the last known
    /// task definitions without latency values.
    pub error: Option<CoreError>,
}

/// Repeated history lookups for one node, remembering the last task
/// definitions so a failed refresh degrades instead of blanking.
pub struct HistoryQuery {
    client: TelemetryClient,
    uuid: String,
    hours: u32,
    known_tasks: Vec<PingTask>,
}

impl HistoryQuery {
    pub fn new(client: TelemetryClient, uuid: impl Into<String>, hours: u32) -> Self {
        Self {
            client,
            uuid: uuid.into(),
            hours,
            known_tasks: Vec::new(),
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    /// Change the lookback window for subsequent refreshes.
    pub fn set_hours(&mut self, hours: u32) {
        self.hours = hours;
    }

    /// Fetch once. Only cancellation is an `Err`; every other failure is
    /// folded into [`HistoryView::error`].
    pub async fn refresh(&mut self, cancel: &CancellationToken) -> Result<HistoryView, CoreError> {
        match fetch_ping_history(&self.client, &self.uuid, self.hours, cancel).await {
            Ok(history) => {
                self.known_tasks = history.tasks.iter().map(|t| t.task.clone()).collect();
                Ok(HistoryView {
                    history,
                    error: None,
                })
            }
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                warn!(uuid = %self.uuid, error = %e, "ping history unavailable");
                Ok(HistoryView {
                    history: PingHistory::without_latency(&self.known_tasks),
                    error: Some(e),
                })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use seele_api::models::RawPingTask;

    fn rec(task_id: i64, time: &str, value: f64) -> RawPingRecord {
        RawPingRecord {
            task_id: Some(task_id),
            time: Some(time.to_owned()),
            value: Some(value),
        }
    }

    fn ts(s: &str) -> DateTime<Utc> {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn newest_record_wins() {
        let r = reduce_latest(&[
            rec(1, "2026-01-01T00:00:00Z", 10.0),
            rec(1, "2026-01-01T00:01:00Z", 20.0),
        ]);
        let latest = r.latest[&1];
        assert_eq!(latest.time, ts("2026-01-01T00:01:00Z"));
        assert!((latest.value - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn order_of_records_does_not_matter() {
        let r = reduce_latest(&[
            rec(1, "2026-01-01T00:01:00Z", 20.0),
            rec(1, "2026-01-01T00:00:00Z", 10.0),
        ]);
        assert!((r.latest[&1].value - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ties_go_to_the_last_seen_record() {
        let r = reduce_latest(&[
            rec(3, "2026-01-01T00:00:00Z", 1.0),
            rec(3, "2026-01-01 00:00:00", 2.0),
        ]);
        assert!((r.latest[&3].value - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unparsable_time_is_ignored_everywhere() {
        let r = reduce_latest(&[
            rec(1, "2026-01-01T00:00:00Z", 10.0),
            rec(1, "garbage", 99.0),
            rec(2, "", 5.0),
        ]);
        assert!((r.latest[&1].value - 10.0).abs() < f64::EPSILON);
        assert!(!r.latest.contains_key(&2));
        assert_eq!(r.last_updated, Some(ts("2026-01-01T00:00:00Z")));
    }

    #[test]
    fn last_updated_spans_all_tasks() {
        let r = reduce_latest(&[
            rec(1, "2026-01-01T00:00:00Z", 1.0),
            rec(2, "2026-01-02T00:00:00Z", 1.0),
        ]);
        assert_eq!(r.last_updated, Some(ts("2026-01-02T00:00:00Z")));
        assert_eq!(reduce_latest(&[]).last_updated, None);
    }

    #[test]
    fn history_joins_tasks_and_keeps_empty_ones() {
        let raw = RawPingHistory {
            tasks: vec![
                RawPingTask {
                    id: Some(1),
                    name: Some("HKG".into()),
                    interval: Some(60),
                    loss: Some(0.5),
                },
                RawPingTask {
                    id: Some(2),
                    name: Some("LAX".into()),
                    ..RawPingTask::default()
                },
            ],
            records: vec![rec(1, "2026-01-01T00:00:00Z", 31.5)],
        };
        let history = build_history(raw);
        assert_eq!(history.tasks.len(), 2);
        assert_eq!(history.tasks[0].task.name, "HKG");
        assert!(history.tasks[0].latest.is_some());
        assert!(history.tasks[1].latest.is_none());
    }
}
