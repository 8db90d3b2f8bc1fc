// ── Wire → domain conversion ──
//
// Raw records from `seele_api::models` become domain types here. Records
// that cannot identify themselves are dropped, never fatal.

use seele_api::models::{RawNode, RawPingTask};

use crate::model::{NodeMeta, PingTask};

/// Directory record → [`NodeMeta`]. `None` when the record has no uuid.
pub fn node_from_raw(raw: RawNode) -> Option<NodeMeta> {
    let uuid = raw.uuid?.trim().to_owned();
    if uuid.is_empty() {
        return None;
    }
    let name = raw
        .name
        .map(|n| n.trim().to_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| uuid.clone());

    Some(NodeMeta {
        uuid,
        name,
        region: raw.region,
        group: raw.group,
    })
}

/// Task definition → [`PingTask`]. `None` when the task has no id.
pub fn task_from_raw(raw: RawPingTask) -> Option<PingTask> {
    let id = raw.id?;
    Some(PingTask {
        id,
        interval: raw.interval.unwrap_or_default(),
        name: raw.name.unwrap_or_else(|| format!("task {id}")),
        loss: raw.loss.unwrap_or_default().clamp(0.0, 100.0),
    })
}
