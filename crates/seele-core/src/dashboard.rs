// ── Dashboard ──
//
// The realtime page: a one-shot directory fetch and a live monitor run side
// by side, sharing nothing. Rows are joined by uuid whenever the caller asks
// for them, from whatever each side has published last.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use seele_api::{ConnectionState, StreamConfig, TelemetryClient};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};
use url::Url;

use crate::config::TelemetryConfig;
use crate::directory::{NodeDirectory, fetch_directory};
use crate::error::CoreError;
use crate::model::{LiveFrame, NetworkStats};
use crate::realtime::RealtimeMonitor;

/// Where the directory fetch stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryState {
    Loading,
    Ready(Arc<NodeDirectory>),
    /// The fetch failed; rows fall back to uuid labels.
    Unavailable {
        warning: String,
        status: Option<u16>,
    },
}

impl DirectoryState {
    pub fn directory(&self) -> Option<&NodeDirectory> {
        match self {
            Self::Ready(dir) => Some(dir.as_ref()),
            Self::Loading | Self::Unavailable { .. } => None,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Unavailable { warning, .. } => Some(warning.as_str()),
            Self::Loading | Self::Ready(_) => None,
        }
    }
}

/// One line of the node grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRow {
    pub uuid: String,
    /// Directory name, or the uuid when the directory has no entry.
    pub name: String,
    pub region: Option<String>,
    pub group: Option<String>,
    pub is_online: bool,
    /// `None` when the current frame has no data for this node.
    pub network: Option<NetworkStats>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Join directory metadata with a live frame.
///
/// Directory nodes come first in directory order, with their realtime data
/// when the frame has it. Frame nodes the directory does not know (or every
/// frame node, when there is no directory) follow in frame order, labelled
/// by uuid.
pub fn merge_rows(directory: Option<&NodeDirectory>, frame: &LiveFrame) -> Vec<NodeRow> {
    let mut rows = Vec::with_capacity(frame.nodes.len());

    if let Some(dir) = directory {
        for meta in dir {
            let snap = frame.node(&meta.uuid);
            rows.push(NodeRow {
                uuid: meta.uuid.clone(),
                name: meta.name.clone(),
                region: meta.region.clone(),
                group: meta.group.clone(),
                is_online: snap.is_some_and(|s| s.is_online),
                network: snap.map(|s| s.network),
                updated_at: snap.and_then(|s| s.updated_at),
            });
        }
    }

    for snap in &frame.nodes {
        if directory.is_some_and(|dir| dir.get(&snap.uuid).is_some()) {
            continue;
        }
        rows.push(NodeRow {
            uuid: snap.uuid.clone(),
            name: snap.uuid.clone(),
            region: None,
            group: None,
            is_online: snap.is_online,
            network: Some(snap.network),
            updated_at: snap.updated_at,
        });
    }

    rows
}

/// Directory fetch + live monitor for one realtime view.
///
/// Dropping the dashboard cancels both activities.
pub struct Dashboard {
    cancel: CancellationToken,
    _guard: DropGuard,
    monitor: RealtimeMonitor,
    directory_rx: watch::Receiver<DirectoryState>,
    fetch: JoinHandle<()>,
}

impl Dashboard {
    /// Open against a full telemetry config.
    pub fn open(config: &TelemetryConfig) -> Result<Self, CoreError> {
        let client = config.client()?;
        Ok(Self::open_with(
            client,
            config.live_endpoint(),
            config.stream.clone(),
        ))
    }

    /// Open with a prepared REST client and live URL. Must be called from
    /// within a Tokio runtime.
    pub fn open_with(client: TelemetryClient, live_url: Url, stream: StreamConfig) -> Self {
        let cancel = CancellationToken::new();
        let (directory_tx, directory_rx) = watch::channel(DirectoryState::Loading);

        let monitor = RealtimeMonitor::start_with(live_url, stream, cancel.child_token());
        let fetch = tokio::spawn(directory_task(client, directory_tx, cancel.clone()));

        Self {
            _guard: cancel.clone().drop_guard(),
            cancel,
            monitor,
            directory_rx,
            fetch,
        }
    }

    pub fn monitor(&self) -> &RealtimeMonitor {
        &self.monitor
    }

    /// Subscribe to directory state changes.
    pub fn directory(&self) -> watch::Receiver<DirectoryState> {
        self.directory_rx.clone()
    }

    pub fn directory_state(&self) -> DirectoryState {
        self.directory_rx.borrow().clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.monitor.state()
    }

    /// Rows joined from the latest directory state and frame.
    pub fn rows(&self) -> Vec<NodeRow> {
        let state = self.directory_state();
        merge_rows(state.directory(), &self.monitor.latest())
    }

    /// Request teardown of both activities.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Tear down and wait for the socket and the fetch to finish.
    pub async fn shutdown(self) {
        let Self {
            cancel,
            monitor,
            fetch,
            ..
        } = self;
        cancel.cancel();
        monitor.shutdown().await;
        if let Err(e) = fetch.await {
            warn!(error = %e, "directory task ended abnormally");
        }
    }
}

async fn directory_task(
    client: TelemetryClient,
    tx: watch::Sender<DirectoryState>,
    cancel: CancellationToken,
) {
    let state = match fetch_directory(&client, &cancel).await {
        Ok(dir) => DirectoryState::Ready(Arc::new(dir)),
        Err(e) if e.is_cancelled() => return,
        Err(e) => {
            warn!(error = %e, "node directory unavailable, showing uuids");
            DirectoryState::Unavailable {
                warning: e.to_string(),
                status: e.status(),
            }
        }
    };
    if cancel.is_cancelled() {
        debug!("directory fetched after teardown, discarding");
        return;
    }
    tx.send_replace(state);
}
