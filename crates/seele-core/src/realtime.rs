// ── Realtime monitor ──
//
// Owns one live stream for the lifetime of a view. The stream task in
// `seele-api` handles the socket, heartbeat, and reconnects; the bridge task
// here decodes each message, one at a time, into a fresh `LiveFrame` and
// publishes it through a `watch` channel. Readers always see a complete
// frame; frames are replaced, never patched.

use std::sync::Arc;

use chrono::Utc;
use seele_api::{ConnectionState, LiveStreamHandle, StreamConfig, StreamEvent};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::TelemetryConfig;
use crate::decode::decode_frame;
use crate::model::LiveFrame;

/// Live view of every node's realtime state.
///
/// Dropping the monitor (or calling [`close`](Self::close)) cancels the
/// stream and the bridge; once cancellation is requested neither the
/// connection state nor the frame is updated again.
pub struct RealtimeMonitor {
    cancel: CancellationToken,
    stream: Option<LiveStreamHandle>,
    bridge: Option<JoinHandle<()>>,
    state_rx: watch::Receiver<ConnectionState>,
    frame_rx: watch::Receiver<Arc<LiveFrame>>,
}

impl RealtimeMonitor {
    /// Start monitoring the configured live endpoint.
    ///
    /// Must be called from within a Tokio runtime. Returns immediately; the
    /// first connection attempt happens in the background.
    pub fn start(config: &TelemetryConfig) -> Self {
        Self::start_with(
            config.live_endpoint(),
            config.stream.clone(),
            CancellationToken::new(),
        )
    }

    /// Start against an explicit URL (credentials already applied) under a
    /// caller-owned cancellation token.
    pub fn start_with(url: Url, stream_config: StreamConfig, cancel: CancellationToken) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (frame_tx, frame_rx) = watch::channel(Arc::new(LiveFrame::default()));

        let (stream, events) = LiveStreamHandle::connect(url, stream_config, cancel.clone());
        let bridge = tokio::spawn(bridge_task(events, state_tx, frame_tx, cancel.clone()));
        info!("realtime monitor started");

        Self {
            cancel,
            stream: Some(stream),
            bridge: Some(bridge),
            state_rx,
            frame_rx,
        }
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Subscribe to frame replacements.
    pub fn frames(&self) -> watch::Receiver<Arc<LiveFrame>> {
        self.frame_rx.clone()
    }

    /// Frames as a `Stream`, starting with the current one.
    pub fn frame_stream(&self) -> WatchStream<Arc<LiveFrame>> {
        WatchStream::new(self.frame_rx.clone())
    }

    /// The most recent frame (empty before the first message).
    pub fn latest(&self) -> Arc<LiveFrame> {
        Arc::clone(&self.frame_rx.borrow())
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    // ── Teardown ─────────────────────────────────────────────────────

    /// Request teardown. Idempotent; takes effect immediately for
    /// observers, the socket closes in the background.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Tear down and wait until the socket and every timer are gone.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(stream) = self.stream.take() {
            stream.shutdown().await;
        }
        if let Some(bridge) = self.bridge.take() {
            if let Err(e) = bridge.await {
                warn!(error = %e, "realtime bridge ended abnormally");
            }
        }
        debug!("realtime monitor shut down");
    }
}

impl Drop for RealtimeMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Stream events → connection state + decoded frames.
///
/// Messages are handled strictly in arrival order. A message that fails to
/// decode is logged and dropped; it changes neither the frame nor the
/// connection state.
async fn bridge_task(
    mut events: mpsc::Receiver<StreamEvent>,
    state_tx: watch::Sender<ConnectionState>,
    frame_tx: watch::Sender<Arc<LiveFrame>>,
    cancel: CancellationToken,
) {
    let mut sequence: u64 = 0;

    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match event {
            StreamEvent::State(state) => {
                if cancel.is_cancelled() {
                    break;
                }
                debug!(%state, "connection state");
                state_tx.send_replace(state);
            }
            StreamEvent::Frame(text) => match decode_frame(&text, Utc::now()) {
                Ok(mut frame) => {
                    sequence += 1;
                    frame.sequence = sequence;
                    if cancel.is_cancelled() {
                        break;
                    }
                    frame_tx.send_replace(Arc::new(frame));
                }
                Err(e) => {
                    warn!(error = %e, bytes = text.len(), "dropping malformed live message");
                }
            },
        }
    }

    debug!(frames = sequence, "realtime bridge stopped");
}
