//! Live telemetry stream with heartbeat and auto-reconnect.
//!
//! Connects to the telemetry backend's push endpoint, requests a snapshot
//! with the `"get"` control message on connect and on every heartbeat tick,
//! and forwards raw text frames plus connection-state transitions through an
//! [`mpsc`] channel. A single background task owns the socket and all of its
//! timers; reconnects use capped exponential backoff.
//!
//! # Example
//!
//! ```rust,ignore
//! use seele_api::websocket::{LiveStreamHandle, StreamConfig, StreamEvent};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let url = Url::parse("wss://status.example.com/api/clients?api_key=...")?;
//! let (handle, mut events) = LiveStreamHandle::connect(url, StreamConfig::default(), CancellationToken::new());
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         StreamEvent::State(state) => println!("state: {state}"),
//!         StreamEvent::Frame(text) => println!("{} bytes", text.len()),
//!     }
//! }
//!
//! handle.shutdown().await;
//! ```

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use strum::Display;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::Error;

// ── Protocol constants ───────────────────────────────────────────────

/// Client→server control message asking for a full snapshot.
pub const REQUEST_SNAPSHOT: &str = "get";

const EVENT_CHANNEL_CAPACITY: usize = 256;

// ── ConnectionState ──────────────────────────────────────────────────

/// Lifecycle of the live connection. Exactly one is active at a time.
///
/// Within one attempt the order is `Connecting → (Connected | Error) →
/// Disconnected`, after which a new `Connecting` cycle is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

/// Everything the stream task reports to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    State(ConnectionState),
    /// One raw text message, exactly as received.
    Frame(String),
}

// ── Configuration ────────────────────────────────────────────────────

/// Exponential backoff configuration for reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 10s.
    pub max_delay: Duration,

    /// Maximum consecutive reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        }
    }
}

/// Tuning for one live stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub reconnect: ReconnectConfig,

    /// Period of the `"get"` heartbeat while connected. Default: 5s.
    pub heartbeat_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            reconnect: ReconnectConfig::default(),
            heartbeat_interval: Duration::from_secs(5),
        }
    }
}

// ── LiveStreamHandle ─────────────────────────────────────────────────

/// Owner of the background stream task.
///
/// Closing (explicitly or by drop) cancels the task; the task then sends a
/// Close frame on any open socket, drops it, and emits nothing further.
pub struct LiveStreamHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LiveStreamHandle {
    /// Spawn the stream task. Must be called from within a Tokio runtime.
    ///
    /// Returns immediately; the first connection attempt happens
    /// asynchronously and is reported as [`ConnectionState::Connecting`].
    pub fn connect(
        url: Url,
        config: StreamConfig,
        cancel: CancellationToken,
    ) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            ws_loop(url, event_tx, config, task_cancel).await;
        });

        (
            Self {
                cancel,
                task: Some(task),
            },
            event_rx,
        )
    }

    /// Signal the background task to stop. Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Whether [`close`](Self::close) has been requested.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Close and wait until the task (and its socket) are gone.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "live stream task ended abnormally");
            }
        }
    }
}

impl Drop for LiveStreamHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// How a single connection attempt ended.
enum Outcome {
    /// Cancellation was requested; stop without reporting anything.
    Cancelled,
    /// Peer closed the socket (close frame or end of stream).
    Closed,
    /// Handshake or transport failure.
    Failed { connected: bool, error: Error },
}

/// Main loop: connect → read → on drop, backoff → reconnect.
async fn ws_loop(
    url: Url,
    event_tx: mpsc::Sender<StreamEvent>,
    config: StreamConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        if !emit(&event_tx, &cancel, StreamEvent::State(ConnectionState::Connecting)).await {
            break;
        }

        match run_connection(&url, &event_tx, &cancel, config.heartbeat_interval).await {
            Outcome::Cancelled => break,
            Outcome::Closed => {
                info!("live stream closed by peer");
                attempt = 0;
            }
            Outcome::Failed { connected, error } => {
                warn!(error = %error, attempt, "live stream error");
                if connected {
                    attempt = 0;
                }
                if !emit(&event_tx, &cancel, StreamEvent::State(ConnectionState::Error)).await {
                    break;
                }
            }
        }

        if !emit(&event_tx, &cancel, StreamEvent::State(ConnectionState::Disconnected)).await {
            break;
        }

        if let Some(max) = config.reconnect.max_retries {
            if attempt >= max {
                error!(max_retries = max, "live stream reconnection limit reached, giving up");
                break;
            }
        }

        let delay = backoff_delay(attempt, &config.reconnect);
        attempt = attempt.saturating_add(1);
        info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "scheduling reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    debug!("live stream loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one connection, request a snapshot, then heartbeat and read
/// until the socket drops or cancellation is requested.
async fn run_connection(
    url: &Url,
    event_tx: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
    heartbeat: Duration,
) -> Outcome {
    info!(url = %display_url(url), "connecting live stream");

    let ws = tokio::select! {
        biased;
        () = cancel.cancelled() => return Outcome::Cancelled,
        result = tokio_tungstenite::connect_async(url.as_str()) => match result {
            Ok((ws, _response)) => ws,
            Err(e) => {
                return Outcome::Failed {
                    connected: false,
                    error: Error::WebSocketConnect(e.to_string()),
                };
            }
        }
    };

    let (mut write, mut read) = ws.split();

    if !emit(event_tx, cancel, StreamEvent::State(ConnectionState::Connected)).await {
        let _ = write.send(Message::Close(None)).await;
        return Outcome::Cancelled;
    }
    info!("live stream connected");

    if let Err(e) = write.send(Message::text(REQUEST_SNAPSHOT)).await {
        return Outcome::Failed {
            connected: true,
            error: Error::WebSocketConnect(e.to_string()),
        };
    }

    let mut ticker = tokio::time::interval_at(Instant::now() + heartbeat, heartbeat);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("closing live stream socket");
                let _ = write.send(Message::Close(None)).await;
                return Outcome::Cancelled;
            }
            _ = ticker.tick() => {
                trace!("live stream heartbeat");
                if let Err(e) = write.send(Message::text(REQUEST_SNAPSHOT)).await {
                    return Outcome::Failed {
                        connected: true,
                        error: Error::WebSocketConnect(e.to_string()),
                    };
                }
            }
            frame = read.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => text.to_owned(),
                        Err(_) => {
                            trace!(len = bytes.len(), "ignoring non-UTF-8 binary frame");
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            info!(code = %cf.code, reason = %cf.reason, "live stream close frame received");
                        } else {
                            info!("live stream close frame received (no payload)");
                        }
                        return Outcome::Closed;
                    }
                    Some(Ok(_)) => {
                        // Ping / Pong / raw frames; tungstenite answers pings itself.
                        continue;
                    }
                    Some(Err(e)) => {
                        return Outcome::Failed {
                            connected: true,
                            error: Error::WebSocketConnect(e.to_string()),
                        };
                    }
                    None => {
                        info!("live stream ended");
                        return Outcome::Closed;
                    }
                };

                if !emit(event_tx, cancel, StreamEvent::Frame(text)).await {
                    let _ = write.send(Message::Close(None)).await;
                    return Outcome::Cancelled;
                }
            }
        }
    }
}

/// Forward an event unless cancellation was requested or nobody listens.
/// Returns `false` when the loop should stop.
async fn emit(
    event_tx: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
    event: StreamEvent,
) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        sent = event_tx.send(event) => sent.is_ok(),
    }
}

/// The URL without its query string, which carries the API key.
fn display_url(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Capped exponential backoff: `min(max_delay, initial_delay * 2^attempt)`.
pub fn backoff_delay(attempt: u32, config: &ReconnectConfig) -> Duration {
    2u32.checked_pow(attempt)
        .and_then(|factor| config.initial_delay.checked_mul(factor))
        .map_or(config.max_delay, |delay| delay.min(config.max_delay))
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_stream_config() {
        let config = StreamConfig::default();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
        assert_eq!(config.reconnect.initial_delay, Duration::from_secs(1));
        assert_eq!(config.reconnect.max_delay, Duration::from_secs(10));
        assert!(config.reconnect.max_retries.is_none());
    }

    #[test]
    fn backoff_doubles_until_cap() {
        let config = ReconnectConfig::default();
        let delays: Vec<u128> = (0..6)
            .map(|k| backoff_delay(k, &config).as_millis())
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 10000, 10000]);
    }

    #[test]
    fn backoff_matches_formula_for_every_attempt() {
        let config = ReconnectConfig::default();
        for k in 1..20u32 {
            let expected = 10_000u128.min(1000 * 2u128.pow(k));
            assert_eq!(backoff_delay(k, &config).as_millis(), expected, "attempt {k}");
        }
    }

    #[test]
    fn backoff_saturates_on_huge_attempts() {
        let config = ReconnectConfig::default();
        assert_eq!(backoff_delay(u32::MAX, &config), Duration::from_secs(10));
        assert_eq!(backoff_delay(40, &config), Duration::from_secs(10));
    }

    #[test]
    fn connection_state_displays_lowercase() {
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionState::Error.to_string(), "error");
    }

    #[test]
    fn display_url_hides_api_key() {
        let url = Url::parse("wss://status.example.com/api/clients?api_key=secret").unwrap();
        let shown = display_url(&url);
        assert!(!shown.contains("secret"));
        assert!(shown.ends_with("/api/clients"));
    }

    #[tokio::test]
    async fn emit_refuses_after_cancel() {
        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(!emit(&tx, &cancel, StreamEvent::Frame("x".into())).await);
        assert!(rx.try_recv().is_err());
    }
}
