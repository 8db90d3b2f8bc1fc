// seele-api: Async Rust client for the Seele Cloud telemetry backend
// (node directory, ping history, live WebSocket) and the guest config endpoint.

pub mod backend;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;
pub mod websocket;

pub use backend::BackendClient;
pub use client::TelemetryClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{ConnectionState, LiveStreamHandle, ReconnectConfig, StreamConfig, StreamEvent};
