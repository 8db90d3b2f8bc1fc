// ── Core error types ──
//
// User-facing errors from seele-core. The `From<seele_api::Error>` impl
// folds transport-layer errors into the failure taxonomy the views act on:
// transport failures, upstream status, malformed payloads, and cancellation.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Transport ────────────────────────────────────────────────────
    #[error("Cannot reach {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Upstream ─────────────────────────────────────────────────────
    #[error("Upstream returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("Malformed payload: {message}")]
    MalformedPayload { message: String },

    // ── Cancellation ─────────────────────────────────────────────────
    #[error("Request cancelled")]
    Cancelled,

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used to decide how a failure is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network / socket failure. Retried where a policy exists.
    Transport,
    /// Upstream answered with a non-success status.
    UpstreamStatus,
    /// Payload could not be decoded; the message or record is dropped.
    MalformedPayload,
    /// Caller went away. Never reported.
    Cancelled,
    /// Local misconfiguration or bug.
    Other,
}

impl CoreError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ConnectionFailed { .. } => FailureKind::Transport,
            Self::AuthenticationFailed { .. } | Self::Upstream { .. } => {
                FailureKind::UpstreamStatus
            }
            Self::MalformedPayload { .. } => FailureKind::MalformedPayload,
            Self::Cancelled => FailureKind::Cancelled,
            Self::Config { .. } | Self::Internal(_) => FailureKind::Other,
        }
    }

    /// Cancellation is silently suppressed by every view.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The upstream status code, for warnings that show it.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<seele_api::Error> for CoreError {
    fn from(err: seele_api::Error) -> Self {
        match err {
            seele_api::Error::Authentication { message } => Self::AuthenticationFailed { message },
            seele_api::Error::Transport(e) => {
                if e.is_decode() {
                    Self::MalformedPayload {
                        message: e.to_string(),
                    }
                } else {
                    Self::ConnectionFailed {
                        url: e.url().map(|u| u.to_string()).unwrap_or_default(),
                        reason: e.to_string(),
                    }
                }
            }
            seele_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("invalid URL: {e}"),
            },
            seele_api::Error::Tls(message) => Self::Config { message },
            seele_api::Error::Status { status, body } => Self::Upstream {
                status,
                message: body,
            },
            seele_api::Error::WebSocketConnect(reason) => Self::ConnectionFailed {
                url: String::new(),
                reason,
            },
            seele_api::Error::WebSocketClosed { code, reason } => Self::ConnectionFailed {
                url: String::new(),
                reason: format!("closed with code {code}: {reason}"),
            },
            seele_api::Error::Deserialization { message, .. } => {
                Self::MalformedPayload { message }
            }
        }
    }
}
