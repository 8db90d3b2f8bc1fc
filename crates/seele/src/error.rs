//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use seele_config::ConfigError;
use seele_core::CoreError;
use seele_gateway::GatewayError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const UPSTREAM: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach {url}")]
    #[diagnostic(
        code(seele::connection_failed),
        help(
            "{reason}\n\
             Check the URL, or override it with --telemetry-url / SEELE_TELEMETRY_URL.\n\
             Self-signed certificate? Try --insecure (-k)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("The telemetry backend rejected the API key")]
    #[diagnostic(
        code(seele::auth_failed),
        help(
            "{message}\n\
             Store a new key with: seele config set-key\n\
             Or set SEELE_TELEMETRY_API_KEY."
        )
    )]
    AuthFailed { message: String },

    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(seele::no_credentials),
        help(
            "Configure one with: seele config init\n\
             Or set SEELE_TELEMETRY_API_KEY, or pass --api-key."
        )
    )]
    NoCredentials { profile: String },

    // ── Upstream ─────────────────────────────────────────────────────
    #[error("Upstream returned HTTP {status}")]
    #[diagnostic(code(seele::upstream), help("{message}"))]
    Upstream { status: u16, message: String },

    #[error("Unexpected response from upstream: {message}")]
    #[diagnostic(code(seele::malformed_payload))]
    MalformedPayload { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(seele::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(seele::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: seele config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Failed to load configuration")]
    #[diagnostic(code(seele::config), help("{message}"))]
    Config { message: String },

    // ── Runtime ──────────────────────────────────────────────────────
    #[error("Interrupted")]
    #[diagnostic(code(seele::interrupted))]
    Interrupted,

    #[error("Internal error: {0}")]
    #[diagnostic(code(seele::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Upstream { status: 404, .. } | Self::ProfileNotFound { .. } => {
                exit_code::NOT_FOUND
            }
            Self::Upstream { .. } | Self::MalformedPayload { .. } => exit_code::UPSTREAM,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Interrupted => 130,
            Self::Config { .. } | Self::Internal(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed {
                url: if url.is_empty() {
                    "the telemetry backend".into()
                } else {
                    url
                },
                reason,
            },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Upstream { status, message } => Self::Upstream { status, message },
            CoreError::MalformedPayload { message } => Self::MalformedPayload { message },
            CoreError::Cancelled => Self::Interrupted,
            CoreError::Config { message } => Self::Validation {
                field: "configuration".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Io(e) => Self::Io(e),
            other @ (ConfigError::Serialization(_) | ConfigError::Figment(_)) => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

impl From<GatewayError> for CliError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Io(e) => Self::Io(e),
        }
    }
}
