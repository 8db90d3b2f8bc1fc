//! Clap derive structures for the `seele` CLI.
//!
//! Defines the command tree, global flags, and shared output types.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// seele -- realtime node telemetry for Seele Cloud
#[derive(Debug, Parser)]
#[command(
    name = "seele",
    version,
    about = "Watch Seele Cloud node telemetry from the command line",
    long_about = "Lists nodes, streams realtime traffic for every node, shows\n\
        per-node latency history, and runs the dashboard gateway that\n\
        injects telemetry credentials server-side.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "SEELE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Telemetry REST base URL (overrides env and profile)
    #[arg(long, global = true)]
    pub telemetry_url: Option<String>,

    /// Telemetry WebSocket URL (overrides env and profile)
    #[arg(long, global = true)]
    pub live_url: Option<String>,

    /// Telemetry API key (overrides env, keyring, and profile)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Subscription backend origin (overrides env and profile)
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SEELE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Custom CA certificate (PEM)
    #[arg(long, global = true)]
    pub ca_cert: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List nodes from the directory
    #[command(alias = "n")]
    Nodes,

    /// Stream realtime traffic for every node
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Show latency probes and their latest sample for one node
    #[command(alias = "h")]
    History(HistoryArgs),

    /// Print the subscription backend's guest configuration
    Guest,

    /// Run the dashboard gateway (telemetry passthrough + reverse proxy)
    Serve(ServeArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this many frames (default: run until Ctrl-C)
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Node UUID
    pub uuid: String,

    /// Lookback window in hours
    #[arg(long, default_value = "24", value_parser = clap::value_parser!(u32).range(1..))]
    pub hours: u32,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, short = 'l', env = "SEELE_LISTEN", default_value = "127.0.0.1:8787")]
    pub listen: SocketAddr,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or replace a profile
    Init(InitArgs),

    /// Show the current configuration (secrets redacted)
    Show,

    /// Set a single profile value
    Set {
        /// Profile key (telemetry_url, live_url, backend_url, api_key_env,
        /// ca_cert, insecure, timeout, heartbeat_secs)
        key: String,
        /// Value to assign
        value: String,
    },

    /// Store the API key for a profile in the system keyring
    SetKey {
        /// Profile name (default: active profile)
        #[arg(long)]
        profile: Option<String>,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Print the configuration file path
    Path,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Telemetry REST base URL (default: built-in)
    #[arg(long = "telemetry")]
    pub telemetry_url: Option<String>,

    /// Telemetry WebSocket URL (default: built-in)
    #[arg(long = "live")]
    pub live_url: Option<String>,

    /// Subscription backend origin (default: built-in)
    #[arg(long = "backend")]
    pub backend_url: Option<String>,

    /// Read the API key from this environment variable instead of storing it
    #[arg(long, conflicts_with = "plaintext")]
    pub api_key_env: Option<String>,

    /// Store the API key in the config file instead of the system keyring
    #[arg(long)]
    pub plaintext: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
