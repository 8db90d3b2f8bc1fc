//! Shared configuration for the Seele CLI and gateway.
//!
//! TOML profiles, environment overrides, credential resolution
//! (env + keyring + plaintext), hardcoded fallback endpoints, and
//! translation to `seele_core::{TelemetryConfig, BackendConfig}`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use seele_core::{BackendConfig, StreamConfig, TelemetryConfig, TlsVerification};

// ── Fallback endpoints ──────────────────────────────────────────────

pub const DEFAULT_TELEMETRY_URL: &str = "https://status.seele.cloud";
pub const DEFAULT_LIVE_URL: &str = "wss://status.seele.cloud/api/clients";
pub const DEFAULT_BACKEND_URL: &str = "https://api.seele.cloud";

// ── Environment variables ───────────────────────────────────────────

pub const ENV_TELEMETRY_URL: &str = "SEELE_TELEMETRY_URL";
pub const ENV_TELEMETRY_WS_URL: &str = "SEELE_TELEMETRY_WS_URL";
pub const ENV_TELEMETRY_API_KEY: &str = "SEELE_TELEMETRY_API_KEY";
pub const ENV_BACKEND_URL: &str = "SEELE_BACKEND_URL";

/// Keyring service name; the user is `<profile>/api-key`.
pub const KEYRING_SERVICE: &str = "seele";

const ENV_PREFIX: &str = "SEELE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named telemetry profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named telemetry profile. Every field is optional; unset endpoints
/// fall back to the environment and then to the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// REST base URL of the telemetry backend.
    pub telemetry_url: Option<String>,

    /// WebSocket push endpoint (the API key is appended as a query param).
    pub live_url: Option<String>,

    /// API key (plaintext, prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Subscription backend origin for the gateway's reverse proxy.
    pub backend_url: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,

    /// Override the live heartbeat period (seconds).
    pub heartbeat_secs: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("cloud", "seele", "seele").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("seele");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment. A missing file is not an
/// error; defaults apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["telemetry_url", "telemetry_ws_url", "telemetry_api_key", "backend_url"])
                .split("__"),
        );

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "loaded config");
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Resolution ──────────────────────────────────────────────────────

/// Values that beat the environment and the profile (CLI flags).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub telemetry_url: Option<String>,
    pub live_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub backend_url: Option<String>,
    pub ca_cert: Option<PathBuf>,
    pub insecure: bool,
    pub timeout: Option<u64>,
}

/// Where secrets and environment values are looked up. Swappable so the
/// resolution order can be exercised without touching the process
/// environment or the system keyring.
pub struct Sources<'a> {
    pub env: &'a dyn Fn(&str) -> Option<String>,
    pub keyring: &'a dyn Fn(&str) -> Option<String>,
}

impl Sources<'static> {
    /// The process environment and the system keyring.
    pub fn system() -> Self {
        Sources {
            env: &system_env,
            keyring: &system_keyring,
        }
    }
}

fn system_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn system_keyring(user: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, user)
        .and_then(|entry| entry.get_password())
        .ok()
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/api-key")
}

/// Store an API key in the system keyring for `profile_name`.
pub fn store_api_key(profile_name: &str, key: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))
        .and_then(|entry| entry.set_password(key))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

/// Resolve the API key: flag → `SEELE_TELEMETRY_API_KEY` → the profile's
/// `api_key_env` → keyring → plaintext.
pub fn resolve_api_key(
    profile: &Profile,
    profile_name: &str,
    overrides: &Overrides,
    sources: &Sources<'_>,
) -> Result<SecretString, ConfigError> {
    if let Some(key) = &overrides.api_key {
        return Ok(key.clone());
    }

    if let Some(val) = (sources.env)(ENV_TELEMETRY_API_KEY) {
        return Ok(SecretString::from(val));
    }

    if let Some(env_name) = &profile.api_key_env {
        if let Some(val) = (sources.env)(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Some(secret) = (sources.keyring)(&keyring_user(profile_name)) {
        return Ok(SecretString::from(secret));
    }

    if let Some(key) = &profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Pick the first of flag, env var, profile value, fallback; then parse.
fn resolve_url(
    field: &str,
    flag: Option<&str>,
    env_name: &str,
    profile_value: Option<&str>,
    fallback: &str,
    sources: &Sources<'_>,
) -> Result<Url, ConfigError> {
    let env_value = (sources.env)(env_name);
    let raw = flag
        .or(env_value.as_deref())
        .or(profile_value)
        .unwrap_or(fallback);
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

fn tls_for(profile: &Profile, defaults: &Defaults, overrides: &Overrides) -> TlsVerification {
    if overrides.insecure || profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ca) = overrides.ca_cert.as_ref().or(profile.ca_cert.as_ref()) {
        TlsVerification::CustomCa(ca.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

fn timeout_for(profile: &Profile, defaults: &Defaults, overrides: &Overrides) -> Duration {
    Duration::from_secs(
        overrides
            .timeout
            .or(profile.timeout)
            .unwrap_or(defaults.timeout),
    )
}

/// Build the telemetry connection config for one profile.
pub fn resolve_telemetry(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    overrides: &Overrides,
    sources: &Sources<'_>,
) -> Result<TelemetryConfig, ConfigError> {
    let base_url = resolve_url(
        "telemetry_url",
        overrides.telemetry_url.as_deref(),
        ENV_TELEMETRY_URL,
        profile.telemetry_url.as_deref(),
        DEFAULT_TELEMETRY_URL,
        sources,
    )?;
    let live_url = resolve_url(
        "live_url",
        overrides.live_url.as_deref(),
        ENV_TELEMETRY_WS_URL,
        profile.live_url.as_deref(),
        DEFAULT_LIVE_URL,
        sources,
    )?;
    if !matches!(live_url.scheme(), "ws" | "wss") {
        return Err(ConfigError::Validation {
            field: "live_url".into(),
            reason: format!("expected a ws:// or wss:// URL, got '{live_url}'"),
        });
    }

    let api_key = resolve_api_key(profile, profile_name, overrides, sources)?;

    let mut stream = StreamConfig::default();
    if let Some(secs) = profile.heartbeat_secs {
        if secs == 0 {
            return Err(ConfigError::Validation {
                field: "heartbeat_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        stream.heartbeat_interval = Duration::from_secs(secs);
    }

    Ok(TelemetryConfig {
        base_url,
        live_url,
        api_key,
        tls: tls_for(profile, defaults, overrides),
        timeout: timeout_for(profile, defaults, overrides),
        stream,
    })
}

/// Build the subscription backend config for one profile.
pub fn resolve_backend(
    profile: &Profile,
    defaults: &Defaults,
    overrides: &Overrides,
    sources: &Sources<'_>,
) -> Result<BackendConfig, ConfigError> {
    let url = resolve_url(
        "backend_url",
        overrides.backend_url.as_deref(),
        ENV_BACKEND_URL,
        profile.backend_url.as_deref(),
        DEFAULT_BACKEND_URL,
        sources,
    )?;
    Ok(BackendConfig {
        url,
        tls: tls_for(profile, defaults, overrides),
        timeout: timeout_for(profile, defaults, overrides),
    })
}

impl Config {
    /// The profile to use: explicit name, else `default_profile`, else
    /// `"default"`. A missing profile resolves to an empty one so env vars
    /// and built-in defaults still apply.
    pub fn profile(&self, name: Option<&str>) -> (String, Profile) {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());
        let profile = self.profiles.get(&name).cloned().unwrap_or_default();
        (name, profile)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn sources<'a>(
        env: &'a dyn Fn(&str) -> Option<String>,
        keyring: &'a dyn Fn(&str) -> Option<String>,
    ) -> Sources<'a> {
        Sources { env, keyring }
    }

    fn none(_: &str) -> Option<String> {
        None
    }

    fn with_key() -> Profile {
        Profile {
            api_key: Some("plain".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn empty_profile_uses_built_in_endpoints() {
        let src = sources(&none, &none);
        let cfg = resolve_telemetry(
            &with_key(),
            "default",
            &Defaults::default(),
            &Overrides::default(),
            &src,
        )
        .unwrap();
        assert_eq!(cfg.base_url.as_str(), "https://status.seele.cloud/");
        assert_eq!(cfg.live_url.as_str(), DEFAULT_LIVE_URL);
        assert_eq!(cfg.tls, TlsVerification::SystemDefaults);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.stream.heartbeat_interval, Duration::from_secs(5));
    }

    #[test]
    fn flag_beats_env_beats_profile() {
        let env = |name: &str| match name {
            ENV_TELEMETRY_URL => Some("https://env.example".to_string()),
            ENV_TELEMETRY_WS_URL => Some("wss://env.example/ws".to_string()),
            _ => None,
        };
        let src = sources(&env, &none);
        let profile = Profile {
            telemetry_url: Some("https://profile.example".into()),
            live_url: Some("wss://profile.example/ws".into()),
            ..with_key()
        };
        let overrides = Overrides {
            telemetry_url: Some("https://flag.example".into()),
            ..Overrides::default()
        };

        let cfg =
            resolve_telemetry(&profile, "p", &Defaults::default(), &overrides, &src).unwrap();
        assert_eq!(cfg.base_url.host_str(), Some("flag.example"));
        assert_eq!(cfg.live_url.host_str(), Some("env.example"));
    }

    #[test]
    fn api_key_chain_order() {
        let profile = Profile {
            api_key_env: Some("MY_KEY".into()),
            ..with_key()
        };
        let keyring = |user: &str| (user == "p/api-key").then(|| "from-keyring".to_string());
        let no_overrides = Overrides::default();

        let src = sources(&none, &keyring);
        let key = resolve_api_key(&profile, "p", &no_overrides, &src).unwrap();
        assert_eq!(key.expose_secret(), "from-keyring");

        let env = |name: &str| (name == "MY_KEY").then(|| "from-profile-env".to_string());
        let src = sources(&env, &keyring);
        let key = resolve_api_key(&profile, "p", &no_overrides, &src).unwrap();
        assert_eq!(key.expose_secret(), "from-profile-env");

        let env = |name: &str| (name == ENV_TELEMETRY_API_KEY).then(|| "from-env".to_string());
        let src = sources(&env, &keyring);
        let key = resolve_api_key(&profile, "p", &no_overrides, &src).unwrap();
        assert_eq!(key.expose_secret(), "from-env");

        let flag = Overrides {
            api_key: Some(SecretString::from("from-flag".to_string())),
            ..Overrides::default()
        };
        let key = resolve_api_key(&profile, "p", &flag, &src).unwrap();
        assert_eq!(key.expose_secret(), "from-flag");

        let src = sources(&none, &none);
        let key = resolve_api_key(&profile, "p", &no_overrides, &src).unwrap();
        assert_eq!(key.expose_secret(), "plain");
    }

    #[test]
    fn missing_key_is_an_error() {
        let src = sources(&none, &none);
        let err = resolve_api_key(&Profile::default(), "work", &Overrides::default(), &src)
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == "work"));
    }

    #[test]
    fn live_url_must_be_websocket() {
        let src = sources(&none, &none);
        let profile = Profile {
            live_url: Some("https://status.seele.cloud/api/clients".into()),
            ..with_key()
        };
        let err = resolve_telemetry(&profile, "p", &Defaults::default(), &Overrides::default(), &src)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "live_url"));
    }

    #[test]
    fn tls_and_timeout_precedence() {
        let src = sources(&none, &none);
        let profile = Profile {
            ca_cert: Some(PathBuf::from("/etc/seele/ca.pem")),
            timeout: Some(5),
            ..with_key()
        };
        let backend = resolve_backend(&profile, &Defaults::default(), &Overrides::default(), &src)
            .unwrap();
        assert_eq!(backend.url.as_str(), "https://api.seele.cloud/");
        assert_eq!(
            backend.tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/seele/ca.pem"))
        );
        assert_eq!(backend.timeout, Duration::from_secs(5));

        let insecure = Overrides {
            insecure: true,
            timeout: Some(1),
            ..Overrides::default()
        };
        let backend = resolve_backend(&profile, &Defaults::default(), &insecure, &src).unwrap();
        assert_eq!(backend.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(backend.timeout, Duration::from_secs(1));
    }

    #[test]
    fn zero_heartbeat_is_rejected() {
        let src = sources(&none, &none);
        let profile = Profile {
            heartbeat_secs: Some(0),
            ..with_key()
        };
        assert!(
            resolve_telemetry(&profile, "p", &Defaults::default(), &Overrides::default(), &src)
                .is_err()
        );
    }

    #[test]
    fn save_then_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                telemetry_url: Some("https://status.home.lan".into()),
                heartbeat_secs: Some(10),
                ..Profile::default()
            },
        );
        cfg.default_profile = Some("home".into());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.default_profile.as_deref(), Some("home"));
        let (name, profile) = loaded.profile(None);
        assert_eq!(name, "home");
        assert_eq!(profile.heartbeat_secs, Some(10));
    }

    #[test]
    fn missing_file_yields_defaults_and_unknown_profile_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.defaults.output, "table");
        let (name, profile) = cfg.profile(Some("nope"));
        assert_eq!(name, "nope");
        assert_eq!(profile, Profile::default());
    }
}
