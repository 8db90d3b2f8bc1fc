//! Bridges the CLI's global flags into `seele-config` resolution.

use secrecy::SecretString;
use seele_config::{Config, Overrides, Sources};
use seele_core::{BackendConfig, TelemetryConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name: `--profile` / `SEELE_PROFILE`, else the
/// config's default, else `"default"`.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

fn overrides(global: &GlobalOpts) -> Overrides {
    Overrides {
        telemetry_url: global.telemetry_url.clone(),
        live_url: global.live_url.clone(),
        api_key: global.api_key.clone().map(SecretString::from),
        backend_url: global.backend_url.clone(),
        ca_cert: global.ca_cert.clone(),
        insecure: global.insecure,
        timeout: global.timeout,
    }
}

/// Telemetry connection settings from config file, env, keyring, and flags.
pub fn telemetry_config(global: &GlobalOpts) -> Result<TelemetryConfig, CliError> {
    let cfg = seele_config::load_config_or_default();
    let (name, profile) = cfg.profile(global.profile.as_deref());
    tracing::debug!(profile = %name, "resolving telemetry config");
    Ok(seele_config::resolve_telemetry(
        &profile,
        &name,
        &cfg.defaults,
        &overrides(global),
        &Sources::system(),
    )?)
}

/// Subscription backend settings. Needs no credentials.
pub fn backend_config(global: &GlobalOpts) -> Result<BackendConfig, CliError> {
    let cfg = seele_config::load_config_or_default();
    let (_, profile) = cfg.profile(global.profile.as_deref());
    Ok(seele_config::resolve_backend(
        &profile,
        &cfg.defaults,
        &overrides(global),
        &Sources::system(),
    )?)
}
