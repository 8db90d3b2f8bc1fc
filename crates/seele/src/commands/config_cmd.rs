//! Config subcommand handlers.

use seele_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, InitArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

const SETTABLE_KEYS: &str =
    "telemetry_url, live_url, backend_url, api_key_env, ca_cert, insecure, timeout, heartbeat_secs";

// ── Helpers ─────────────────────────────────────────────────────────

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_api_key() -> Result<String, CliError> {
    let key = rpassword::prompt_password("API key: ").map_err(prompt_err)?;
    let key = key.trim().to_owned();
    if key.is_empty() {
        return Err(CliError::Validation {
            field: "api_key".into(),
            reason: "API key cannot be empty".into(),
        });
    }
    Ok(key)
}

fn profile_not_found(name: String, cfg: &Config) -> CliError {
    let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
    available.sort();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

fn parse_field<T: std::str::FromStr>(
    field: &str,
    value: &str,
    expected: &str,
) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be {expected}"),
    })
}

fn set_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key.replace('-', "_").as_str() {
        "telemetry_url" => profile.telemetry_url = Some(value),
        "live_url" => profile.live_url = Some(value),
        "backend_url" => profile.backend_url = Some(value),
        "api_key_env" => profile.api_key_env = Some(value),
        "ca_cert" => profile.ca_cert = Some(value.into()),
        "insecure" => {
            profile.insecure = Some(parse_field("insecure", &value, "'true' or 'false'")?);
        }
        "timeout" => {
            profile.timeout = Some(parse_field("timeout", &value, "a number (seconds)")?);
        }
        "heartbeat_secs" => {
            let secs: u64 = parse_field("heartbeat_secs", &value, "a number (seconds)")?;
            if secs == 0 {
                return Err(CliError::Validation {
                    field: "heartbeat_secs".into(),
                    reason: "must be at least 1".into(),
                });
            }
            profile.heartbeat_secs = Some(secs);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {SETTABLE_KEYS}"),
            });
        }
    }
    Ok(())
}

/// The config with every stored secret replaced by a marker.
fn redacted(mut cfg: Config) -> Config {
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some("********".into());
        }
    }
    cfg
}

fn init(args: InitArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = seele_config::load_config_or_default();
    let profile_name = global.profile.clone().unwrap_or_else(|| "default".into());

    let mut profile = Profile {
        telemetry_url: args.telemetry_url,
        live_url: args.live_url,
        backend_url: args.backend_url,
        ..Profile::default()
    };

    if let Some(env_name) = args.api_key_env {
        profile.api_key_env = Some(env_name);
    } else {
        let key = prompt_api_key()?;
        if args.plaintext {
            profile.api_key = Some(key);
        } else {
            seele_config::store_api_key(&profile_name, &key)?;
            eprintln!("✓ API key stored in system keyring");
        }
    }

    cfg.profiles.insert(profile_name.clone(), profile);
    let default_missing = cfg
        .default_profile
        .as_ref()
        .is_none_or(|name| !cfg.profiles.contains_key(name));
    if default_missing {
        cfg.default_profile = Some(profile_name.clone());
    }
    seele_config::save_config(&cfg)?;

    eprintln!(
        "✓ Profile '{profile_name}' written to {}",
        seele_config::config_path().display()
    );
    eprintln!("  Test it: seele nodes");
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init(init_args) => init(init_args, global),

        ConfigCommand::Show => {
            let cfg = redacted(seele_config::load_config()?);
            let out = output::render_single(
                global.output,
                &cfg,
                |c| serde_yaml::to_string(c).unwrap_or_else(|e| format!("error: {e}")),
                |c| {
                    let mut names: Vec<_> = c.profiles.keys().cloned().collect();
                    names.sort();
                    names.join("\n")
                },
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = seele_config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_key(profile, &key, value)?;

            seele_config::save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        ConfigCommand::SetKey { profile } => {
            let cfg = seele_config::load_config_or_default();
            let profile_name =
                profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(profile_not_found(profile_name, &cfg));
            }

            let key = prompt_api_key()?;
            seele_config::store_api_key(&profile_name, &key)?;
            eprintln!("✓ API key stored in system keyring for profile '{profile_name}'");
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = seele_config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: seele config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = seele_config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(name, &cfg));
            }

            cfg.default_profile = Some(name.clone());
            seele_config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", seele_config::config_path().display());
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_key_parses_typed_values() {
        let mut profile = Profile::default();
        set_key(&mut profile, "live-url", "ws://127.0.0.1:9/api/clients".into()).unwrap();
        set_key(&mut profile, "heartbeat_secs", "10".into()).unwrap();
        assert_eq!(profile.live_url.as_deref(), Some("ws://127.0.0.1:9/api/clients"));
        assert_eq!(profile.heartbeat_secs, Some(10));
    }

    #[test]
    fn set_key_rejects_bad_input() {
        let mut profile = Profile::default();
        assert!(set_key(&mut profile, "heartbeat_secs", "0".into()).is_err());
        assert!(set_key(&mut profile, "timeout", "soon".into()).is_err());
        assert!(set_key(&mut profile, "api_key", "secret".into()).is_err());
        assert_eq!(profile, Profile::default());
    }

    #[test]
    fn show_never_prints_stored_keys() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                api_key: Some("sk-live".into()),
                ..Profile::default()
            },
        );
        let yaml = serde_yaml::to_string(&redacted(cfg)).unwrap();
        assert!(!yaml.contains("sk-live"));
        assert!(yaml.contains("********"));
    }
}
