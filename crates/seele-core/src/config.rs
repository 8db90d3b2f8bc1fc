// ── Runtime connection configuration ──
//
// These types describe *how* to reach the telemetry backend and the
// subscription backend. They carry credential data and connection tuning,
// but never touch disk. The CLI constructs them and hands them in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use seele_api::{BackendClient, StreamConfig, TelemetryClient, TlsMode, TransportConfig};
use url::Url;

use crate::error::CoreError;

/// Query parameter carrying the API key on the live endpoint.
const LIVE_API_KEY_PARAM: &str = "api_key";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). Default.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

impl TlsVerification {
    pub(crate) fn to_transport(&self) -> TlsMode {
        match self {
            Self::SystemDefaults => TlsMode::System,
            Self::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            Self::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Connection parameters for the telemetry backend.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// REST base URL (directory + history), e.g. `https://status.seele.cloud`.
    pub base_url: Url,
    /// Live push endpoint, e.g. `wss://status.seele.cloud/api/clients`.
    pub live_url: Url,
    /// Bearer credential for REST, `api_key` query parameter for the stream.
    pub api_key: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout for REST calls.
    pub timeout: Duration,
    /// Heartbeat and reconnect tuning for the live stream.
    pub stream: StreamConfig,
}

impl TelemetryConfig {
    /// Config with default TLS, timeout, and stream tuning.
    pub fn new(base_url: Url, live_url: Url, api_key: SecretString) -> Self {
        Self {
            base_url,
            live_url,
            api_key,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            stream: StreamConfig::default(),
        }
    }

    /// The live URL with the API key appended as a query parameter.
    ///
    /// An `api_key` already present on the configured URL is replaced.
    pub fn live_endpoint(&self) -> Url {
        let mut url = self.live_url.clone();
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != LIVE_API_KEY_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let key = self.api_key.expose_secret();
        if kept.is_empty() && key.is_empty() {
            url.set_query(None);
            return url;
        }

        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (k, v) in &kept {
                pairs.append_pair(k, v);
            }
            if !key.is_empty() {
                pairs.append_pair(LIVE_API_KEY_PARAM, key);
            }
        }
        url
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.to_transport(),
            timeout: self.timeout,
        }
    }

    /// Authenticated REST client for the directory and history endpoints.
    pub fn client(&self) -> Result<TelemetryClient, CoreError> {
        Ok(TelemetryClient::from_api_key(
            self.base_url.as_str(),
            &self.api_key,
            &self.transport(),
        )?)
    }
}

/// Connection parameters for the subscription backend origin.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: Url,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.to_transport(),
            timeout: self.timeout,
        }
    }

    pub fn client(&self) -> Result<BackendClient, CoreError> {
        Ok(BackendClient::new(self.url.as_str(), &self.transport())?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(live: &str, key: &str) -> TelemetryConfig {
        TelemetryConfig::new(
            Url::parse("https://status.example.com").unwrap(),
            Url::parse(live).unwrap(),
            SecretString::from(key.to_string()),
        )
    }

    #[test]
    fn live_endpoint_appends_api_key() {
        let url = config("wss://status.example.com/api/clients", "k3y").live_endpoint();
        assert_eq!(url.as_str(), "wss://status.example.com/api/clients?api_key=k3y");
    }

    #[test]
    fn live_endpoint_replaces_existing_key_and_keeps_other_params() {
        let url = config(
            "wss://status.example.com/api/clients?api_key=old&lang=en",
            "new",
        )
        .live_endpoint();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("lang".to_string(), "en".to_string()),
                ("api_key".to_string(), "new".to_string())
            ]
        );
    }

    #[test]
    fn empty_key_leaves_url_bare() {
        let url = config("wss://status.example.com/api/clients", "").live_endpoint();
        assert_eq!(url.query(), None);
    }

    #[test]
    fn defaults_are_strict_tls_and_five_second_heartbeat() {
        let cfg = config("wss://status.example.com/api/clients", "k");
        assert_eq!(cfg.tls, TlsVerification::SystemDefaults);
        assert_eq!(cfg.stream.heartbeat_interval, Duration::from_secs(5));
    }
}
