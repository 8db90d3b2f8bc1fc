// Client for the subscription backend (the application API the dashboard
// fronts). Only the public guest config endpoint is modelled; everything
// else reaches the backend through the gateway's reverse proxy.

use tracing::debug;
use url::Url;

use crate::client::{handle_response, normalize_base_url};
use crate::error::Error;
use crate::models::DataEnvelope;
use crate::transport::TransportConfig;

const GUEST_CONFIG_PATH: &str = "api/v1/guest/comm/config";

/// HTTP client for the subscription backend origin.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    passthrough: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            passthrough: transport.build_passthrough_client()?,
            base_url: normalize_base_url(base_url)?,
        })
    }

    /// The client for modelled endpoints such as the guest config.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The client the reverse proxy forwards with. Redirects are returned,
    /// not followed.
    pub fn passthrough(&self) -> &reqwest::Client {
        &self.passthrough
    }

    /// The backend origin, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the public guest configuration blob.
    pub async fn guest_config(&self) -> Result<serde_json::Value, Error> {
        let url = self.base_url.join(GUEST_CONFIG_PATH)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let envelope: DataEnvelope<serde_json::Value> = handle_response(resp).await?;
        Ok(envelope.data)
    }
}
