// Shared handler state.

use std::sync::Arc;

use seele_api::{BackendClient, TelemetryClient};
use seele_core::{BackendConfig, CoreError, GuestConfigCache, TelemetryConfig};

/// Upstream clients shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct GatewayState {
    inner: Arc<Inner>,
}

struct Inner {
    telemetry: TelemetryClient,
    backend: BackendClient,
    guest: &'static GuestConfigCache,
}

impl GatewayState {
    /// State backed by the process-wide guest config cache.
    pub fn new(telemetry: TelemetryClient, backend: BackendClient) -> Self {
        Self::with_guest_cache(telemetry, backend, GuestConfigCache::global())
    }

    pub fn with_guest_cache(
        telemetry: TelemetryClient,
        backend: BackendClient,
        guest: &'static GuestConfigCache,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                telemetry,
                backend,
                guest,
            }),
        }
    }

    /// Build both upstream clients from resolved configs.
    pub fn from_configs(
        telemetry: &TelemetryConfig,
        backend: &BackendConfig,
    ) -> Result<Self, CoreError> {
        Ok(Self::new(telemetry.client()?, backend.client()?))
    }

    pub(crate) fn telemetry(&self) -> &TelemetryClient {
        &self.inner.telemetry
    }

    pub(crate) fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    pub(crate) fn guest(&self) -> &'static GuestConfigCache {
        self.inner.guest
    }
}
