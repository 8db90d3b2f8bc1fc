// ── Guest config cache ──
//
// The subscription backend's public config is fetched at most once per
// process. Concurrent callers share one in-flight request; a failed request
// is not remembered, so the next caller tries again.

use std::sync::{Arc, LazyLock};

use seele_api::BackendClient;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::CoreError;

static GLOBAL: LazyLock<GuestConfigCache> = LazyLock::new(GuestConfigCache::default);

/// Memoized `GET /api/v1/guest/comm/config` payload.
#[derive(Debug, Default)]
pub struct GuestConfigCache {
    cell: OnceCell<Arc<Value>>,
}

impl GuestConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide instance.
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Return the cached config, fetching it first if nobody has yet.
    pub async fn get_or_fetch(&self, backend: &BackendClient) -> Result<Arc<Value>, CoreError> {
        let value = self
            .cell
            .get_or_try_init(|| async {
                debug!(backend = %backend.base_url(), "fetching guest config");
                let value = backend.guest_config().await?;
                Ok::<_, CoreError>(Arc::new(value))
            })
            .await?;
        Ok(Arc::clone(value))
    }

    /// The cached config, without fetching.
    pub fn cached(&self) -> Option<Arc<Value>> {
        self.cell.get().cloned()
    }
}
