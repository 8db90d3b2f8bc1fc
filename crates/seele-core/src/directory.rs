// ── Node directory ──
//
// One-shot fetch of static node metadata. Never cached: node membership
// changes operationally, so every view mount asks again.

use indexmap::IndexMap;
use seele_api::TelemetryClient;
use seele_api::models::RawNode;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::convert::node_from_raw;
use crate::error::CoreError;
use crate::model::NodeMeta;

/// Node metadata keyed by uuid, in upstream order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeDirectory {
    nodes: IndexMap<String, NodeMeta>,
}

impl NodeDirectory {
    /// Build from raw records. Records without a uuid are dropped; a
    /// repeated uuid keeps its first position and last contents.
    pub fn from_raw(records: impl IntoIterator<Item = RawNode>) -> Self {
        let mut nodes = IndexMap::new();
        for meta in records.into_iter().filter_map(node_from_raw) {
            nodes.insert(meta.uuid.clone(), meta);
        }
        Self { nodes }
    }

    pub fn get(&self, uuid: &str) -> Option<&NodeMeta> {
        self.nodes.get(uuid)
    }

    /// Display label for a uuid: the node name, or the uuid itself when the
    /// directory does not know it.
    pub fn label<'a>(&'a self, uuid: &'a str) -> &'a str {
        self.nodes.get(uuid).map_or(uuid, |m| m.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeMeta> {
        self.nodes.values()
    }
}

impl<'a> IntoIterator for &'a NodeDirectory {
    type Item = &'a NodeMeta;
    type IntoIter = indexmap::map::Values<'a, String, NodeMeta>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.values()
    }
}

impl FromIterator<NodeMeta> for NodeDirectory {
    fn from_iter<I: IntoIterator<Item = NodeMeta>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().map(|m| (m.uuid.clone(), m)).collect(),
        }
    }
}

/// Fetch the node directory once.
///
/// A non-success status surfaces as [`CoreError::Upstream`] (or
/// [`CoreError::AuthenticationFailed`] for 401); the caller decides whether
/// to warn and carry on with uuid-only labels.
pub async fn fetch_directory(
    client: &TelemetryClient,
    cancel: &CancellationToken,
) -> Result<NodeDirectory, CoreError> {
    let raw = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(CoreError::Cancelled),
        result = client.list_nodes() => result?,
    };
    let fetched = raw.len();
    let directory = NodeDirectory::from_raw(raw);
    debug!(fetched, kept = directory.len(), "fetched node directory");
    Ok(directory)
}
