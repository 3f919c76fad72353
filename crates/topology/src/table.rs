//! Address book mapping peer identities to dialable records.

use crate::traits::NodeDirectory;
use parking_lot::RwLock;
use rotor_types::{NodeRecord, PeerId};
use std::collections::BTreeMap;
use tracing::trace;

/// Known nodes and their transport records, keyed by identity.
///
/// The table holds the local node's own record separately so the local
/// identity is always resolvable even when the book is empty.
#[derive(Debug)]
pub struct NodeTable {
    /// The local node's record.
    local: NodeRecord,
    /// Identity derived from the local record.
    local_id: PeerId,
    /// Records for remote nodes.
    nodes: RwLock<BTreeMap<PeerId, NodeRecord>>,
}

impl NodeTable {
    /// Create a table seeded with the local node's record.
    pub fn new(local: NodeRecord) -> Self {
        let local_id = local.peer_id();
        Self { local, local_id, nodes: RwLock::new(BTreeMap::new()) }
    }

    /// Insert or refresh a remote node's record. Returns its identity.
    pub fn insert(&self, record: NodeRecord) -> PeerId {
        let peer = record.peer_id();
        trace!(target: "topology::table", %peer, address = %record.address, "node record inserted");
        self.nodes.write().insert(peer.clone(), record);
        peer
    }

    /// The record for `peer`, if known.
    pub fn get(&self, peer: &PeerId) -> Option<NodeRecord> {
        self.nodes.read().get(peer).cloned()
    }

    /// Drop the record for `peer`.
    pub fn remove(&self, peer: &PeerId) -> Option<NodeRecord> {
        let removed = self.nodes.write().remove(peer);
        if removed.is_some() {
            trace!(target: "topology::table", %peer, "node record removed");
        }
        removed
    }

    /// The local node's record.
    pub fn local_record(&self) -> &NodeRecord {
        &self.local
    }

    /// Number of remote records.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// True when no remote records are known.
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}

impl NodeDirectory for NodeTable {
    fn local_identity(&self) -> PeerId {
        self.local_id.clone()
    }
}
