//! Records pairing a node's transport address with its identity key.

use crate::{NetworkPublicKey, PeerId};
use serde::{Deserialize, Serialize};

pub use libp2p::Multiaddr;

/// A multiaddr and network public key for a reachable node.
#[derive(Clone, Serialize, Deserialize, Debug, Eq, PartialEq)]
pub struct NodeRecord {
    /// The network address of the node.
    pub address: Multiaddr,
    /// Network key of the node.
    pub network_key: NetworkPublicKey,
}

impl NodeRecord {
    /// The identifier derived from the record's network key.
    pub fn peer_id(&self) -> PeerId {
        PeerId::from_network_key(&self.network_key)
    }
}

impl From<(Multiaddr, NetworkPublicKey)> for NodeRecord {
    fn from(value: (Multiaddr, NetworkPublicKey)) -> Self {
        Self { address: value.0, network_key: value.1 }
    }
}

impl From<(NetworkPublicKey, Multiaddr)> for NodeRecord {
    fn from(value: (NetworkPublicKey, Multiaddr)) -> Self {
        Self { address: value.1, network_key: value.0 }
    }
}
