//! Configuration for network variables.

/// The container for all network configurations.
#[derive(Debug, Default)]
pub struct NetworkConfig {
    /// The configurations for committee-driven connection management.
    topology_config: TopologyConfig,
}

impl NetworkConfig {
    /// Return a reference to the [TopologyConfig].
    pub fn topology_config(&self) -> &TopologyConfig {
        &self.topology_config
    }
}

/// Configuration for committee-driven connection management.
#[derive(Debug, Clone, Copy)]
pub struct TopologyConfig {
    /// Maximum number of peers sampled from a committee the local node does not belong to.
    /// Committees the node belongs to are connected in full and ignore this bound.
    pub group_conn_peers: usize,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self { group_conn_peers: 3 }
    }
}
