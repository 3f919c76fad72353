//! The builder responsible for creating all aspects of the topology fixture.

use super::{GovernanceFixture, NodeFixture, TopologyFixture};
use rand::{rngs::StdRng, CryptoRng, RngCore, SeedableRng};
use rotor_types::{Multiaddr, NetworkKeypair, NetworkPublicKey, NodeRecord};
use std::num::NonZeroUsize;

/// The topology fixture builder for tests.
#[derive(Debug)]
pub struct TopologyFixtureBuilder<R = StdRng> {
    rng: R,
    number_of_nodes: NonZeroUsize,
    base_port: u16,
}

impl TopologyFixtureBuilder {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            number_of_nodes: NonZeroUsize::new(9).unwrap(),
            base_port: 49500,
        }
    }
}

impl Default for TopologyFixtureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> TopologyFixtureBuilder<R> {
    /// Total nodes generated, the local node included.
    pub fn number_of_nodes(mut self, number_of_nodes: NonZeroUsize) -> Self {
        self.number_of_nodes = number_of_nodes;
        self
    }

    /// First udp port used for generated node addresses.
    pub fn base_port(mut self, base_port: u16) -> Self {
        self.base_port = base_port;
        self
    }

    /// Use a provided rng. This is useful for deterministic testing.
    pub fn with_rng<RNG: RngCore + CryptoRng>(self, rng: RNG) -> TopologyFixtureBuilder<RNG> {
        TopologyFixtureBuilder {
            rng,
            number_of_nodes: self.number_of_nodes,
            base_port: self.base_port,
        }
    }
}

impl<R: RngCore + CryptoRng> TopologyFixtureBuilder<R> {
    pub fn build(mut self) -> TopologyFixture {
        let mut nodes = Vec::with_capacity(self.number_of_nodes.get());
        for i in 0..self.number_of_nodes.get() {
            let mut secret = [0u8; 32];
            self.rng.fill_bytes(&mut secret);
            let keypair = NetworkKeypair::ed25519_from_bytes(secret)
                .expect("32 bytes is a valid ed25519 secret");

            let port = self.base_port.wrapping_add(i as u16);
            let address: Multiaddr =
                format!("/ip4/127.0.0.1/udp/{port}/quic-v1").parse().expect("multiaddr parses");
            let record: NodeRecord = (address, NetworkPublicKey::from(keypair.public())).into();
            nodes.push(NodeFixture::new(keypair, record));
        }

        TopologyFixture::new(nodes, GovernanceFixture::default())
    }
}
