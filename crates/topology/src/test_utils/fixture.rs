//! Fixtures for driving the topology manager in tests.

use super::TopologyFixtureBuilder;
use crate::{Governance, GovernanceError, NodeTable};
use parking_lot::RwLock;
use rotor_types::{ChainId, NetworkKeypair, NodeRecord, PeerId, Round};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

/// A generated node: its keypair and its dialable record.
#[derive(Debug)]
pub struct NodeFixture {
    keypair: NetworkKeypair,
    record: NodeRecord,
}

impl NodeFixture {
    pub(crate) fn new(keypair: NetworkKeypair, record: NodeRecord) -> Self {
        Self { keypair, record }
    }

    pub fn keypair(&self) -> &NetworkKeypair {
        &self.keypair
    }

    pub fn record(&self) -> &NodeRecord {
        &self.record
    }

    pub fn peer_id(&self) -> PeerId {
        self.record.peer_id()
    }
}

/// A set of generated nodes plus a programmable governance stub.
///
/// Node index zero plays the local node. Committees are programmed per round
/// out of node indexes through [`Self::insert_round`].
#[derive(Debug)]
pub struct TopologyFixture {
    nodes: Vec<NodeFixture>,
    governance: GovernanceFixture,
}

impl TopologyFixture {
    pub fn builder() -> TopologyFixtureBuilder {
        TopologyFixtureBuilder::new()
    }

    pub(crate) fn new(nodes: Vec<NodeFixture>, governance: GovernanceFixture) -> Self {
        Self { nodes, governance }
    }

    /// The node playing the local role.
    pub fn local(&self) -> &NodeFixture {
        &self.nodes[0]
    }

    pub fn node(&self, index: usize) -> &NodeFixture {
        &self.nodes[index]
    }

    pub fn number_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn peer(&self, index: usize) -> PeerId {
        self.nodes[index].peer_id()
    }

    /// Identities for a set of node indexes.
    pub fn peers(&self, indexes: impl IntoIterator<Item = usize>) -> BTreeSet<PeerId> {
        indexes.into_iter().map(|index| self.peer(index)).collect()
    }

    /// Program the committees for `round`, one notary slice per chain.
    ///
    /// Replaces any previous answer for the round, which makes changed-oracle
    /// rebuilds easy to stage.
    pub fn insert_round(&self, round: Round, notary: &[&[usize]], dkg: &[usize]) {
        let notary = notary.iter().map(|chain| self.peers(chain.iter().copied())).collect();
        self.governance.insert_round(round, notary, self.peers(dkg.iter().copied()));
    }

    /// A clone of the shared governance stub.
    pub fn governance(&self) -> GovernanceFixture {
        self.governance.clone()
    }

    /// A node table holding every remote record, local record seeded.
    pub fn node_table(&self) -> NodeTable {
        let table = NodeTable::new(self.local().record().clone());
        for node in &self.nodes[1..] {
            table.insert(node.record().clone());
        }
        table
    }
}

/// Committees for one programmed round.
#[derive(Debug)]
struct RoundCommittees {
    notary: Vec<BTreeSet<PeerId>>,
    dkg: BTreeSet<PeerId>,
}

/// In-memory governance oracle with per-round programmed answers.
///
/// Unknown rounds fail queries, matching an oracle that has not observed the
/// round yet. Clones share the underlying answers.
#[derive(Clone, Debug, Default)]
pub struct GovernanceFixture {
    rounds: Arc<RwLock<BTreeMap<Round, RoundCommittees>>>,
}

impl GovernanceFixture {
    /// Program the answer for `round`, replacing any previous one.
    pub fn insert_round(
        &self,
        round: Round,
        notary: Vec<BTreeSet<PeerId>>,
        dkg: BTreeSet<PeerId>,
    ) {
        self.rounds.write().insert(round, RoundCommittees { notary, dkg });
    }

    /// Drop the answer for `round` so its queries fail again.
    pub fn remove_round(&self, round: Round) {
        self.rounds.write().remove(&round);
    }
}

impl Governance for GovernanceFixture {
    fn num_chains(&self, round: Round) -> Result<ChainId, GovernanceError> {
        self.rounds
            .read()
            .get(&round)
            .map(|committees| committees.notary.len() as ChainId)
            .ok_or(GovernanceError::UnknownRound(round))
    }

    fn notary_set(
        &self,
        round: Round,
        chain: ChainId,
    ) -> Result<BTreeSet<PeerId>, GovernanceError> {
        let rounds = self.rounds.read();
        let committees = rounds.get(&round).ok_or(GovernanceError::UnknownRound(round))?;
        committees
            .notary
            .get(chain as usize)
            .cloned()
            .ok_or(GovernanceError::UnknownChain { round, chain })
    }

    fn dkg_set(&self, round: Round) -> Result<BTreeSet<PeerId>, GovernanceError> {
        self.rounds
            .read()
            .get(&round)
            .map(|committees| committees.dkg.clone())
            .ok_or(GovernanceError::UnknownRound(round))
    }
}
