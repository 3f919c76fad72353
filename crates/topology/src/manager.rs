//! Tracks why each peer is connected and keeps the transport in sync with
//! committee rotation.

use crate::{
    error::{TopologyError, TopologyResult},
    policy::{classify, ConnectionPolicy},
    traits::{ConnectionServer, Governance, NodeDirectory},
};
use parking_lot::RwLock;
use rotor_config::TopologyConfig;
use rotor_types::{CommitteeLabel, PeerId, Round};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use tracing::{debug, warn};

/// All connection bookkeeping, guarded as one unit.
///
/// The four structures move together: `committees` records every known
/// label's membership, `direct` and `group` split those labels by policy,
/// and `justifications` is the peer-keyed union of connection intent.
#[derive(Debug, Default)]
struct TopologyState {
    /// Membership of every committee currently known, as reported by
    /// governance when the label was last built.
    committees: BTreeMap<CommitteeLabel, BTreeSet<PeerId>>,
    /// Labels the local node is a member of.
    direct: BTreeSet<CommitteeLabel>,
    /// Sampled peers per label the local node is not a member of. Labels
    /// with empty membership carry no entry here.
    group: BTreeMap<CommitteeLabel, BTreeSet<PeerId>>,
    /// The labels justifying a connection, per peer. A peer with no
    /// justification has no entry.
    justifications: BTreeMap<PeerId, BTreeSet<CommitteeLabel>>,
}

impl TopologyState {
    /// Peers currently connected under `label`.
    fn connected_peers(&self, label: &CommitteeLabel, local: &PeerId) -> BTreeSet<PeerId> {
        if self.direct.contains(label) {
            self.committees
                .get(label)
                .map(|members| members.iter().filter(|peer| *peer != local).cloned().collect())
                .unwrap_or_default()
        } else {
            self.group.get(label).cloned().unwrap_or_default()
        }
    }

    /// Remove `label` from `peer`'s justification set.
    ///
    /// True when the peer lost its last justification.
    fn drop_justification(&mut self, peer: &PeerId, label: &CommitteeLabel) -> bool {
        if let Some(labels) = self.justifications.get_mut(peer) {
            labels.remove(label);
            if labels.is_empty() {
                self.justifications.remove(peer);
                return true;
            }
        }
        false
    }

    /// Install `label` with `members` under `policy`.
    ///
    /// A label already present with identical membership is left untouched.
    /// Otherwise the label is replaced wholesale. Returns the peers now
    /// connected under the label and the peers that lost their last
    /// justification.
    fn install(
        &mut self,
        label: CommitteeLabel,
        members: BTreeSet<PeerId>,
        policy: ConnectionPolicy,
        local: &PeerId,
    ) -> (BTreeSet<PeerId>, BTreeSet<PeerId>) {
        if self.committees.get(&label) == Some(&members) {
            return (BTreeSet::new(), BTreeSet::new());
        }

        let previous = self.connected_peers(&label, local);
        let connected: BTreeSet<PeerId> = match &policy {
            ConnectionPolicy::Direct => {
                members.iter().filter(|peer| *peer != local).cloned().collect()
            }
            ConnectionPolicy::Group { peers } => peers.clone(),
        };

        let mut released = BTreeSet::new();
        for peer in previous.difference(&connected) {
            if self.drop_justification(peer, &label) {
                released.insert(peer.clone());
            }
        }
        for peer in &connected {
            self.justifications.entry(peer.clone()).or_default().insert(label);
        }

        self.committees.insert(label, members);
        match policy {
            ConnectionPolicy::Direct => {
                self.group.remove(&label);
                self.direct.insert(label);
            }
            ConnectionPolicy::Group { .. } => {
                self.direct.remove(&label);
                if connected.is_empty() {
                    self.group.remove(&label);
                } else {
                    self.group.insert(label, connected.clone());
                }
            }
        }

        (connected, released)
    }

    /// Remove `label` from every structure.
    ///
    /// Returns the peers that lost their last justification.
    fn remove_label(&mut self, label: &CommitteeLabel, local: &PeerId) -> BTreeSet<PeerId> {
        let connected = self.connected_peers(label, local);
        self.committees.remove(label);
        self.direct.remove(label);
        self.group.remove(label);

        let mut released = BTreeSet::new();
        for peer in &connected {
            if self.drop_justification(peer, label) {
                released.insert(peer.clone());
            }
        }
        released
    }
}

/// Decides which peers deserve live connections as committee rounds rotate.
///
/// Rounds accumulate through [`Self::build_connection`] and are reclaimed
/// through [`Self::forget_connection`]; [`Self::justifications_for`] answers
/// why a peer is connected. Clones are cheap and share state.
pub struct PeerTopology<G, C> {
    inner: Arc<Inner<G, C>>,
}

struct Inner<G, C> {
    /// Resolves committee membership per round.
    governance: G,
    /// Receives connection intent.
    connections: C,
    /// The local node's identity, captured at construction.
    local: PeerId,
    /// Bound on sampled peers for group-connected committees.
    bound: usize,
    state: RwLock<TopologyState>,
}

impl<G, C> Clone for PeerTopology<G, C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<G, C> std::fmt::Debug for PeerTopology<G, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerTopology").field("local", &self.inner.local).finish_non_exhaustive()
    }
}

impl<G, C> PeerTopology<G, C>
where
    G: Governance,
    C: ConnectionServer,
{
    /// Create a manager with empty state.
    ///
    /// The local identity is captured from `directory` once and used for all
    /// membership comparisons. Connection intent flows to `connections` as
    /// rounds are built and forgotten.
    pub fn new<D: NodeDirectory>(
        governance: G,
        connections: C,
        directory: &D,
        config: TopologyConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                governance,
                connections,
                local: directory.local_identity(),
                bound: config.group_conn_peers,
                state: RwLock::new(TopologyState::default()),
            }),
        }
    }

    /// Resolve every committee of `round` from governance.
    ///
    /// Any failure aborts the whole round so no partial batch can reach the
    /// install step.
    fn resolve_round(
        &self,
        round: Round,
    ) -> TopologyResult<Vec<(CommitteeLabel, BTreeSet<PeerId>)>> {
        let chains = self
            .inner
            .governance
            .num_chains(round)
            .map_err(|source| TopologyError::Governance { round, source })?;

        let mut resolved = Vec::with_capacity(chains as usize + 1);
        for chain in 0..chains {
            let members = self
                .inner
                .governance
                .notary_set(round, chain)
                .map_err(|source| TopologyError::Governance { round, source })?;
            resolved.push((CommitteeLabel::notary(round, chain), members));
        }

        let dkg = self
            .inner
            .governance
            .dkg_set(round)
            .map_err(|source| TopologyError::Governance { round, source })?;
        resolved.push((CommitteeLabel::dkg(round), dkg));

        Ok(resolved)
    }

    /// Build connections for every committee of `round`.
    ///
    /// Additive with respect to other rounds. Rebuilding a round with
    /// unchanged governance answers is a no-op; changed answers replace the
    /// affected labels wholesale and release peers left without any
    /// justification. On error the state is exactly as it was before the
    /// call and the whole round may be retried.
    pub fn build_connection(&self, round: Round) -> TopologyResult<()> {
        // Resolve and classify before taking the lock so the batch applies
        // in one critical section and a failed query installs nothing.
        let resolved = self
            .resolve_round(round)
            .inspect_err(|e| warn!(target: "topology", round, ?e, "failed to resolve round"))?;

        let mut rng = rand::rng();
        let classified: Vec<_> = resolved
            .into_iter()
            .map(|(label, members)| {
                let policy = classify(&members, &self.inner.local, self.inner.bound, &mut rng);
                (label, members, policy)
            })
            .collect();

        let mut requested = BTreeSet::new();
        let mut released = BTreeSet::new();
        let labels = classified.len();
        let direct = classified.iter().filter(|(_, _, policy)| policy.is_direct()).count();
        {
            let mut state = self.inner.state.write();
            for (label, members, policy) in classified {
                let (now_connected, fell) =
                    state.install(label, members, policy, &self.inner.local);
                requested.extend(now_connected);
                released.extend(fell);
            }
            // a peer dropped by one rebuilt label may be sampled by another
            released.retain(|peer| !state.justifications.contains_key(peer));
        }

        for peer in &requested {
            self.inner.connections.request_connection(peer);
        }
        for peer in &released {
            self.inner.connections.release_connection(peer);
        }

        debug!(
            target: "topology",
            round,
            labels,
            direct,
            requested = requested.len(),
            released = released.len(),
            "round connections built"
        );
        Ok(())
    }

    /// Forget every committee of `round` and release the connections only
    /// that round justified.
    ///
    /// Peers still justified by surviving rounds stay connected. Unknown or
    /// already-forgotten rounds are a no-op.
    pub fn forget_connection(&self, round: Round) {
        let mut state = self.inner.state.write();
        let labels: Vec<CommitteeLabel> =
            state.committees.keys().filter(|label| label.is_for_round(round)).copied().collect();
        if labels.is_empty() {
            return;
        }

        let mut released = BTreeSet::new();
        for label in &labels {
            released.extend(state.remove_label(label, &self.inner.local));
        }
        drop(state);

        for peer in &released {
            self.inner.connections.release_connection(peer);
        }

        debug!(
            target: "topology",
            round,
            labels = labels.len(),
            released = released.len(),
            "round connections forgotten"
        );
    }

    /// The labels currently justifying a connection to `peer`.
    ///
    /// Empty when nothing justifies one. The snapshot is atomic with respect
    /// to concurrent builds and forgets.
    pub fn justifications_for(&self, peer: &PeerId) -> BTreeSet<CommitteeLabel> {
        self.inner.state.read().justifications.get(peer).cloned().unwrap_or_default()
    }

    /// True when at least one label justifies a connection to `peer`.
    pub fn is_justified(&self, peer: &PeerId) -> bool {
        self.inner.state.read().justifications.contains_key(peer)
    }

    /// Membership of `label` as last reported by governance, if known.
    pub fn committee_members(&self, label: &CommitteeLabel) -> Option<BTreeSet<PeerId>> {
        self.inner.state.read().committees.get(label).cloned()
    }

    /// The sampled peers for a group-connected label.
    pub fn group_peers(&self, label: &CommitteeLabel) -> Option<BTreeSet<PeerId>> {
        self.inner.state.read().group.get(label).cloned()
    }

    /// True when the local node is a member of `label`.
    pub fn is_direct(&self, label: &CommitteeLabel) -> bool {
        self.inner.state.read().direct.contains(label)
    }

    /// Every committee label currently known.
    pub fn known_labels(&self) -> BTreeSet<CommitteeLabel> {
        self.inner.state.read().committees.keys().copied().collect()
    }

    /// Number of committees currently known.
    pub fn committee_count(&self) -> usize {
        self.inner.state.read().committees.len()
    }

    /// Number of peers with at least one justification.
    pub fn justified_peer_count(&self) -> usize {
        self.inner.state.read().justifications.len()
    }

    /// The identity used for membership comparisons.
    pub fn local_identity(&self) -> PeerId {
        self.inner.local.clone()
    }
}
