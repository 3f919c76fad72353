//! Classification of committee membership into connection intent.

use rand::{seq::IteratorRandom, Rng};
use rotor_types::PeerId;
use std::collections::BTreeSet;

/// How the local node connects into one committee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionPolicy {
    /// The local node is a member: connect to every other member.
    Direct,
    /// The local node is not a member: connect to a sampled subset.
    Group {
        /// The sampled members. Empty only for an empty committee.
        peers: BTreeSet<PeerId>,
    },
}

impl ConnectionPolicy {
    /// True for the direct variant.
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct)
    }
}

/// Decide how to connect to a committee with `membership`.
///
/// Membership of `local` makes the committee direct. Otherwise up to `bound`
/// members are sampled uniformly, at least one whenever the committee is
/// non-empty. The sample is drawn only from `membership`, which cannot
/// contain `local` on this branch.
pub fn classify<R: Rng + ?Sized>(
    membership: &BTreeSet<PeerId>,
    local: &PeerId,
    bound: usize,
    rng: &mut R,
) -> ConnectionPolicy {
    if membership.contains(local) {
        return ConnectionPolicy::Direct;
    }

    let amount = bound.max(1).min(membership.len());
    let peers = membership.iter().cloned().choose_multiple(rng, amount).into_iter().collect();
    ConnectionPolicy::Group { peers }
}
