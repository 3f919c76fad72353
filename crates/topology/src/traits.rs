//! Seams between the topology manager and its collaborators.

use crate::error::GovernanceError;
use rotor_types::{ChainId, PeerId, Round};
use std::collections::BTreeSet;

/// Resolves committee membership per round.
///
/// Answers are snapshots: governance may legitimately report different
/// membership for a round across queries until the round settles, so callers
/// never cache across calls.
pub trait Governance: Send + Sync + 'static {
    /// The number of chains, and therefore notary committees, active in `round`.
    fn num_chains(&self, round: Round) -> Result<ChainId, GovernanceError>;

    /// Members of the notary committee for `chain` at `round`.
    ///
    /// Includes the local node's identity when it is a member.
    fn notary_set(&self, round: Round, chain: ChainId)
        -> Result<BTreeSet<PeerId>, GovernanceError>;

    /// Members of the DKG committee at `round`.
    fn dkg_set(&self, round: Round) -> Result<BTreeSet<PeerId>, GovernanceError>;
}

/// Resolves the local node's identity.
///
/// Dial information for remote peers stays behind this boundary.
pub trait NodeDirectory {
    /// The identity the local node presents on the network.
    fn local_identity(&self) -> PeerId;
}

/// Receives connection intent from the topology manager.
///
/// Calls are fire-and-forget: they never block, carry no result, and are
/// idempotent on the server side. Requesting an already-connected peer or
/// releasing an unknown one is a no-op, so callers do not deduplicate.
pub trait ConnectionServer: Send + Sync + 'static {
    /// Establish and maintain a connection to `peer`.
    fn request_connection(&self, peer: &PeerId);

    /// The connection to `peer` is no longer wanted.
    fn release_connection(&self, peer: &PeerId);
}
