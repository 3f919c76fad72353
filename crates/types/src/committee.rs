//! Labels for the rotating committees that drive connection decisions.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// The committee rotation round.
/// Every round elects one notary committee per chain and one DKG committee.
pub type Round = u64;

/// Index of a chain within a round.
pub type ChainId = u32;

/// The role a committee serves during its round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CommitteeKind {
    /// Per-chain notary committee.
    Notary,
    /// Round-wide DKG committee.
    Dkg,
}

/// Identifies one committee by kind, round, and chain.
///
/// Built through [`Self::notary`] and [`Self::dkg`] only. DKG committees span
/// all chains, so their chain index is pinned to zero and any two DKG labels
/// for the same round compare and hash equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CommitteeLabel {
    kind: CommitteeKind,
    round: Round,
    chain: ChainId,
}

impl CommitteeLabel {
    /// Label for the notary committee of `chain` at `round`.
    pub fn notary(round: Round, chain: ChainId) -> Self {
        Self { kind: CommitteeKind::Notary, round, chain }
    }

    /// Label for the DKG committee at `round`.
    pub fn dkg(round: Round) -> Self {
        Self { kind: CommitteeKind::Dkg, round, chain: 0 }
    }

    /// The committee's role.
    pub fn kind(&self) -> CommitteeKind {
        self.kind
    }

    /// The round this committee serves.
    pub fn round(&self) -> Round {
        self.round
    }

    /// The chain index. Always zero for DKG labels.
    pub fn chain(&self) -> ChainId {
        self.chain
    }

    /// True if this label belongs to `round`.
    pub fn is_for_round(&self, round: Round) -> bool {
        self.round == round
    }
}

impl<'de> Deserialize<'de> for CommitteeLabel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            kind: CommitteeKind,
            round: Round,
            chain: ChainId,
        }

        // Route through the constructors so the zero-chain invariant for DKG
        // labels survives deserialization.
        let raw = Raw::deserialize(deserializer)?;
        Ok(match raw.kind {
            CommitteeKind::Notary => Self::notary(raw.round, raw.chain),
            CommitteeKind::Dkg => Self::dkg(raw.round),
        })
    }
}

impl Display for CommitteeLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.kind {
            CommitteeKind::Notary => write!(f, "notary-{}-{}", self.round, self.chain),
            CommitteeKind::Dkg => write!(f, "dkg-{}", self.round),
        }
    }
}
