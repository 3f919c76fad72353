//! Error types for topology management.

use rotor_types::{ChainId, Round};
use thiserror::Error;

/// The result for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;

/// Error raised by a governance oracle while resolving committees.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    /// The round is not known to governance.
    #[error("round {0} unknown to governance")]
    UnknownRound(Round),
    /// The chain index is out of range for the round.
    #[error("chain {chain} out of range for round {round}")]
    UnknownChain {
        /// The queried round.
        round: Round,
        /// The out-of-range chain index.
        chain: ChainId,
    },
    /// The governance backend failed to produce an answer.
    #[error("governance backend: {0}")]
    Backend(String),
}

/// Topology error type.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Governance could not resolve the round's committees.
    ///
    /// The round's state is untouched and the whole round may be retried.
    #[error("failed to resolve committees for round {round}: {source}")]
    Governance {
        /// The round being built.
        round: Round,
        /// The oracle failure.
        #[source]
        source: GovernanceError,
    },
}

impl TopologyError {
    /// The round's governance failure, if this is one.
    pub fn as_governance(&self) -> Option<(Round, &GovernanceError)> {
        match self {
            Self::Governance { round, source } => Some((*round, source)),
        }
    }
}
