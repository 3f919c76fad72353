// SPDX-License-Identifier: Apache-2.0

//! Committee-driven connection topology for a rotating-committee network.
//!
//! Every round elects one notary committee per chain and one DKG committee.
//! [`PeerTopology`] turns those memberships into connection intent: full mesh
//! into committees the local node belongs to, a bounded sampled subset into
//! committees it does not, and a reverse index answering why any given peer
//! is currently connected. Rounds accumulate through
//! [`PeerTopology::build_connection`] and are reclaimed wholesale through
//! [`PeerTopology::forget_connection`].

mod error;
mod manager;
mod policy;
mod server;
mod table;
mod traits;

pub use error::*;
pub use manager::*;
pub use policy::*;
pub use server::*;
pub use table::*;
pub use traits::*;
