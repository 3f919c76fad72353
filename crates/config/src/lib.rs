//! Crate for configuring a node.
//!
//! Network-wide tunables with defaults suitable for production.
pub mod network;
pub use network::*;
