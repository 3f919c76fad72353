// SPDX-License-Identifier: Apache-2.0

mod committee;
mod crypto;
mod node;
pub use committee::*;
pub use crypto::*;
pub use node::*;
