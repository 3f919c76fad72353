// SPDX-License-Identifier: Apache-2.0

#![warn(unused_crate_dependencies)]

mod builder;
pub use builder::TopologyFixtureBuilder;
mod fixture;
pub use fixture::*;
mod logging;
pub use logging::*;
mod recorder;
pub use recorder::*;
