//! Fixtures for driving the topology manager in tests.

mod builder;
pub use builder::TopologyFixtureBuilder;
mod fixture;
pub use fixture::*;
mod recorder;
pub use recorder::*;
