//! Services the decision core consumes but does not implement
//!
//! Terrain analysis, production planning and on-screen debugging live
//! outside this crate. They are reached through the traits here so the
//! host can plug in real implementations and tests can plug in simple ones.

pub mod debug;
pub mod production;
pub mod terrain;

pub use debug::{DebugSink, NullDebugSink};
pub use production::{ProductionOracle, ProductionStatus};
pub use terrain::{OpenTerrain, PartitionId, TerrainOracle};

/// Borrowed bundle of external services handed to each tick
pub struct Services<'a> {
    pub terrain: &'a dyn TerrainOracle,
    pub production: &'a dyn ProductionOracle,
    pub debug: &'a mut dyn DebugSink,
}
