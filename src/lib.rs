//! RTS Commander - tactical and economic decision core for an RTS bot
//!
//! Each frame the host reports what it sees; the commander clusters the
//! army, predicts fights, decides per cluster whether to attack or fall
//! back, keeps workers on productive jobs, and answers with unit commands.

pub mod cluster;
pub mod combat;
pub mod command;
pub mod core;
pub mod oracle;
pub mod simulation;
pub mod spatial;
pub mod squad;
pub mod units;
pub mod workers;

pub use crate::cluster::{Cluster, ClusterStatus, UnitClusterer};
pub use crate::combat::{CombatPredictor, EnemyFilter};
pub use crate::command::{CommandBuffer, UnitCommand};
pub use crate::core::{CommanderConfig, CommanderError, Owner, Result, Tick, UnitId, UnitTypeId, Vec2};
pub use crate::oracle::{DebugSink, NullDebugSink, OpenTerrain, ProductionOracle, ProductionStatus, Services, TerrainOracle};
pub use crate::simulation::{Commander, TickBudget, TickReport, UnitEvent};
pub use crate::spatial::SpatialIndex;
pub use crate::squad::{Squad, SquadData, SquadOrder, SquadOrderType};
pub use crate::units::{BaseLayout, Economy, UnitCatalog, UnitRegistry, UnitSnapshot, UnitStats};
pub use crate::workers::{JobKind, WorkerAllocator, WorkerJob};
