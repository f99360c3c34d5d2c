//! Squads: long-lived unit groups that cluster, judge fights and act

pub mod data;
pub mod micro;
pub mod order;
mod regroup;
pub mod squad;
mod stim;

pub use data::{SquadData, IDLE_SQUAD};
pub use micro::{micro_role, MicroContext, MicroController, MicroGroups, MicroRole, TargetPolicy};
pub use order::{SquadOrder, SquadOrderType};
pub use squad::{Squad, SquadCapabilities, SquadContext};
pub use stim::stim_if_needed;
