//! A transient group of nearby units

use serde::Serialize;

use crate::core::types::{UnitId, Vec2};
use crate::units::UnitRegistry;

/// Tactical status assigned to a cluster during the combat phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ClusterStatus {
    #[default]
    None,
    Advance,
    Attack,
    Regroup,
}

impl ClusterStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ClusterStatus::None => "none",
            ClusterStatus::Advance => "advance",
            ClusterStatus::Attack => "attack",
            ClusterStatus::Regroup => "regroup",
        }
    }
}

/// Units grouped for one tick
///
/// Rebuilt from scratch every tick; nothing holds on to a cluster once the
/// tick ends.
#[derive(Debug, Clone, Serialize)]
pub struct Cluster {
    /// Members, in ascending id order
    pub units: Vec<UnitId>,
    pub center: Vec2,
    pub radius: f32,
    /// Flyers only (otherwise ground only, never mixed)
    pub air: bool,
    pub status: ClusterStatus,
    pub count: usize,
    /// Sum of member health plus shields
    pub total_health: f32,
    pub ground_dpf: f32,
    pub air_dpf: f32,
    /// Lowest nonzero member top speed, 0 if nobody moves
    pub slowest_speed: f32,
}

impl Cluster {
    pub(crate) fn from_members(
        mut units: Vec<UnitId>,
        center: Vec2,
        radius: f32,
        air: bool,
        registry: &UnitRegistry,
    ) -> Self {
        units.sort_unstable();
        let mut cluster = Self {
            count: units.len(),
            units,
            center,
            radius,
            air,
            status: ClusterStatus::None,
            total_health: 0.0,
            ground_dpf: 0.0,
            air_dpf: 0.0,
            slowest_speed: 0.0,
        };

        for unit in cluster.units.iter().filter_map(|id| registry.get(*id)) {
            let stats = registry.stats(unit);
            cluster.total_health += unit.effective_health();
            cluster.ground_dpf += stats.ground_dpf;
            cluster.air_dpf += stats.air_dpf;
            if stats.top_speed > 0.0
                && (cluster.slowest_speed == 0.0 || stats.top_speed < cluster.slowest_speed)
            {
                cluster.slowest_speed = stats.top_speed;
            }
        }
        cluster
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.units.binary_search(&id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
