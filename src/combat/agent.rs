//! Simulated combatants

use serde::{Deserialize, Serialize};

use crate::core::types::{UnitId, Vec2};
use crate::units::{UnitSnapshot, UnitStats};

/// Which enemies the predictor should count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnemyFilter {
    /// Every enemy combat unit
    #[default]
    All,
    /// Enemies that can hit ground: ground units, plus flyers with a ground weapon
    AntiGround,
    /// Ground enemies with an anti-air weapon
    AntiAirOnly,
}

impl EnemyFilter {
    pub fn admits(&self, stats: &UnitStats, flying: bool) -> bool {
        match self {
            EnemyFilter::All => true,
            EnemyFilter::AntiGround => !flying || stats.has_ground_weapon(),
            EnemyFilter::AntiAirOnly => !flying && stats.has_air_weapon(),
        }
    }
}

/// One unit's state inside the attrition model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatAgent {
    pub id: UnitId,
    pub position: Vec2,
    /// Hit points plus shields
    pub health: f32,
    pub ground_dpf: f32,
    pub air_dpf: f32,
    pub ground_range: f32,
    pub air_range: f32,
    pub speed: f32,
    pub flyer: bool,
    /// Contribution to the side's score while alive
    pub value: f32,
}

impl CombatAgent {
    pub fn from_unit(unit: &UnitSnapshot, stats: &UnitStats) -> Self {
        Self {
            id: unit.id,
            position: unit.position,
            health: unit.effective_health(),
            ground_dpf: stats.ground_dpf,
            air_dpf: stats.air_dpf,
            ground_range: stats.ground_range,
            air_range: stats.air_range,
            speed: stats.top_speed,
            flyer: unit.flying,
            value: stats.sim_value,
        }
    }

    /// A stationary ground unit with the same damage against ground and air
    pub fn simple(id: u32, position: Vec2, health: f32, dpf: f32, range: f32) -> Self {
        Self {
            id: UnitId(id),
            position,
            health,
            ground_dpf: dpf,
            air_dpf: dpf,
            ground_range: range,
            air_range: range,
            speed: 0.0,
            flyer: false,
            value: 1.0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Damage per frame and reach against a given target, if it can hit it at all
    pub fn weapon_against(&self, target: &CombatAgent) -> Option<(f32, f32)> {
        let (dpf, range) = if target.flyer {
            (self.air_dpf, self.air_range)
        } else {
            (self.ground_dpf, self.ground_range)
        };
        (dpf > 0.0).then_some((dpf, range))
    }
}
