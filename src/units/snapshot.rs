//! Last-known state of a single unit

use serde::{Deserialize, Serialize};

use crate::core::types::{Owner, Tick, UnitId, UnitTypeId, Vec2};

/// The order a unit is currently executing, as observed from the engine
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum UnitOrder {
    #[default]
    Idle,
    Move(Vec2),
    /// Gathering from a resource; `harvesting` is true once the worker is
    /// actually extracting rather than walking or waiting
    Gather { target: UnitId, harvesting: bool },
    ReturnCargo,
    Build(UnitTypeId),
    Repair(UnitId),
    Attack(UnitId),
    AttackMove(Vec2),
    Load(UnitId),
    Unload,
    Other,
}

/// Snapshot of one unit, refreshed every tick it is observable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub owner: Owner,
    pub unit_type: UnitTypeId,
    pub position: Vec2,
    pub health: f32,
    pub shields: f32,
    #[serde(default)]
    pub energy: f32,
    #[serde(default)]
    pub flying: bool,
    #[serde(default)]
    pub cloaked: bool,
    #[serde(default = "default_true")]
    pub completed: bool,
    /// Currently within our vision
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Last position was checked and the unit was not there
    #[serde(default)]
    pub observed_gone: bool,
    #[serde(default)]
    pub last_update: Tick,
    #[serde(default)]
    pub order: UnitOrder,
    #[serde(default)]
    pub carrying_minerals: bool,
    #[serde(default)]
    pub carrying_gas: bool,
    /// Stim effect lasts until this frame
    #[serde(default)]
    pub stimmed_until: Tick,
    /// Static defense currently firing
    #[serde(default)]
    pub attacking: bool,
    /// Transport this unit is loaded into
    #[serde(default)]
    pub loaded_into: Option<UnitId>,
}

fn default_true() -> bool {
    true
}

impl UnitSnapshot {
    /// A completed, visible unit at full state
    pub fn new(id: UnitId, owner: Owner, unit_type: UnitTypeId, position: Vec2) -> Self {
        Self {
            id,
            owner,
            unit_type,
            position,
            health: 0.0,
            shields: 0.0,
            energy: 0.0,
            flying: false,
            cloaked: false,
            completed: true,
            visible: true,
            observed_gone: false,
            last_update: 0,
            order: UnitOrder::Idle,
            carrying_minerals: false,
            carrying_gas: false,
            stimmed_until: 0,
            attacking: false,
            loaded_into: None,
        }
    }

    pub fn with_health(mut self, health: f32, shields: f32) -> Self {
        self.health = health;
        self.shields = shields;
        self
    }

    pub fn flying(mut self) -> Self {
        self.flying = true;
        self
    }

    pub fn incomplete(mut self) -> Self {
        self.completed = false;
        self
    }

    pub fn with_order(mut self, order: UnitOrder) -> Self {
        self.order = order;
        self
    }

    /// Hit points plus shields
    pub fn effective_health(&self) -> f32 {
        self.health + self.shields
    }

    pub fn is_carrying(&self) -> bool {
        self.carrying_minerals || self.carrying_gas
    }

    pub fn is_stimmed(&self, now: Tick) -> bool {
        self.stimmed_until > now
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn is_own(&self) -> bool {
        self.owner == Owner::Own
    }

    pub fn is_enemy(&self) -> bool {
        self.owner == Owner::Enemy
    }

    /// Position is inside the map and the unit is not inside a transport
    pub fn has_valid_position(&self) -> bool {
        self.loaded_into.is_none() && self.position.x.is_finite() && self.position.y.is_finite()
    }
}
