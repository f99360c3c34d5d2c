//! Standing orders for squads

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;

/// What a squad has been told to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SquadOrderType {
    /// Unused units waiting for a job
    #[default]
    Idle,
    Attack,
    Defend,
    /// Gather at a point, fighting only when forced to
    Regroup,
    /// Stand and fight; never retreat
    Hold,
    /// Board the squad's transports at the order position
    Load,
    /// Fly the loaded squad to the order position and unload
    Drop,
}

impl SquadOrderType {
    /// One-character code for debug displays
    pub fn code(&self) -> char {
        match self {
            SquadOrderType::Idle => 'I',
            SquadOrderType::Attack => 'a',
            SquadOrderType::Defend => 'd',
            SquadOrderType::Regroup => 'r',
            SquadOrderType::Hold => 'h',
            SquadOrderType::Load => 'L',
            SquadOrderType::Drop => 'D',
        }
    }
}

/// Order type plus where and how far it reaches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadOrder {
    pub kind: SquadOrderType,
    pub position: Vec2,
    /// Units within this distance of `position` are considered engaged
    pub radius: f32,
    /// Free-form description shown in debug output
    pub status: String,
    /// The position is our main base; defending it never falls back
    #[serde(default)]
    pub main_base: bool,
}

impl SquadOrder {
    pub fn new(kind: SquadOrderType, position: Vec2, radius: f32, status: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            radius,
            status: status.into(),
            main_base: false,
        }
    }

    pub fn idle(position: Vec2) -> Self {
        Self::new(SquadOrderType::Idle, position, 0.0, "Idle")
    }

    pub fn attack(position: Vec2, radius: f32) -> Self {
        Self::new(SquadOrderType::Attack, position, radius, "Attack")
    }

    pub fn defend(position: Vec2, radius: f32) -> Self {
        Self::new(SquadOrderType::Defend, position, radius, "Defend")
    }

    pub fn hold(position: Vec2, radius: f32) -> Self {
        Self::new(SquadOrderType::Hold, position, radius, "Hold")
    }

    pub fn of_main_base(mut self) -> Self {
        self.main_base = true;
        self
    }

    /// May a losing fight under this order trigger a retreat?
    pub fn can_regroup(&self) -> bool {
        match self.kind {
            SquadOrderType::Attack | SquadOrderType::Regroup | SquadOrderType::Drop => true,
            SquadOrderType::Defend => !self.main_base,
            SquadOrderType::Idle | SquadOrderType::Hold | SquadOrderType::Load => false,
        }
    }

    pub fn is_combat_order(&self) -> bool {
        !matches!(self.kind, SquadOrderType::Idle | SquadOrderType::Load)
    }
}
