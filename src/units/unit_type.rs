//! Per-type unit statistics loaded from TOML
//!
//! The decision core never hard-codes balance numbers. Everything it needs
//! to know about a unit type (weapons, speed, durability, and which tactical
//! role it plays) comes from a [`UnitCatalog`].

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::Result;
use crate::core::types::UnitTypeId;

/// Tactical role, used to route units to micro controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnitRole {
    Worker,
    Melee,
    Ranged,
    AirToAir,
    Detector,
    Caster,
    Transport,
    Medic,
    Tank,
    Lurker,
    Scourge,
    Building,
    Resource,
    #[default]
    Other,
}

/// Statistics for one unit type
///
/// Damage is expressed per frame so the combat predictor can step
/// frame by frame without knowing about cooldowns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitStats {
    pub id: UnitTypeId,
    pub name: String,
    #[serde(default)]
    pub role: UnitRole,
    #[serde(default)]
    pub flyer: bool,
    #[serde(default)]
    pub is_worker: bool,
    #[serde(default)]
    pub is_building: bool,
    #[serde(default)]
    pub is_depot: bool,
    #[serde(default)]
    pub is_refinery: bool,
    #[serde(default)]
    pub is_mineral_field: bool,
    #[serde(default)]
    pub is_static_defense: bool,
    #[serde(default)]
    pub is_detector: bool,
    #[serde(default)]
    pub can_stim: bool,
    /// Long-range siege unit; raises the enemy safe distance once seen
    #[serde(default)]
    pub siege_capable: bool,
    #[serde(default)]
    pub ground_dpf: f32,
    #[serde(default)]
    pub air_dpf: f32,
    #[serde(default)]
    pub ground_range: f32,
    #[serde(default)]
    pub air_range: f32,
    #[serde(default)]
    pub top_speed: f32,
    #[serde(default)]
    pub max_health: f32,
    #[serde(default)]
    pub max_shields: f32,
    /// Supply cost in whole supply units
    #[serde(default)]
    pub supply: u32,
    /// Passenger slots, for transports
    #[serde(default)]
    pub space_provided: u32,
    /// Weight of one unit in combat prediction scores
    #[serde(default = "default_sim_value")]
    pub sim_value: f32,
}

fn default_sim_value() -> f32 {
    1.0
}

impl UnitStats {
    /// Minimal stats record; mostly useful for building catalogs in code
    pub fn new(id: UnitTypeId, name: impl Into<String>, role: UnitRole) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            flyer: false,
            is_worker: role == UnitRole::Worker,
            is_building: role == UnitRole::Building,
            is_depot: false,
            is_refinery: false,
            is_mineral_field: role == UnitRole::Resource,
            is_static_defense: false,
            is_detector: role == UnitRole::Detector,
            can_stim: false,
            siege_capable: false,
            ground_dpf: 0.0,
            air_dpf: 0.0,
            ground_range: 0.0,
            air_range: 0.0,
            top_speed: 0.0,
            max_health: 0.0,
            max_shields: 0.0,
            supply: 0,
            space_provided: 0,
            sim_value: 1.0,
        }
    }

    pub fn has_ground_weapon(&self) -> bool {
        self.ground_dpf > 0.0
    }

    pub fn has_air_weapon(&self) -> bool {
        self.air_dpf > 0.0
    }

    pub fn has_weapon(&self) -> bool {
        self.has_ground_weapon() || self.has_air_weapon()
    }

    pub fn max_range(&self) -> f32 {
        self.ground_range.max(self.air_range)
    }

    /// Healers and spellcasters matter in a fight without carrying a weapon
    pub fn is_support(&self) -> bool {
        matches!(self.role, UnitRole::Medic | UnitRole::Caster)
    }

    /// Whether the combat predictor should model this unit at all
    pub fn is_combat_sim_unit(&self) -> bool {
        if self.is_building {
            return self.is_static_defense && self.has_weapon();
        }
        self.has_weapon() || self.is_support()
    }

    /// Whether this unit can fight for a squad (workers and buildings excluded)
    pub fn is_combat_unit(&self) -> bool {
        !self.is_worker && !self.is_building && (self.has_weapon() || self.is_support() || self.is_detector)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    unit: Vec<UnitStats>,
}

/// Lookup table from type id to stats
#[derive(Debug, Clone)]
pub struct UnitCatalog {
    types: AHashMap<UnitTypeId, UnitStats>,
    fallback: UnitStats,
}

impl Default for UnitCatalog {
    fn default() -> Self {
        Self {
            types: AHashMap::new(),
            fallback: UnitStats::new(UnitTypeId(u16::MAX), "Unknown", UnitRole::Other),
        }
    }
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(text)?;
        let mut catalog = Self::new();
        for stats in file.unit {
            catalog.insert(stats);
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, stats: UnitStats) {
        self.types.insert(stats.id, stats);
    }

    pub fn contains(&self, id: UnitTypeId) -> bool {
        self.types.contains_key(&id)
    }

    pub fn get(&self, id: UnitTypeId) -> Option<&UnitStats> {
        self.types.get(&id)
    }

    /// Stats for a type, or an inert placeholder when the type is unknown
    pub fn stats(&self, id: UnitTypeId) -> &UnitStats {
        self.types.get(&id).unwrap_or(&self.fallback)
    }

    /// Every known type, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &UnitStats> {
        self.types.values()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&UnitStats> {
        self.types.values().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Load a unit catalog from a TOML file of `[[unit]]` tables
pub fn load_catalog(path: impl AsRef<Path>) -> Result<UnitCatalog> {
    let text = fs::read_to_string(path.as_ref())?;
    let catalog = UnitCatalog::from_toml_str(&text)?;
    tracing::debug!("Loaded {} unit types from {:?}", catalog.len(), path.as_ref());
    Ok(catalog)
}
