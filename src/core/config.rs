//! Commander configuration with documented constants
//!
//! All tuning thresholds are collected here. Every section deserializes
//! from TOML with per-field defaults, so a config file only needs to name
//! the values it overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{CommanderError, Result};
use crate::core::types::Tick;

/// Spatial index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Edge length of one grid cell (pixels)
    pub cell_size: f32,
    /// How long a detection pulse covers its cell (frames)
    pub scan_duration: Tick,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            cell_size: 320.0,
            scan_duration: 240,
        }
    }
}

/// Cluster growth settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Absorption radius of the first growth round
    pub start_radius: f32,
    /// Added to the fitted radius for each following round
    pub radius_step: f32,
    /// Smallest radius a fitted cluster reports
    pub min_radius: f32,
    /// Enemies marked gone are still clustered if seen this recently (frames)
    pub enemy_memory: Tick,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            start_radius: 5.0 * 32.0,
            radius_step: 3.0 * 32.0,
            min_radius: 32.0,
            enemy_memory: 5 * 24,
        }
    }
}

/// Combat prediction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Maximum simulated frames per prediction
    pub max_frames: u32,
    /// Extra reach added to an enemy's weapon range when gathering the roster
    pub range_margin: f32,
    /// Reach used for enemies without a weapon (casters, medics)
    pub support_reach: f32,
    /// Friendly anti-air flyers dropped per enemy static anti-air building
    /// when the roster includes unseen enemies (0 disables)
    pub flyers_per_static_anti_air: u32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            max_frames: 96,
            range_margin: 32.0,
            support_reach: 64.0,
            flyers_per_static_anti_air: 0,
        }
    }
}

/// Squad behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadConfig {
    /// Distance from known enemies that counts as "near" (pixels)
    pub safe_distance: f32,
    /// Safe distance used for ground squads once the enemy fields siege units
    pub siege_safe_distance: f32,
    /// Supply at which the attack-at-max latch engages
    pub max_supply_latch_on: u32,
    /// Supply below which the latch releases
    pub max_supply_latch_off: u32,
    /// Bank of minerals that counts as "ample economy" for the latch
    pub latch_mineral_bank: u32,
    /// Mineral worker count that counts as "ample economy" for the latch
    pub latch_mineral_workers: usize,
    /// Search radius for friendly static defense
    pub static_defense_radius: f32,
    /// A unit this close to static defense is considered covered by it
    pub static_defense_cover: f32,
    /// A unit this close to the final fallback point does not regroup
    pub fallback_safe_radius: f32,
    /// Enemies within this radius of the vanguard center the combat sim
    pub sim_enemy_search_radius: f32,
    /// Radius of the combat sim's circle of interest
    pub combat_sim_radius: f32,
    /// Neighbor bonus when the neighbor cluster is attacking
    pub neighbor_attack_bonus: f32,
    /// Neighbor penalty when the neighbor cluster is regrouping
    pub neighbor_regroup_penalty: f32,
    /// Clusters per combat phase; phases = clamp(clusters / this, 1, max)
    pub clusters_per_phase: usize,
    pub max_combat_phases: usize,
    pub stim: StimConfig,
}

impl Default for SquadConfig {
    fn default() -> Self {
        Self {
            safe_distance: 384.0,
            siege_safe_distance: 512.0,
            max_supply_latch_on: 390,
            max_supply_latch_off: 320,
            latch_mineral_bank: 1000,
            latch_mineral_workers: 12,
            static_defense_radius: 800.0,
            static_defense_cover: 196.0,
            fallback_safe_radius: 224.0,
            sim_enemy_search_radius: 384.0,
            combat_sim_radius: 300.0,
            neighbor_attack_bonus: 128.0,
            neighbor_regroup_penalty: 32.0,
            clusters_per_phase: 6,
            max_combat_phases: 5,
            stim: StimConfig::default(),
        }
    }
}

/// Stimulant heuristics
///
/// Health is the unit's hit points before paying the stim cost.
/// The "no healer" thresholds apply when no medic energy is available.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StimConfig {
    /// Medic energy needed to heal back the hit points one stim costs
    pub energy_per_stim: f32,
    pub close_range_min_health: f32,
    pub close_range_min_health_no_healer: f32,
    /// Enemy must be this close for close-range stimmers
    pub close_range_trigger: f32,
    /// Ranged stimmers need strictly more health than this
    pub ranged_min_health: f32,
    pub ranged_min_health_no_healer: f32,
    pub ranged_trigger: f32,
}

impl Default for StimConfig {
    fn default() -> Self {
        Self {
            energy_per_stim: 5.0,
            close_range_min_health: 35.0,
            close_range_min_health_no_healer: 45.0,
            close_range_trigger: 64.0,
            ranged_min_health: 30.0,
            ranged_min_health_no_healer: 40.0,
            ranged_trigger: 160.0,
        }
    }
}

/// Worker allocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Target miners per mineral patch
    pub workers_per_patch: f32,
    /// Target gatherers per refinery
    pub workers_per_refinery: usize,
    /// Hard ceiling for `max_workers`
    pub absolute_max_workers: usize,
    /// Patches this close to a depot count toward its capacity
    pub depot_capacity_radius: f32,
    /// Patches this close to a depot are candidates for new miners
    pub patch_assignment_radius: f32,
    /// A carrying worker hands in cargo if a depot is this close
    pub return_cargo_range: f32,
    /// A carrying mover hands in cargo first if a depot is this close
    pub mover_return_range: f32,
    /// Hostiles this close to a gatherer trigger self-defense
    pub defense_trigger_radius: f32,
    /// Self-defense only applies this close to the worker's resource
    pub defense_leash: f32,
    /// Visible enemy fighters this close to a depot put its base in danger
    pub base_danger_radius: f32,
    /// A refinery needs a completed depot this close to deliver gas
    pub refinery_depot_radius: f32,
    /// Workers may repair damaged buildings
    pub repair_buildings: bool,
    /// Flee when worker health is at most this and the threat is melee
    pub flee_max_health: f32,
    /// Largest threat range still counted as melee
    pub melee_range: f32,
    /// Mineral-walk targets lie in this distance band from the worker
    pub flee_min_distance: f32,
    pub flee_max_distance: f32,
    /// Disable fleeing entirely; threatened gatherers always fight back
    pub never_flee: bool,
    /// Distance penalty for picking a builder or repairer that carries cargo
    pub builder_cargo_penalty: f32,
    pub repair_cargo_penalty: f32,
    /// Income projections (per worker per frame)
    pub minerals_per_worker_frame: f64,
    pub gas_per_worker_frame: f64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workers_per_patch: 2.0,
            workers_per_refinery: 3,
            absolute_max_workers: 75,
            depot_capacity_radius: 200.0,
            patch_assignment_radius: 300.0,
            return_cargo_range: 600.0,
            mover_return_range: 256.0,
            defense_trigger_radius: 65.0,
            defense_leash: 200.0,
            base_danger_radius: 320.0,
            refinery_depot_radius: 400.0,
            repair_buildings: true,
            flee_max_health: 16.0,
            melee_range: 32.0,
            flee_min_distance: 64.0,
            flee_max_distance: 400.0,
            never_flee: false,
            builder_cargo_penalty: 96.0,
            repair_cargo_penalty: 64.0,
            minerals_per_worker_frame: 0.045,
            gas_per_worker_frame: 0.07,
        }
    }
}

/// Per-tick wall-clock budget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Time allowed for one full tick (milliseconds)
    pub tick_millis: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self { tick_millis: 40.0 }
    }
}

/// Complete commander configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommanderConfig {
    pub spatial: SpatialConfig,
    pub cluster: ClusterConfig,
    pub combat: CombatConfig,
    pub squad: SquadConfig,
    pub workers: WorkerConfig,
    pub budget: BudgetConfig,
}

impl CommanderConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: CommanderConfig = toml::from_str(text)?;
        config.validate().map_err(CommanderError::InvalidConfig)?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.spatial.cell_size <= 0.0 {
            return Err(format!(
                "spatial.cell_size ({}) must be positive",
                self.spatial.cell_size
            ));
        }

        if self.cluster.start_radius <= 0.0 || self.cluster.radius_step < 0.0 {
            return Err("cluster radii must be positive".into());
        }

        if self.squad.max_supply_latch_off >= self.squad.max_supply_latch_on {
            return Err(format!(
                "squad.max_supply_latch_off ({}) should be < max_supply_latch_on ({})",
                self.squad.max_supply_latch_off, self.squad.max_supply_latch_on
            ));
        }

        if self.squad.clusters_per_phase == 0 || self.squad.max_combat_phases == 0 {
            return Err("combat phasing values must be at least 1".into());
        }

        if self.workers.workers_per_patch <= 0.0 {
            return Err("workers.workers_per_patch must be positive".into());
        }

        if self.workers.flee_min_distance >= self.workers.flee_max_distance {
            return Err("workers.flee_min_distance should be < flee_max_distance".into());
        }

        Ok(())
    }
}

/// Load a config file from disk
///
/// Missing sections and fields fall back to their defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<CommanderConfig> {
    let text = fs::read_to_string(path)?;
    CommanderConfig::from_toml_str(&text)
}
