//! Threat checks for gatherers

use crate::core::config::WorkerConfig;
use crate::core::types::UnitId;
use crate::spatial::SpatialIndex;
use crate::units::{UnitOrder, UnitRegistry, UnitSnapshot};

/// Closest enemy a worker could fight: visible, on the ground, completed,
/// and standing still, within the trigger radius
pub(crate) fn find_threat<'a>(
    worker: &UnitSnapshot,
    registry: &'a UnitRegistry,
    spatial: &SpatialIndex,
    config: &WorkerConfig,
) -> Option<&'a UnitSnapshot> {
    spatial
        .query(worker.position, config.defense_trigger_radius, false, true)
        .into_iter()
        .filter_map(|id| registry.get(id))
        .filter(|enemy| {
            enemy.completed
                && !enemy.flying
                && !enemy.cloaked
                && !matches!(enemy.order, UnitOrder::Move(_))
                && enemy.position.distance(&worker.position) < config.defense_trigger_radius
        })
        .min_by(|a, b| {
            a.position
                .distance_squared(&worker.position)
                .total_cmp(&b.position.distance_squared(&worker.position))
                .then(a.id.cmp(&b.id))
        })
}

/// Whether a threatened worker should run rather than fight
pub(crate) fn should_flee(worker: &UnitSnapshot, threat: &UnitSnapshot, registry: &UnitRegistry, config: &WorkerConfig) -> bool {
    if config.never_flee {
        return false;
    }
    let range = registry.stats(threat).ground_range;
    let can_hurt = registry.stats(threat).has_ground_weapon();
    can_hurt && range <= config.melee_range && worker.health <= config.flee_max_health
}

/// Farthest visible mineral patch in the flee band, for mineral walking
/// through the threat
pub(crate) fn find_escape_patch(worker: &UnitSnapshot, registry: &UnitRegistry, config: &WorkerConfig) -> Option<UnitId> {
    registry
        .mineral_fields()
        .filter(|m| m.visible)
        .map(|m| (m.id, m.position.distance(&worker.position)))
        .filter(|(_, d)| *d > config.flee_min_distance && *d < config.flee_max_distance)
        .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(id, _)| id)
}
