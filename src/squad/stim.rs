//! Stimulant use before a fight

use crate::command::{CommandBuffer, UnitCommand};
use crate::core::config::StimConfig;
use crate::core::types::Tick;
use crate::spatial::SpatialIndex;
use crate::squad::micro::{MicroGroups, MicroRole};
use crate::units::UnitRegistry;

struct StimRule {
    role: MicroRole,
    min_health: f32,
    min_health_no_healer: f32,
    trigger: f32,
    /// Health must be strictly above `min_health`
    strict: bool,
}

/// Stim units that are about to fight and can afford the hit points
///
/// Close-range stimmers go first since they are the ones already in
/// contact. Every stim draws down the medics' energy budget; once it is
/// spent, the higher health thresholds apply. Returns the number of stims.
pub fn stim_if_needed(
    micro: &MicroGroups,
    registry: &UnitRegistry,
    spatial: &SpatialIndex,
    config: &StimConfig,
    now: Tick,
    commands: &mut CommandBuffer,
) -> usize {
    let rules = [
        StimRule {
            role: MicroRole::Melee,
            min_health: config.close_range_min_health,
            min_health_no_healer: config.close_range_min_health_no_healer,
            trigger: config.close_range_trigger,
            strict: false,
        },
        StimRule {
            role: MicroRole::Ranged,
            min_health: config.ranged_min_health,
            min_health_no_healer: config.ranged_min_health_no_healer,
            trigger: config.ranged_trigger,
            strict: true,
        },
    ];

    let mut energy = micro.medic_energy(registry);
    let mut stims = 0;
    for rule in &rules {
        for unit in micro.units_of(rule.role).iter().filter_map(|id| registry.get(*id)) {
            if !registry.stats(unit).can_stim || !unit.has_valid_position() || unit.is_stimmed(now) {
                continue;
            }
            let enough = if rule.strict {
                unit.health > rule.min_health
            } else {
                unit.health >= rule.min_health
            };
            if !enough || (energy <= 0.0 && unit.health < rule.min_health_no_healer) {
                continue;
            }
            if spatial.query(unit.position, rule.trigger, false, true).is_empty() {
                continue;
            }
            commands.issue(UnitCommand::Stim { unit: unit.id });
            energy -= config.energy_per_stim;
            stims += 1;
        }
    }
    stims
}
