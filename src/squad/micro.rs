//! Per-role unit control
//!
//! Each [`MicroController`] owns the squad members of one role and turns a
//! cluster's tactical status into unit commands. Controllers are swappable;
//! [`MicroGroups::standard`] wires the default set.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use serde::Serialize;

use crate::cluster::Cluster;
use crate::command::{CommandBuffer, UnitCommand};
use crate::core::config::SquadConfig;
use crate::core::types::{UnitId, Vec2};
use crate::spatial::SpatialIndex;
use crate::squad::order::{SquadOrder, SquadOrderType};
use crate::units::{UnitRegistry, UnitRole, UnitSnapshot, UnitStats};

/// Ground weapons longer than this count as ranged
const MELEE_RANGE: f32 = 32.0;
/// Siege units pack up once the nearest target is this far beyond their range
const UNSIEGE_MARGIN: f32 = 64.0;
/// Transports unload when this close to the drop point
const DROP_DISTANCE: f32 = 64.0;
/// Medics look for wounded allies this far away
const MEDIC_SEARCH_RADIUS: f32 = 320.0;

/// Which controller a unit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MicroRole {
    Melee,
    Ranged,
    AirToAir,
    Scourge,
    Tank,
    Lurker,
    Detector,
    Caster,
    Transport,
    Medic,
}

impl MicroRole {
    /// Detectors and transports move with the whole squad, not with a cluster
    pub fn is_clustered(&self) -> bool {
        !matches!(self, MicroRole::Detector | MicroRole::Transport)
    }
}

/// Route a unit type to its controller; `None` for units no controller drives
pub fn micro_role(stats: &UnitStats) -> Option<MicroRole> {
    match stats.role {
        UnitRole::Worker | UnitRole::Melee => Some(MicroRole::Melee),
        UnitRole::Ranged => Some(MicroRole::Ranged),
        UnitRole::AirToAir => Some(MicroRole::AirToAir),
        UnitRole::Scourge => Some(MicroRole::Scourge),
        UnitRole::Tank => Some(MicroRole::Tank),
        UnitRole::Lurker => Some(MicroRole::Lurker),
        UnitRole::Detector => Some(MicroRole::Detector),
        UnitRole::Caster => Some(MicroRole::Caster),
        UnitRole::Transport => Some(MicroRole::Transport),
        UnitRole::Medic => Some(MicroRole::Medic),
        UnitRole::Building | UnitRole::Resource => None,
        UnitRole::Other if stats.ground_range > MELEE_RANGE => Some(MicroRole::Ranged),
        UnitRole::Other if stats.has_weapon() => Some(MicroRole::Melee),
        UnitRole::Other => None,
    }
}

/// What controllers may look at while deciding
pub struct MicroContext<'a> {
    pub registry: &'a UnitRegistry,
    pub spatial: &'a SpatialIndex,
    pub order: &'a SquadOrder,
    pub config: &'a SquadConfig,
    /// Squad member closest to the order position
    pub vanguard: Option<Vec2>,
}

impl MicroContext<'_> {
    /// Visible enemies a cluster could engage: those near the cluster plus
    /// those inside the order's radius
    pub fn targets(&self, cluster: &Cluster) -> Vec<&UnitSnapshot> {
        let mut ids = self
            .spatial
            .query(cluster.center, cluster.radius + self.config.safe_distance, false, true);
        if self.order.radius > 0.0 {
            ids.extend(self.spatial.query(self.order.position, self.order.radius, false, true));
        }
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter()
            .filter_map(|id| self.registry.get(id))
            .filter(|e| e.is_alive() && e.visible && !e.observed_gone)
            .collect()
    }
}

/// A strategy for one role
pub trait MicroController: Debug {
    fn role(&self) -> MicroRole;

    fn units(&self) -> &[UnitId];

    fn set_units(&mut self, units: Vec<UnitId>);

    /// Fight, or otherwise carry out the order
    fn execute(&mut self, cluster: &Cluster, ctx: &MicroContext<'_>, commands: &mut CommandBuffer);

    /// Fall back toward `target`
    fn regroup(&mut self, target: Vec2, cluster: &Cluster, ctx: &MicroContext<'_>, commands: &mut CommandBuffer) {
        for unit in active(self.units(), cluster, ctx.registry) {
            commands.issue(UnitCommand::Move { unit: unit.id, to: target });
        }
    }

    /// Controllers that never fall back keep executing while their cluster regroups
    fn retreats(&self) -> bool {
        true
    }
}

/// Members of `cluster` among `units` that can take orders right now
fn active<'a>(
    units: &'a [UnitId],
    cluster: &'a Cluster,
    registry: &'a UnitRegistry,
) -> impl Iterator<Item = &'a UnitSnapshot> + 'a {
    units
        .iter()
        .filter(move |id| cluster.contains(**id))
        .filter_map(move |id| registry.get(*id))
        .filter(|u| u.is_alive() && u.has_valid_position())
}

fn can_hit(stats: &UnitStats, target: &UnitSnapshot) -> bool {
    if target.flying {
        stats.has_air_weapon()
    } else {
        stats.has_ground_weapon()
    }
}

fn range_against(stats: &UnitStats, target: &UnitSnapshot) -> f32 {
    if target.flying {
        stats.air_range
    } else {
        stats.ground_range
    }
}

fn nearest<'a>(from: Vec2, candidates: impl Iterator<Item = &'a UnitSnapshot>) -> Option<&'a UnitSnapshot> {
    candidates.min_by(|a, b| {
        a.position
            .distance_squared(&from)
            .total_cmp(&b.position.distance_squared(&from))
            .then(a.id.cmp(&b.id))
    })
}

/// How a fighter picks among targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPolicy {
    Nearest,
    /// Lowest health among targets in weapon range, else nearest
    WeakestInRange,
    /// Flyers first, then anything hittable
    AirFirst,
    /// Flyers only; ground targets are ignored
    AirOnly,
}

/// Units that attack whatever their policy prefers and attack-move otherwise
#[derive(Debug, Clone)]
pub struct FighterMicro {
    role: MicroRole,
    policy: TargetPolicy,
    units: Vec<UnitId>,
}

impl FighterMicro {
    pub fn new(role: MicroRole, policy: TargetPolicy) -> Self {
        Self {
            role,
            policy,
            units: Vec::new(),
        }
    }

    fn choose<'a>(&self, unit: &UnitSnapshot, stats: &UnitStats, targets: &[&'a UnitSnapshot]) -> Option<&'a UnitSnapshot> {
        let hittable = || targets.iter().copied().filter(|t| can_hit(stats, t));
        match self.policy {
            TargetPolicy::Nearest => nearest(unit.position, hittable()),
            TargetPolicy::WeakestInRange => hittable()
                .filter(|t| t.position.distance(&unit.position) <= range_against(stats, t) + MELEE_RANGE)
                .min_by(|a, b| {
                    a.effective_health()
                        .total_cmp(&b.effective_health())
                        .then(a.id.cmp(&b.id))
                })
                .or_else(|| nearest(unit.position, hittable())),
            TargetPolicy::AirFirst => {
                nearest(unit.position, hittable().filter(|t| t.flying)).or_else(|| nearest(unit.position, hittable()))
            }
            TargetPolicy::AirOnly => nearest(unit.position, hittable().filter(|t| t.flying)),
        }
    }
}

impl MicroController for FighterMicro {
    fn role(&self) -> MicroRole {
        self.role
    }

    fn units(&self) -> &[UnitId] {
        &self.units
    }

    fn set_units(&mut self, units: Vec<UnitId>) {
        self.units = units;
    }

    fn execute(&mut self, cluster: &Cluster, ctx: &MicroContext<'_>, commands: &mut CommandBuffer) {
        let targets = ctx.targets(cluster);
        for unit in active(&self.units, cluster, ctx.registry) {
            let stats = ctx.registry.stats(unit);
            match self.choose(unit, stats, &targets) {
                Some(target) => commands.issue(UnitCommand::Attack { unit: unit.id, target: target.id }),
                None if self.policy == TargetPolicy::AirOnly => {
                    commands.issue(UnitCommand::Move { unit: unit.id, to: ctx.order.position })
                }
                None => commands.issue(UnitCommand::AttackMove { unit: unit.id, to: ctx.order.position }),
            }
        }
    }
}

/// Units that deploy to fight: siege tanks, burrowing lurkers
#[derive(Debug, Clone)]
pub struct SiegeMicro {
    role: MicroRole,
    retreats: bool,
    units: Vec<UnitId>,
}

impl SiegeMicro {
    pub fn new(role: MicroRole, retreats: bool) -> Self {
        Self {
            role,
            retreats,
            units: Vec::new(),
        }
    }
}

impl MicroController for SiegeMicro {
    fn role(&self) -> MicroRole {
        self.role
    }

    fn units(&self) -> &[UnitId] {
        &self.units
    }

    fn set_units(&mut self, units: Vec<UnitId>) {
        self.units = units;
    }

    fn execute(&mut self, cluster: &Cluster, ctx: &MicroContext<'_>, commands: &mut CommandBuffer) {
        let targets = ctx.targets(cluster);
        for unit in active(&self.units, cluster, ctx.registry) {
            let stats = ctx.registry.stats(unit);
            let target = nearest(unit.position, targets.iter().copied().filter(|t| !t.flying));
            let distance = target.map(|t| t.position.distance(&unit.position));
            match (target, distance) {
                (Some(target), Some(d)) if d <= stats.ground_range => {
                    commands.issue(UnitCommand::Siege { unit: unit.id });
                    commands.issue(UnitCommand::Attack { unit: unit.id, target: target.id });
                }
                (Some(_), Some(d)) if d <= stats.ground_range + UNSIEGE_MARGIN => {
                    // Close enough to wait for the enemy to walk in
                    commands.issue(UnitCommand::Siege { unit: unit.id });
                }
                _ => {
                    commands.issue(UnitCommand::Unsiege { unit: unit.id });
                    commands.issue(UnitCommand::AttackMove { unit: unit.id, to: ctx.order.position });
                }
            }
        }
    }

    fn regroup(&mut self, target: Vec2, cluster: &Cluster, ctx: &MicroContext<'_>, commands: &mut CommandBuffer) {
        for unit in active(&self.units, cluster, ctx.registry) {
            commands.issue(UnitCommand::Unsiege { unit: unit.id });
            commands.issue(UnitCommand::Move { unit: unit.id, to: target });
        }
    }

    fn retreats(&self) -> bool {
        self.retreats
    }
}

/// Units that stay with the group without fighting: detectors and casters
#[derive(Debug, Clone)]
pub struct FollowerMicro {
    role: MicroRole,
    units: Vec<UnitId>,
}

impl FollowerMicro {
    pub fn new(role: MicroRole) -> Self {
        Self { role, units: Vec::new() }
    }
}

impl MicroController for FollowerMicro {
    fn role(&self) -> MicroRole {
        self.role
    }

    fn units(&self) -> &[UnitId] {
        &self.units
    }

    fn set_units(&mut self, units: Vec<UnitId>) {
        self.units = units;
    }

    fn execute(&mut self, cluster: &Cluster, ctx: &MicroContext<'_>, commands: &mut CommandBuffer) {
        // Detectors lead from the front; everyone else keeps to the middle
        let goal = match self.role {
            MicroRole::Detector => ctx.vanguard.unwrap_or(cluster.center),
            _ => cluster.center,
        };
        for unit in active(&self.units, cluster, ctx.registry) {
            commands.issue(UnitCommand::Move { unit: unit.id, to: goal });
        }
    }
}

/// Transports follow the squad, or carry out a drop
#[derive(Debug, Clone, Default)]
pub struct TransportMicro {
    units: Vec<UnitId>,
}

impl MicroController for TransportMicro {
    fn role(&self) -> MicroRole {
        MicroRole::Transport
    }

    fn units(&self) -> &[UnitId] {
        &self.units
    }

    fn set_units(&mut self, units: Vec<UnitId>) {
        self.units = units;
    }

    fn execute(&mut self, cluster: &Cluster, ctx: &MicroContext<'_>, commands: &mut CommandBuffer) {
        for transport in active(&self.units, cluster, ctx.registry) {
            if ctx.order.kind != SquadOrderType::Drop {
                commands.issue(UnitCommand::Move { unit: transport.id, to: cluster.center });
            } else if transport.position.distance(&ctx.order.position) <= DROP_DISTANCE {
                commands.issue(UnitCommand::UnloadAll { transport: transport.id, at: ctx.order.position });
            } else {
                commands.issue(UnitCommand::Move { unit: transport.id, to: ctx.order.position });
            }
        }
    }
}

/// Medics walk to the closest wounded ally, else to the front
#[derive(Debug, Clone, Default)]
pub struct MedicMicro {
    units: Vec<UnitId>,
}

impl MedicMicro {
    /// Energy available across all medics, the budget for stim healing
    pub fn total_energy(&self, registry: &UnitRegistry) -> f32 {
        self.units
            .iter()
            .filter_map(|id| registry.get(*id))
            .filter(|m| m.is_alive())
            .map(|m| m.energy)
            .sum()
    }
}

impl MicroController for MedicMicro {
    fn role(&self) -> MicroRole {
        MicroRole::Medic
    }

    fn units(&self) -> &[UnitId] {
        &self.units
    }

    fn set_units(&mut self, units: Vec<UnitId>) {
        self.units = units;
    }

    fn execute(&mut self, cluster: &Cluster, ctx: &MicroContext<'_>, commands: &mut CommandBuffer) {
        let registry = ctx.registry;
        let front = ctx.vanguard.unwrap_or(cluster.center);
        for medic in active(&self.units, cluster, registry) {
            let wounded = ctx
                .spatial
                .query(medic.position, MEDIC_SEARCH_RADIUS, true, false)
                .into_iter()
                .filter(|id| *id != medic.id)
                .filter_map(|id| registry.get(id))
                .filter(|u| {
                    let stats = registry.stats(u);
                    !u.flying && !stats.is_building && u.health < stats.max_health
                });
            let goal = nearest(medic.position, wounded).map_or(front, |u| u.position);
            commands.issue(UnitCommand::Move { unit: medic.id, to: goal });
        }
    }
}

/// All of a squad's controllers
#[derive(Debug)]
pub struct MicroGroups {
    controllers: Vec<Box<dyn MicroController>>,
    medics: MedicMicro,
}

impl Default for MicroGroups {
    fn default() -> Self {
        Self::standard()
    }
}

impl MicroGroups {
    /// The default controller for every role
    pub fn standard() -> Self {
        Self {
            controllers: vec![
                Box::new(FighterMicro::new(MicroRole::Melee, TargetPolicy::Nearest)),
                Box::new(FighterMicro::new(MicroRole::Ranged, TargetPolicy::WeakestInRange)),
                Box::new(FighterMicro::new(MicroRole::AirToAir, TargetPolicy::AirFirst)),
                Box::new(FighterMicro::new(MicroRole::Scourge, TargetPolicy::AirOnly)),
                Box::new(SiegeMicro::new(MicroRole::Tank, true)),
                // Lurkers fight where they stand; retreating unburrows them too often
                Box::new(SiegeMicro::new(MicroRole::Lurker, false)),
                Box::new(FollowerMicro::new(MicroRole::Detector)),
                Box::new(FollowerMicro::new(MicroRole::Caster)),
                Box::new(TransportMicro::default()),
            ],
            medics: MedicMicro::default(),
        }
    }

    /// Replace the controller for a role
    pub fn with_controller(mut self, controller: Box<dyn MicroController>) -> Self {
        let role = controller.role();
        self.controllers.retain(|c| c.role() != role);
        self.controllers.push(controller);
        self
    }

    /// Hand every unit to the controller for its role
    pub fn assign(&mut self, units: &BTreeSet<UnitId>, registry: &UnitRegistry) {
        let mut by_role: BTreeMap<MicroRole, Vec<UnitId>> = BTreeMap::new();
        for unit in units.iter().filter_map(|id| registry.get(*id)) {
            if !unit.completed || !unit.is_alive() || !unit.has_valid_position() {
                continue;
            }
            if let Some(role) = micro_role(registry.stats(unit)) {
                by_role.entry(role).or_default().push(unit.id);
            }
        }
        for controller in &mut self.controllers {
            controller.set_units(by_role.remove(&controller.role()).unwrap_or_default());
        }
        self.medics.set_units(by_role.remove(&MicroRole::Medic).unwrap_or_default());
    }

    pub fn units_of(&self, role: MicroRole) -> &[UnitId] {
        if role == MicroRole::Medic {
            return self.medics.units();
        }
        self.controllers
            .iter()
            .find(|c| c.role() == role)
            .map(|c| c.units())
            .unwrap_or(&[])
    }

    pub fn medic_energy(&self, registry: &UnitRegistry) -> f32 {
        self.medics.total_energy(registry)
    }

    pub fn execute(&mut self, cluster: &Cluster, ctx: &MicroContext<'_>, commands: &mut CommandBuffer) {
        for controller in self.controllers.iter_mut().filter(|c| c.role().is_clustered()) {
            controller.execute(cluster, ctx, commands);
        }
    }

    pub fn regroup(&mut self, target: Vec2, cluster: &Cluster, ctx: &MicroContext<'_>, commands: &mut CommandBuffer) {
        for controller in self.controllers.iter_mut().filter(|c| c.role().is_clustered()) {
            if controller.retreats() {
                controller.regroup(target, cluster, ctx, commands);
            } else {
                controller.execute(cluster, ctx, commands);
            }
        }
    }

    /// Medics tend the cluster whatever its status
    pub fn support(&mut self, cluster: &Cluster, ctx: &MicroContext<'_>, commands: &mut CommandBuffer) {
        self.medics.execute(cluster, ctx, commands);
    }

    /// Controllers that move with the whole squad rather than a cluster
    pub fn execute_unclustered(&mut self, squad: &Cluster, ctx: &MicroContext<'_>, commands: &mut CommandBuffer) {
        for controller in self.controllers.iter_mut().filter(|c| !c.role().is_clustered()) {
            controller.execute(squad, ctx, commands);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::UnitTypeId;

    #[test]
    fn test_roles_route_to_controllers() {
        let mut stats = UnitStats::new(UnitTypeId(1), "Marine", UnitRole::Ranged);
        assert_eq!(micro_role(&stats), Some(MicroRole::Ranged));
        stats.role = UnitRole::Worker;
        assert_eq!(micro_role(&stats), Some(MicroRole::Melee));
        stats.role = UnitRole::Building;
        assert_eq!(micro_role(&stats), None);
    }

    #[test]
    fn test_unlabelled_units_route_by_range() {
        let mut stats = UnitStats::new(UnitTypeId(1), "Thing", UnitRole::Other);
        assert_eq!(micro_role(&stats), None);
        stats.ground_dpf = 1.0;
        stats.ground_range = 15.0;
        assert_eq!(micro_role(&stats), Some(MicroRole::Melee));
        stats.ground_range = 160.0;
        assert_eq!(micro_role(&stats), Some(MicroRole::Ranged));
    }

    #[test]
    fn test_transports_and_detectors_are_unclustered() {
        assert!(!MicroRole::Transport.is_clustered());
        assert!(!MicroRole::Detector.is_clustered());
        assert!(MicroRole::Medic.is_clustered());
    }
}
