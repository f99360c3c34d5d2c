//! A named group of units under one standing order

use std::collections::BTreeSet;

use serde::Serialize;

use crate::cluster::{Cluster, ClusterStatus, UnitClusterer};
use crate::combat::CombatPredictor;
use crate::command::{CommandBuffer, UnitCommand};
use crate::core::config::{CommanderConfig, SquadConfig};
use crate::core::types::{UnitId, Vec2};
use crate::oracle::{DebugSink, TerrainOracle};
use crate::spatial::SpatialIndex;
use crate::squad::micro::{micro_role, MicroContext, MicroGroups, MicroRole};
use crate::squad::order::{SquadOrder, SquadOrderType};
use crate::squad::stim::stim_if_needed;
use crate::units::{UnitRegistry, UnitSnapshot};
use crate::workers::WorkerAllocator;

/// World state a squad reads during its update
pub struct SquadContext<'a> {
    pub registry: &'a UnitRegistry,
    pub spatial: &'a SpatialIndex,
    pub terrain: &'a dyn TerrainOracle,
    /// Workers currently on minerals, for the max-supply latch
    pub mineral_workers: usize,
}

/// What the squad's members can do, recomputed every update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SquadCapabilities {
    /// Flyers other than mobile detectors
    pub has_air: bool,
    pub has_ground: bool,
    pub can_attack_air: bool,
    pub can_attack_ground: bool,
}

/// Long-lived group of units
///
/// Units join and leave only through [`Squad::add_unit`] and
/// [`Squad::remove_unit`] (normally via [`SquadData`](super::SquadData)).
/// Clusters are rebuilt on every update and handed back to the caller;
/// the squad keeps nothing from them but counts and the last sim score.
#[derive(Debug)]
pub struct Squad {
    pub(super) name: String,
    pub(super) order: SquadOrder,
    pub(super) priority: u32,
    /// Combat squads fight; pool squads just hold units
    pub(super) combat: bool,
    pub(super) units: BTreeSet<UnitId>,
    pub(super) caps: SquadCapabilities,
    /// Members that passed the threat-proximity test this update
    pub(super) near_enemy: BTreeSet<UnitId>,
    /// Attack regardless while supply is near the cap
    pub(super) attack_at_max: bool,
    pub(super) last_score: f64,
    pub(super) regroup_status: String,
    pub(super) cluster_count: usize,
    pub(super) fight_visible_only: bool,
    pub(super) meat_grinder: bool,
    pub(super) unload_pending: bool,
    pub(super) micro: MicroGroups,
    pub(super) clusterer: UnitClusterer,
    pub(super) predictor: CombatPredictor,
    pub(super) config: SquadConfig,
}

impl Squad {
    /// A combat squad
    pub fn new(name: impl Into<String>, order: SquadOrder, priority: u32, config: &CommanderConfig) -> Self {
        Self {
            name: name.into(),
            order,
            priority,
            combat: true,
            units: BTreeSet::new(),
            caps: SquadCapabilities::default(),
            near_enemy: BTreeSet::new(),
            attack_at_max: false,
            last_score: 0.0,
            regroup_status: String::new(),
            cluster_count: 0,
            fight_visible_only: false,
            meat_grinder: false,
            unload_pending: false,
            micro: MicroGroups::standard(),
            clusterer: UnitClusterer::new(&config.cluster),
            predictor: CombatPredictor::new(&config.combat),
            config: config.squad.clone(),
        }
    }

    /// A holding pool: members are kept but never fight as a squad
    pub fn pool(name: impl Into<String>, order: SquadOrder, priority: u32, config: &CommanderConfig) -> Self {
        Self {
            combat: false,
            ..Self::new(name, order, priority, config)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> &SquadOrder {
        &self.order
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: u32) {
        self.priority = priority;
    }

    pub fn is_combat(&self) -> bool {
        self.combat
    }

    pub fn units(&self) -> &BTreeSet<UnitId> {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn contains(&self, unit: UnitId) -> bool {
        self.units.contains(&unit)
    }

    pub fn capabilities(&self) -> SquadCapabilities {
        self.caps
    }

    pub fn last_score(&self) -> f64 {
        self.last_score
    }

    pub fn regroup_status(&self) -> &str {
        &self.regroup_status
    }

    pub fn attack_at_max(&self) -> bool {
        self.attack_at_max
    }

    pub fn micro(&self) -> &MicroGroups {
        &self.micro
    }

    /// Swap in custom controllers
    pub fn set_micro(&mut self, micro: MicroGroups) {
        self.micro = micro;
    }

    /// Judge fights on visible enemies only, instead of everything remembered
    pub fn set_fight_visible_only(&mut self, visible_only: bool) {
        self.fight_visible_only = visible_only;
    }

    /// Score fights by trading efficiency rather than survivors
    pub fn set_meat_grinder(&mut self, meat_grinder: bool) {
        self.meat_grinder = meat_grinder;
    }

    /// Adopt a new order
    ///
    /// Leaving a load or drop order unloads the transports on the next update.
    pub fn set_order(&mut self, order: SquadOrder) {
        let was_loading = matches!(self.order.kind, SquadOrderType::Load | SquadOrderType::Drop);
        let still_loading = matches!(order.kind, SquadOrderType::Load | SquadOrderType::Drop);
        if was_loading && !still_loading {
            self.unload_pending = true;
        }
        tracing::debug!("Squad {} order {:?} -> {:?}", self.name, self.order.kind, order.kind);
        self.order = order;
    }

    pub fn add_unit(&mut self, unit: UnitId) -> bool {
        self.units.insert(unit)
    }

    /// Drop a member; a combat squad hands borrowed workers back
    pub fn remove_unit(&mut self, unit: UnitId, registry: &UnitRegistry, workers: &mut WorkerAllocator) -> bool {
        if !self.units.remove(&unit) {
            return false;
        }
        self.near_enemy.remove(&unit);
        if self.combat && registry.stats_of(unit).is_some_and(|s| s.is_worker) {
            workers.finished_with_worker(unit);
        }
        true
    }

    /// Hand every borrowed worker back to the allocator
    pub fn release_workers(&mut self, registry: &UnitRegistry, workers: &mut WorkerAllocator) {
        let borrowed: Vec<UnitId> = self
            .units
            .iter()
            .copied()
            .filter(|id| registry.stats_of(*id).is_some_and(|s| s.is_worker))
            .collect();
        for worker in borrowed {
            self.remove_unit(worker, registry, workers);
        }
    }

    /// Remove every member, returning them
    pub fn clear(&mut self, registry: &UnitRegistry, workers: &mut WorkerAllocator) -> Vec<UnitId> {
        let members: Vec<UnitId> = self.units.iter().copied().collect();
        for unit in &members {
            self.remove_unit(*unit, registry, workers);
        }
        members
    }

    /// One-line summary for debug displays
    pub fn status(&self) -> String {
        format!(
            "{} {} {}: {} units, {} clusters, sim {:.1} {}",
            self.order.kind.code(),
            self.name,
            self.order.status,
            self.units.len(),
            self.cluster_count,
            self.last_score,
            self.regroup_status
        )
    }

    /// Run one tick: refresh members, then cluster, classify and act
    ///
    /// Returns this tick's clusters with their statuses set.
    pub fn update(
        &mut self,
        ctx: &SquadContext<'_>,
        workers: &mut WorkerAllocator,
        commands: &mut CommandBuffer,
        debug: &mut dyn DebugSink,
    ) -> Vec<Cluster> {
        self.update_units(ctx, workers);
        self.cluster_count = 0;
        if self.units.is_empty() || !self.combat {
            return Vec::new();
        }

        if self.unload_pending {
            self.unload_transports(ctx.registry, commands);
            self.unload_pending = false;
        }
        match self.order.kind {
            SquadOrderType::Idle => return Vec::new(),
            SquadOrderType::Load => {
                self.load_transports(ctx.registry, commands);
                return Vec::new();
            }
            _ => {}
        }

        let registry = ctx.registry;
        let now = registry.now();
        stim_if_needed(&self.micro, registry, ctx.spatial, &self.config.stim, now, commands);

        let vanguard = self
            .unit_closest_to_order(self.units.iter().copied(), ctx)
            .map(|u| u.position);
        if let Some(whole) = self.whole_squad_cluster(registry) {
            let mctx = MicroContext {
                registry,
                spatial: ctx.spatial,
                order: &self.order,
                config: &self.config,
                vanguard,
            };
            self.micro.execute_unclustered(&whole, &mctx, commands);
        }

        let to_cluster: Vec<UnitId> = self
            .units
            .iter()
            .copied()
            .filter(|id| {
                registry.get(*id).is_some_and(|u| u.completed && u.has_valid_position())
                    && registry
                        .stats_of(*id)
                        .and_then(micro_role)
                        .map_or(true, |role| role.is_clustered())
            })
            .collect();
        let mut clusters = self.clusterer.cluster(to_cluster, registry);
        self.cluster_count = clusters.len();

        for i in 0..clusters.len() {
            let status = self.classify(&clusters[i], &clusters, ctx, commands);
            clusters[i].status = status;
        }

        // Many clusters make the combat step slow; spread them over frames
        let phases = (clusters.len() / self.config.clusters_per_phase.max(1)).clamp(1, self.config.max_combat_phases.max(1));
        let in_phase: Vec<(usize, Option<Vec2>)> = (0..clusters.len())
            .filter(|i| (now as usize + i) % phases == 0)
            .map(|i| {
                let target = (clusters[i].status == ClusterStatus::Regroup)
                    .then(|| self.calc_regroup_position(&clusters[i], &clusters, ctx));
                (i, target)
            })
            .collect();

        let mctx = MicroContext {
            registry,
            spatial: ctx.spatial,
            order: &self.order,
            config: &self.config,
            vanguard,
        };
        for (i, target) in in_phase {
            let cluster = &clusters[i];
            match (cluster.status, target) {
                (ClusterStatus::Regroup, Some(target)) => {
                    debug.draw_line(cluster.center, target);
                    self.micro.regroup(target, cluster, &mctx, commands);
                }
                (ClusterStatus::Attack, _) => self.micro.execute(cluster, &mctx, commands),
                _ => {}
            }
            self.micro.support(cluster, &mctx, commands);
        }

        for cluster in &clusters {
            debug.draw_circle(
                cluster.center,
                cluster.radius,
                &format!("{} {}", self.name, cluster.status.label()),
            );
        }
        clusters
    }

    /// Prune dead or lost members and recompute everything derived from them
    fn update_units(&mut self, ctx: &SquadContext<'_>, workers: &mut WorkerAllocator) {
        let registry = ctx.registry;
        self.units
            .retain(|id| registry.get(*id).is_some_and(|u| u.is_alive() && u.is_own()));

        self.caps = SquadCapabilities::default();
        self.near_enemy.clear();
        for unit in self.units.iter().filter_map(|id| registry.get(*id)) {
            let stats = registry.stats(unit);
            if unit.flying {
                self.caps.has_air |= !stats.is_detector;
            } else {
                self.caps.has_ground = true;
            }
            self.caps.can_attack_air |= stats.has_air_weapon();
            self.caps.can_attack_ground |= stats.has_ground_weapon();

            if unit.has_valid_position() && self.unit_near_enemy(unit, registry) {
                self.near_enemy.insert(unit.id);
            }
            if self.combat && stats.is_worker {
                workers.set_combat_worker(unit.id);
            }
        }

        self.micro.assign(&self.units, registry);
    }

    /// Pseudo-cluster of every positioned member, for controllers that
    /// follow the squad as a whole
    fn whole_squad_cluster(&self, registry: &UnitRegistry) -> Option<Cluster> {
        let members: Vec<&UnitSnapshot> = self
            .units
            .iter()
            .filter_map(|id| registry.get(*id))
            .filter(|u| u.has_valid_position())
            .collect();
        let center = Vec2::centroid(members.iter().map(|u| u.position))?;
        let radius = members
            .iter()
            .map(|u| u.position.distance(&center))
            .fold(0.0, f32::max);
        let ids = members.iter().map(|u| u.id).collect();
        Some(Cluster::from_members(ids, center, radius, false, registry))
    }

    /// Walk troopers to the pickup point and fill each transport one unit per tick
    fn load_transports(&self, registry: &UnitRegistry, commands: &mut CommandBuffer) {
        let transports = self.micro.units_of(MicroRole::Transport);
        let mut waiting: Vec<&UnitSnapshot> = self
            .units
            .iter()
            .filter(|id| !transports.contains(id))
            .filter_map(|id| registry.get(*id))
            .filter(|u| u.is_alive() && u.loaded_into.is_none() && registry.stats(u).space_provided == 0)
            .collect();
        for trooper in &waiting {
            commands.issue(UnitCommand::Move { unit: trooper.id, to: self.order.position });
        }

        for transport in transports.iter().filter_map(|id| registry.get(*id)) {
            let capacity = registry.stats(transport).space_provided as usize;
            let aboard = self
                .units
                .iter()
                .filter_map(|id| registry.get(*id))
                .filter(|u| u.loaded_into == Some(transport.id))
                .count();
            if aboard >= capacity || waiting.is_empty() {
                continue;
            }
            let passenger = waiting.remove(0);
            commands.issue(UnitCommand::Load { unit: passenger.id, transport: transport.id });
        }
    }

    fn unload_transports(&self, registry: &UnitRegistry, commands: &mut CommandBuffer) {
        for transport in self.units.iter().filter_map(|id| registry.get(*id)) {
            let carrying = self
                .units
                .iter()
                .filter_map(|id| registry.get(*id))
                .any(|u| u.loaded_into == Some(transport.id));
            if carrying {
                commands.issue(UnitCommand::UnloadAll { transport: transport.id, at: transport.position });
            }
        }
    }

    /// Set one cluster's status, taking the non-combat actions on the way
    fn classify(
        &mut self,
        cluster: &Cluster,
        clusters: &[Cluster],
        ctx: &SquadContext<'_>,
        commands: &mut CommandBuffer,
    ) -> ClusterStatus {
        let registry = ctx.registry;
        let armed = cluster
            .units
            .iter()
            .any(|id| registry.stats_of(*id).is_some_and(|s| s.has_weapon()));

        if !armed {
            if self.join_up(cluster, clusters, registry, commands) {
                self.regroup_status = "Join up".into();
                return ClusterStatus::Advance;
            }
            let fallback = self.final_regroup_position(ctx);
            self.move_cluster(cluster, fallback, registry, commands);
            self.regroup_status = "Fall back".into();
            return ClusterStatus::Regroup;
        }

        if !cluster.units.iter().any(|id| self.near_enemy.contains(id)) {
            if self.join_up(cluster, clusters, registry, commands) {
                self.regroup_status = "Join up".into();
            } else {
                self.move_cluster(cluster, self.order.position, registry, commands);
                self.regroup_status = "Advance".into();
            }
            return ClusterStatus::Advance;
        }

        if self.needs_to_regroup(cluster, ctx) {
            ClusterStatus::Regroup
        } else {
            ClusterStatus::Attack
        }
    }

    /// Move every cluster member, packing up deployed units first
    pub(super) fn move_cluster(&self, cluster: &Cluster, to: Vec2, registry: &UnitRegistry, commands: &mut CommandBuffer) {
        for unit in cluster.units.iter().filter_map(|id| registry.get(*id)) {
            if !unit.has_valid_position() {
                continue;
            }
            if registry.stats(unit).siege_capable || micro_role(registry.stats(unit)) == Some(MicroRole::Lurker) {
                commands.issue(UnitCommand::Unsiege { unit: unit.id });
            }
            commands.issue(UnitCommand::Move { unit: unit.id, to });
        }
    }
}
