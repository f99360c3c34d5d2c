//! Per-tick worker job management
//!
//! Pass order within a tick:
//! status reconciliation -> gas -> idle dispatch -> cargo return ->
//! movers -> repair -> mining enforcement.
//! Repair and mining enforcement are the first to be skipped when the tick
//! is over budget.

use crate::command::{CommandBuffer, UnitCommand};
use crate::core::config::WorkerConfig;
use crate::core::types::{Owner, UnitId, UnitTypeId, Vec2};
use crate::oracle::ProductionOracle;
use crate::spatial::SpatialIndex;
use crate::units::{closest, UnitOrder, UnitRegistry, UnitSnapshot};
use crate::workers::data::WorkerData;
use crate::workers::defense::{find_escape_patch, find_threat, should_flee};
use crate::workers::job::{JobKind, WorkerJob};

/// Owns every worker's job and every depot's capacity accounting
#[derive(Debug, Clone)]
pub struct WorkerAllocator {
    config: WorkerConfig,
    data: WorkerData,
    collect_gas: bool,
}

impl WorkerAllocator {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            config: config.clone(),
            data: WorkerData::new(),
            collect_gas: true,
        }
    }

    pub fn data(&self) -> &WorkerData {
        &self.data
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn job(&self, worker: UnitId) -> Option<WorkerJob> {
        self.data.job(worker)
    }

    pub fn collect_gas(&self) -> bool {
        self.collect_gas
    }

    pub fn set_collect_gas(&mut self, collect: bool) {
        if collect != self.collect_gas {
            tracing::info!("Gas collection {}", if collect { "enabled" } else { "disabled" });
        }
        self.collect_gas = collect;
    }

    // === UNIT LIFECYCLE ===

    /// A unit appeared (created, shown, or changed hands to us)
    pub fn on_unit_added(&mut self, unit: &UnitSnapshot, registry: &UnitRegistry) {
        if unit.owner != Owner::Own {
            return;
        }
        let stats = registry.stats(unit);
        if stats.is_worker && unit.is_alive() {
            self.data.add_worker(unit.id);
        }
        if stats.is_depot && unit.completed {
            self.data.add_depot(unit.id);
        }
    }

    /// A unit changed type; a worker that became a building is no longer a worker
    pub fn on_unit_morphed(&mut self, unit: &UnitSnapshot, registry: &UnitRegistry) {
        if unit.owner != Owner::Own {
            return;
        }
        let stats = registry.stats(unit);
        if stats.is_building && self.data.contains(unit.id) {
            self.data.remove_worker(unit.id);
        } else {
            self.on_unit_added(unit, registry);
        }
    }

    /// A unit was destroyed or left our control
    pub fn on_unit_removed(&mut self, unit: &UnitSnapshot, registry: &UnitRegistry) {
        let stats = registry.stats(unit);
        if self.data.contains(unit.id) {
            self.data.remove_worker(unit.id);
        }
        if stats.is_depot && self.data.has_depot(unit.id) {
            let demoted = self.data.remove_depot(unit.id);
            tracing::info!("Depot {} lost; {} workers released", unit.id, demoted.len());
        }
        if stats.is_refinery {
            self.data.remove_refinery(unit.id);
        }
        if stats.is_mineral_field {
            let demoted = self.data.remove_patch(unit.id);
            tracing::debug!("Mineral patch {} gone; {} miners released", unit.id, demoted.len());
            self.rebalance(registry);
        }
    }

    /// Release miners whose depot is missing or over capacity
    pub fn rebalance(&mut self, registry: &UnitRegistry) {
        for worker in self.data.workers_with(JobKind::Mining) {
            if let Some(WorkerJob::Mining { depot, .. }) = self.data.job(worker) {
                if !self.data.has_depot(depot) || self.data.is_depot_full(depot, registry, &self.config) {
                    self.data.set_job(worker, WorkerJob::Idle);
                }
            }
        }
    }

    // === REQUESTS FROM OTHER COMPONENTS ===

    /// Hand a worker to a combat squad
    pub fn set_combat_worker(&mut self, worker: UnitId) {
        if self.data.contains(worker) {
            self.data.set_job(worker, WorkerJob::Combat);
        }
    }

    /// A borrowing component is done with a worker
    pub fn finished_with_worker(&mut self, worker: UnitId) {
        if self.data.contains(worker) {
            self.data.set_job(worker, WorkerJob::Idle);
        }
    }

    pub fn set_scout_worker(&mut self, worker: UnitId) {
        if self.data.contains(worker) {
            self.data.set_job(worker, WorkerJob::Scout);
        }
    }

    pub fn scout_worker(&self) -> Option<UnitId> {
        self.data.workers_with(JobKind::Scout).first().copied()
    }

    pub fn set_building_worker(&mut self, worker: UnitId, building: UnitTypeId) {
        if self.data.contains(worker) {
            self.data.set_job(worker, WorkerJob::Building { building });
        }
    }

    /// Send a worker toward a build site, holding back what it will spend
    pub fn set_move_worker(&mut self, worker: UnitId, minerals: u32, gas: u32, to: Vec2) {
        if self.data.contains(worker) {
            self.data.set_job(worker, WorkerJob::Moving { to, minerals, gas });
        }
    }

    /// Closest free worker to a position, preferring ones without cargo
    pub fn get_move_worker(&self, pos: Vec2, registry: &UnitRegistry) -> Option<UnitId> {
        self.closest_worker(pos, registry, self.config.builder_cargo_penalty, |job| job.is_free())
    }

    /// Pick a worker to construct at `pos`
    ///
    /// A worker already moving to a site is preferred; otherwise the
    /// closest free worker. With `assign`, the chosen worker's job becomes
    /// Building.
    pub fn get_builder(
        &mut self,
        pos: Vec2,
        building: UnitTypeId,
        registry: &UnitRegistry,
        assign: bool,
    ) -> Option<UnitId> {
        let penalty = self.config.builder_cargo_penalty;
        let chosen = self
            .closest_worker(pos, registry, penalty, |job| job.kind() == JobKind::Moving)
            .or_else(|| self.closest_worker(pos, registry, penalty, |job| job.is_free()))?;
        if assign {
            self.data.set_job(chosen, WorkerJob::Building { building });
        }
        Some(chosen)
    }

    fn closest_worker(
        &self,
        pos: Vec2,
        registry: &UnitRegistry,
        cargo_penalty: f32,
        accept: impl Fn(&WorkerJob) -> bool,
    ) -> Option<UnitId> {
        self.data
            .iter()
            .filter(|(_, job)| accept(job))
            .filter_map(|(id, _)| registry.get(id))
            .filter(|w| w.completed)
            .map(|w| {
                let busy = w.is_carrying() || matches!(w.order, UnitOrder::Gather { harvesting: true, .. });
                let penalty = if busy { cargo_penalty } else { 0.0 };
                (w.id, w.position.distance(&pos) + penalty)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(id, _)| id)
    }

    /// Will current income cover a cost within `frames`?
    pub fn will_have_resources(&self, minerals: u32, gas: u32, frames: f64, registry: &UnitRegistry) -> bool {
        let (reserved_minerals, reserved_gas) = self.data.reserved_resources();
        let need_minerals = minerals as f64 + reserved_minerals as f64 - registry.economy.minerals as f64;
        let need_gas = gas as f64 + reserved_gas as f64 - registry.economy.gas as f64;
        if need_minerals <= 0.0 && need_gas <= 0.0 {
            return true;
        }

        let mineral_income = self.data.count(JobKind::Mining) as f64 * self.config.minerals_per_worker_frame * frames;
        let gas_income = self.data.count(JobKind::Gas) as f64 * self.config.gas_per_worker_frame * frames;
        mineral_income >= need_minerals && gas_income >= need_gas
    }

    /// How many workers our bases can use
    pub fn max_workers(&self, registry: &UnitRegistry) -> usize {
        let patches: usize = registry
            .own_depots()
            .map(|d| registry.minerals_near(d.position, self.config.depot_capacity_radius).count())
            .sum();
        let refineries = registry.own_refineries().count();
        let wanted = 1.0
            + (self.config.workers_per_patch as f64 * patches as f64
                + self.config.workers_per_refinery as f64 * refineries as f64)
                .round();
        (wanted as usize).min(self.config.absolute_max_workers)
    }

    /// Debug line: one job code per worker, in id order
    pub fn job_codes(&self) -> String {
        self.data.iter().map(|(_, job)| job.code()).collect()
    }

    // === PER-TICK PASSES ===

    /// Run every pass; `degraded` skips repair and mining enforcement
    pub fn update(
        &mut self,
        registry: &UnitRegistry,
        spatial: &SpatialIndex,
        production: &dyn ProductionOracle,
        commands: &mut CommandBuffer,
        degraded: bool,
    ) {
        self.sync_depots(registry);
        self.reconcile(registry, spatial, production, commands);
        self.assign_gas(registry, commands);
        self.dispatch_idle(registry, commands);
        self.handle_return_cargo(registry, commands);
        self.handle_movers(registry, commands);
        if degraded {
            tracing::debug!("Worker pass degraded: skipping repair and mining enforcement");
            return;
        }
        self.dispatch_repair(registry, commands);
        self.enforce_mining(registry, commands);
    }

    /// Track new depots and drop depots that no longer exist
    pub fn sync_depots(&mut self, registry: &UnitRegistry) {
        for depot in registry.own_depots() {
            self.data.add_depot(depot.id);
        }
        for depot in self.data.depots() {
            let alive = registry
                .get(depot)
                .is_some_and(|d| d.owner == Owner::Own && d.is_alive());
            if !alive {
                let demoted = self.data.remove_depot(depot);
                tracing::warn!("Depot {} vanished without an event; {} workers released", depot, demoted.len());
            }
        }
    }

    /// Bring recorded jobs back in line with what workers are actually doing
    ///
    /// Returns the number of job changes made.
    pub fn reconcile(
        &mut self,
        registry: &UnitRegistry,
        spatial: &SpatialIndex,
        production: &dyn ProductionOracle,
        commands: &mut CommandBuffer,
    ) -> usize {
        let catch_idle_builders = !production.anything_being_built() && !production.next_is_building();
        let mut changes = 0;

        for id in self.data.workers() {
            let Some(worker) = registry.get(id) else {
                tracing::debug!("Worker {} no longer exists; dropping its record", id);
                self.data.remove_worker(id);
                changes += 1;
                continue;
            };
            if !worker.completed {
                continue;
            }
            let Some(job) = self.data.job(id) else {
                continue;
            };

            let idle = worker.order == UnitOrder::Idle;
            let demote = match job {
                WorkerJob::Unassigned => true,
                WorkerJob::Idle | WorkerJob::Combat | WorkerJob::Scout => false,
                WorkerJob::Building { .. } | WorkerJob::Moving { .. } => idle && catch_idle_builders,
                WorkerJob::Repairing { target } => {
                    idle || !registry.get(target).is_some_and(|t| {
                        t.is_alive() && t.health < registry.stats(t).max_health
                    })
                }
                WorkerJob::ReturningCargo { .. } => idle,
                WorkerJob::Gas { refinery } => {
                    let exists = registry.get(refinery).is_some_and(|r| r.is_alive() && !r.observed_gone);
                    if !exists {
                        true
                    } else if self.defend_self(worker, refinery, registry, spatial, commands) {
                        false
                    } else {
                        !is_gas_order(worker, registry)
                    }
                }
                WorkerJob::Mining { patch, .. } => {
                    let exists = registry.get(patch).is_some_and(|p| !p.observed_gone);
                    if !exists {
                        true
                    } else if self.defend_self(worker, patch, registry, spatial, commands) {
                        false
                    } else {
                        !is_mining_order(worker, registry)
                    }
                }
            };

            if demote && self.data.set_job(id, WorkerJob::Idle) {
                changes += 1;
            } else if self.data.job(id) != Some(job) {
                changes += 1;
            }
        }
        changes
    }

    /// Fight or flee if a threat is next to a gatherer near its resource
    fn defend_self(
        &mut self,
        worker: &UnitSnapshot,
        resource: UnitId,
        registry: &UnitRegistry,
        spatial: &SpatialIndex,
        commands: &mut CommandBuffer,
    ) -> bool {
        let near_resource = registry
            .get(resource)
            .is_some_and(|r| r.position.distance(&worker.position) < self.config.defense_leash);
        if !near_resource {
            return false;
        }
        let Some(threat) = find_threat(worker, registry, spatial, &self.config) else {
            return false;
        };

        if should_flee(worker, threat, registry, &self.config) {
            let escape = find_escape_patch(worker, registry, &self.config);
            if let (Some(patch), Some(WorkerJob::Mining { depot, .. })) = (escape, self.data.job(worker.id)) {
                tracing::debug!("Worker {} flees {} by walking to patch {}", worker.id, threat.id, patch);
                self.data.set_job(worker.id, WorkerJob::Mining { depot, patch });
                commands.issue(UnitCommand::Gather { unit: worker.id, target: patch });
                return true;
            }
        }

        commands.issue(UnitCommand::Attack { unit: worker.id, target: threat.id });
        true
    }

    /// Keep each usable refinery staffed, or pull everyone off gas
    pub fn assign_gas(&mut self, registry: &UnitRegistry, commands: &mut CommandBuffer) {
        if !self.collect_gas {
            for worker in self.data.workers_with(JobKind::Gas) {
                let inside = registry.get(worker).is_some_and(|w| inside_refinery(w, None));
                if !inside {
                    // Idle dispatch sends anyone carrying gas to hand it in
                    self.data.set_job(worker, WorkerJob::Idle);
                }
            }
            return;
        }

        let bases = registry.own_depots().count();
        let refineries: Vec<(UnitId, Vec2)> = registry.own_refineries().map(|r| (r.id, r.position)).collect();
        for (refinery, pos) in refineries {
            let depot = registry
                .closest_depot(pos)
                .filter(|d| d.position.distance(&pos) < self.config.refinery_depot_radius);
            let usable = depot.is_some_and(|d| bases == 1 || !self.base_in_danger(d.position, registry));

            if !usable {
                for worker in self.data.workers_with(JobKind::Gas) {
                    let holds = self.data.job(worker) == Some(WorkerJob::Gas { refinery });
                    let inside = registry.get(worker).is_some_and(|w| inside_refinery(w, Some(refinery)));
                    if holds && !inside {
                        self.data.set_job(worker, WorkerJob::Idle);
                    }
                }
                continue;
            }

            let assigned = self.data.refinery_assigned(refinery);
            for _ in assigned..self.config.workers_per_refinery {
                let Some(worker) = self.gas_candidate(pos, registry) else {
                    // Nobody free for this refinery means nobody for the rest either
                    return;
                };
                self.data.set_job(worker, WorkerJob::Gas { refinery });
                commands.issue(UnitCommand::Gather { unit: worker, target: refinery });
            }
        }
    }

    /// Closest free worker not holding or about to hold minerals
    fn gas_candidate(&self, pos: Vec2, registry: &UnitRegistry) -> Option<UnitId> {
        self.data
            .iter()
            .filter(|(_, job)| job.is_free())
            .filter_map(|(id, _)| registry.get(id))
            .filter(|w| {
                w.completed && !w.carrying_minerals && !matches!(w.order, UnitOrder::Gather { harvesting: true, .. })
            })
            .min_by(|a, b| {
                a.position
                    .distance_squared(&pos)
                    .total_cmp(&b.position.distance_squared(&pos))
                    .then(a.id.cmp(&b.id))
            })
            .map(|w| w.id)
    }

    fn base_in_danger(&self, depot_pos: Vec2, registry: &UnitRegistry) -> bool {
        let r2 = self.config.base_danger_radius * self.config.base_danger_radius;
        registry.enemy_units().any(|e| {
            e.visible
                && !e.observed_gone
                && registry.stats(e).has_ground_weapon()
                && e.position.distance_squared(&depot_pos) <= r2
        })
    }

    /// Put idle workers back to work
    pub fn dispatch_idle(&mut self, registry: &UnitRegistry, commands: &mut CommandBuffer) {
        for id in self.data.workers_with(JobKind::Idle) {
            let Some(worker) = registry.get(id) else {
                continue;
            };
            if !worker.completed {
                continue;
            }
            if worker.is_carrying() {
                if let Some(depot) = registry.closest_depot(worker.position) {
                    self.data.set_job(id, WorkerJob::ReturningCargo { depot: depot.id });
                }
            } else {
                self.set_mineral_worker(worker, registry, commands);
            }
        }
    }

    /// Assign a worker to mine at the closest depot with room; `false` if none has room
    fn set_mineral_worker(&mut self, worker: &UnitSnapshot, registry: &UnitRegistry, commands: &mut CommandBuffer) -> bool {
        let Some((depot, depot_pos)) = self.closest_open_depot(worker.position, registry) else {
            return false;
        };
        let Some(patch) = self.data.choose_patch(depot_pos, registry, &self.config) else {
            return false;
        };
        self.data.set_job(worker.id, WorkerJob::Mining { depot, patch });
        commands.issue(UnitCommand::Gather { unit: worker.id, target: patch });
        true
    }

    /// Closest completed depot that is not full and not in danger
    /// (danger is ignored when it is our only base)
    fn closest_open_depot(&self, pos: Vec2, registry: &UnitRegistry) -> Option<(UnitId, Vec2)> {
        let bases = registry.own_depots().count();
        let open = registry.own_depots().filter(|d| {
            (bases == 1 || !self.base_in_danger(d.position, registry))
                && !self.data.is_depot_full(d.id, registry, &self.config)
        });
        closest(open, pos).map(|d| (d.id, d.position))
    }

    /// Cargo carriers hand in at a nearby depot; the rest go mining
    pub fn handle_return_cargo(&mut self, registry: &UnitRegistry, commands: &mut CommandBuffer) {
        for id in self.data.workers_with(JobKind::ReturningCargo) {
            let Some(worker) = registry.get(id) else {
                continue;
            };
            let depot_in_range = registry
                .closest_depot(worker.position)
                .is_some_and(|d| d.position.distance(&worker.position) < self.config.return_cargo_range);
            if worker.is_carrying() && depot_in_range {
                commands.issue(UnitCommand::ReturnCargo { unit: id });
            } else if !self.set_mineral_worker(worker, registry, commands) {
                self.data.set_job(id, WorkerJob::Idle);
            }
        }
    }

    /// Movers drop off cargo on the way if a depot is close, then keep moving
    pub fn handle_movers(&mut self, registry: &UnitRegistry, commands: &mut CommandBuffer) {
        for (id, job) in self.data.iter().collect::<Vec<_>>() {
            let WorkerJob::Moving { to, .. } = job else {
                continue;
            };
            let Some(worker) = registry.get(id) else {
                continue;
            };
            let depot_close = registry
                .closest_depot(worker.position)
                .is_some_and(|d| d.position.distance(&worker.position) <= self.config.mover_return_range);
            if worker.is_carrying() && depot_close {
                commands.issue(UnitCommand::ReturnCargo { unit: id });
            } else {
                commands.issue(UnitCommand::Move { unit: id, to });
            }
        }
    }

    /// Send one worker to the first damaged building nobody is repairing
    pub fn dispatch_repair(&mut self, registry: &UnitRegistry, commands: &mut CommandBuffer) {
        if !self.config.repair_buildings {
            return;
        }
        let repairing: Vec<UnitId> = self
            .data
            .iter()
            .filter_map(|(_, job)| match job {
                WorkerJob::Repairing { target } => Some(target),
                _ => None,
            })
            .collect();

        let damaged = registry.own_units().find(|u| {
            let stats = registry.stats(u);
            stats.is_building && u.completed && u.health < stats.max_health && !repairing.contains(&u.id)
        });
        let Some(building) = damaged else {
            return;
        };
        let Some(worker) = self.closest_worker(building.position, registry, self.config.repair_cargo_penalty, |job| {
            job.is_free()
        }) else {
            return;
        };

        tracing::debug!("Worker {} assigned to repair {}", worker, building.id);
        self.data.set_job(worker, WorkerJob::Repairing { target: building.id });
        commands.issue(UnitCommand::Repair { unit: worker, target: building.id });
    }

    /// Miners still walking or waiting are steered to their own patch
    pub fn enforce_mining(&mut self, registry: &UnitRegistry, commands: &mut CommandBuffer) {
        for (id, job) in self.data.iter().collect::<Vec<_>>() {
            let WorkerJob::Mining { patch, .. } = job else {
                continue;
            };
            let Some(worker) = registry.get(id) else {
                continue;
            };
            if let UnitOrder::Gather { target, harvesting: false } = worker.order {
                if target != patch && registry.contains(patch) {
                    commands.issue(UnitCommand::Gather { unit: id, target: patch });
                }
            }
        }
    }
}

/// The worker is gathering minerals or handing them in
fn is_mining_order(worker: &UnitSnapshot, registry: &UnitRegistry) -> bool {
    match worker.order {
        UnitOrder::Gather { target, .. } => registry.stats_of(target).is_some_and(|s| s.is_mineral_field),
        UnitOrder::ReturnCargo => !worker.carrying_gas,
        _ => false,
    }
}

/// The worker is gathering gas or handing it in
fn is_gas_order(worker: &UnitSnapshot, registry: &UnitRegistry) -> bool {
    match worker.order {
        UnitOrder::Gather { target, .. } => registry.stats_of(target).is_some_and(|s| s.is_refinery),
        UnitOrder::ReturnCargo => !worker.carrying_minerals,
        _ => false,
    }
}

/// Inside a refinery a worker accepts no orders
fn inside_refinery(worker: &UnitSnapshot, refinery: Option<UnitId>) -> bool {
    match worker.order {
        UnitOrder::Gather { target, harvesting: true } => refinery.map_or(true, |r| r == target) && !worker.carrying_minerals,
        _ => false,
    }
}
