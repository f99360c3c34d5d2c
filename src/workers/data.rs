//! Worker records and capacity accounting
//!
//! Every worker has exactly one [`WorkerJob`]. Depot, patch and refinery
//! counters are derived bookkeeping owned by this table: they change only
//! inside [`WorkerData::set_job`], which releases the old job's counters
//! before installing the new job's.

use std::collections::BTreeMap;

use crate::core::config::WorkerConfig;
use crate::core::types::{UnitId, Vec2};
use crate::units::UnitRegistry;
use crate::workers::job::{JobKind, WorkerJob};

/// Job table plus per-depot, per-patch and per-refinery assignment counts
#[derive(Debug, Clone, Default)]
pub struct WorkerData {
    jobs: BTreeMap<UnitId, WorkerJob>,
    depots: BTreeMap<UnitId, usize>,
    patches: BTreeMap<UnitId, usize>,
    refineries: BTreeMap<UnitId, usize>,
}

impl WorkerData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a worker; an already known worker keeps its job
    pub fn add_worker(&mut self, worker: UnitId) {
        self.jobs.entry(worker).or_insert(WorkerJob::Unassigned);
    }

    /// Stop tracking a worker, releasing whatever its job held
    pub fn remove_worker(&mut self, worker: UnitId) -> Option<WorkerJob> {
        let job = self.jobs.remove(&worker)?;
        self.release(job);
        Some(job)
    }

    pub fn contains(&self, worker: UnitId) -> bool {
        self.jobs.contains_key(&worker)
    }

    pub fn job(&self, worker: UnitId) -> Option<WorkerJob> {
        self.jobs.get(&worker).copied()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Ids of every tracked worker, copied so callers may change jobs while iterating
    pub fn workers(&self) -> Vec<UnitId> {
        self.jobs.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitId, WorkerJob)> + '_ {
        self.jobs.iter().map(|(id, job)| (*id, *job))
    }

    /// Workers currently holding a job of the given kind
    pub fn workers_with(&self, kind: JobKind) -> Vec<UnitId> {
        self.iter()
            .filter(|(_, job)| job.kind() == kind)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn count(&self, kind: JobKind) -> usize {
        self.jobs.values().filter(|job| job.kind() == kind).count()
    }

    /// Replace a worker's job; returns whether anything changed
    pub fn set_job(&mut self, worker: UnitId, job: WorkerJob) -> bool {
        debug_assert!(self.jobs.contains_key(&worker), "set_job on untracked worker {}", worker);
        let Some(old) = self.jobs.get(&worker).copied() else {
            return false;
        };
        if old == job {
            return false;
        }
        self.release(old);
        self.install(job);
        self.jobs.insert(worker, job);
        true
    }

    fn release(&mut self, job: WorkerJob) {
        match job {
            WorkerJob::Mining { depot, patch } => {
                decrement(&mut self.depots, depot);
                decrement(&mut self.patches, patch);
            }
            WorkerJob::Gas { refinery } => decrement(&mut self.refineries, refinery),
            _ => {}
        }
    }

    fn install(&mut self, job: WorkerJob) {
        match job {
            WorkerJob::Mining { depot, patch } => {
                *self.depots.entry(depot).or_default() += 1;
                *self.patches.entry(patch).or_default() += 1;
            }
            WorkerJob::Gas { refinery } => *self.refineries.entry(refinery).or_default() += 1,
            _ => {}
        }
    }

    pub fn add_depot(&mut self, depot: UnitId) {
        self.depots.entry(depot).or_default();
    }

    pub fn has_depot(&self, depot: UnitId) -> bool {
        self.depots.contains_key(&depot)
    }

    pub fn depots(&self) -> Vec<UnitId> {
        self.depots.keys().copied().collect()
    }

    /// Forget a depot; every worker keyed to it goes idle
    pub fn remove_depot(&mut self, depot: UnitId) -> Vec<UnitId> {
        let demoted = self.demote_where(|job| match job {
            WorkerJob::Mining { depot: d, .. } | WorkerJob::ReturningCargo { depot: d } => d == depot,
            _ => false,
        });
        self.depots.remove(&depot);
        demoted
    }

    /// Forget a mineral patch; its miners go idle
    pub fn remove_patch(&mut self, patch: UnitId) -> Vec<UnitId> {
        let demoted = self.demote_where(|job| matches!(job, WorkerJob::Mining { patch: p, .. } if p == patch));
        self.patches.remove(&patch);
        demoted
    }

    /// Forget a refinery; its gatherers go idle
    pub fn remove_refinery(&mut self, refinery: UnitId) -> Vec<UnitId> {
        let demoted = self.demote_where(|job| job == WorkerJob::Gas { refinery });
        self.refineries.remove(&refinery);
        demoted
    }

    fn demote_where(&mut self, pred: impl Fn(WorkerJob) -> bool) -> Vec<UnitId> {
        let targets: Vec<UnitId> = self
            .iter()
            .filter(|(_, job)| pred(*job))
            .map(|(id, _)| id)
            .collect();
        for worker in &targets {
            self.set_job(*worker, WorkerJob::Idle);
        }
        targets
    }

    pub fn depot_assigned(&self, depot: UnitId) -> usize {
        self.depots.get(&depot).copied().unwrap_or(0)
    }

    pub fn patch_assigned(&self, patch: UnitId) -> usize {
        self.patches.get(&patch).copied().unwrap_or(0)
    }

    pub fn refinery_assigned(&self, refinery: UnitId) -> usize {
        self.refineries.get(&refinery).copied().unwrap_or(0)
    }

    /// Assigned miners have reached `round(workers_per_patch × nearby patches)`
    pub fn is_depot_full(&self, depot: UnitId, registry: &UnitRegistry, config: &WorkerConfig) -> bool {
        let Some(unit) = registry.get(depot) else {
            return true;
        };
        let patches = registry
            .minerals_near(unit.position, config.depot_capacity_radius)
            .count();
        let capacity = (config.workers_per_patch * patches as f32 + 0.5).floor() as usize;
        self.depot_assigned(depot) >= capacity
    }

    /// Best patch for a new miner at a depot
    ///
    /// Candidates are the patches near the depot, or every known patch if
    /// none are near. Least assigned wins, then nearest to the depot.
    pub fn choose_patch(&self, depot_pos: Vec2, registry: &UnitRegistry, config: &WorkerConfig) -> Option<UnitId> {
        let near: Vec<(UnitId, Vec2)> = registry
            .minerals_near(depot_pos, config.patch_assignment_radius)
            .map(|m| (m.id, m.position))
            .collect();
        let candidates = if near.is_empty() {
            registry.mineral_fields().map(|m| (m.id, m.position)).collect()
        } else {
            near
        };

        candidates
            .into_iter()
            .min_by(|a, b| {
                self.patch_assigned(a.0)
                    .cmp(&self.patch_assigned(b.0))
                    .then(a.1.distance_squared(&depot_pos).total_cmp(&b.1.distance_squared(&depot_pos)))
                    .then(a.0.cmp(&b.0))
            })
            .map(|(id, _)| id)
    }

    /// Minerals and gas held back by workers on their way to build
    pub fn reserved_resources(&self) -> (u32, u32) {
        self.jobs.values().fold((0, 0), |(m, g), job| match job {
            WorkerJob::Moving { minerals, gas, .. } => (m + minerals, g + gas),
            _ => (m, g),
        })
    }
}

fn decrement(counts: &mut BTreeMap<UnitId, usize>, key: UnitId) {
    if let Some(count) = counts.get_mut(&key) {
        debug_assert!(*count > 0, "assignment count underflow for {}", key);
        *count = count.saturating_sub(1);
    }
}
