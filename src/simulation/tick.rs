//! Tick pipeline - one decision pass per frame
//!
//! Runs strictly in sequence:
//! spatial refresh -> squads (stim, cluster, classify, execute) -> workers
//!
//! Everything a tick decides lands in the command buffer. If the squad
//! pass used up the tick budget, the worker pass still keeps every worker
//! on a valid job but skips repair and mining enforcement.

use serde::Serialize;

use crate::cluster::{Cluster, ClusterStatus};
use crate::core::types::Tick;
use crate::oracle::Services;
use crate::simulation::commander::Commander;
use crate::squad::SquadContext;
use crate::workers::JobKind;

/// What one tick did, for logging and tests
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub tick: Tick,
    /// Clusters formed by each squad this tick, in update order
    pub squads: Vec<(String, Vec<Cluster>)>,
    /// Commands waiting in the buffer after the tick
    pub commands: usize,
    /// The budget ran out after the squad pass
    pub degraded: bool,
    pub elapsed_ms: f64,
}

impl TickReport {
    /// Clusters of the named squad
    pub fn clusters_of(&self, squad: &str) -> &[Cluster] {
        self.squads
            .iter()
            .find(|(name, _)| name == squad)
            .map(|(_, clusters)| clusters.as_slice())
            .unwrap_or(&[])
    }

    /// How many clusters across all squads ended up with `status`
    pub fn count_status(&self, status: ClusterStatus) -> usize {
        self.squads
            .iter()
            .flat_map(|(_, clusters)| clusters.iter())
            .filter(|c| c.status == status)
            .count()
    }
}

impl Commander {
    /// Run one decision tick at frame `now`
    ///
    /// Commands left undrained from the previous tick are dropped first.
    pub fn tick(&mut self, now: Tick, services: Services<'_>) -> TickReport {
        self.budget.begin();

        if !self.commands.is_empty() {
            tracing::debug!("Dropping {} undrained commands", self.commands.len());
            self.commands.drain();
        }

        // 1. Information refresh
        self.registry.set_now(now);
        self.spatial.refresh(&self.registry);

        // 2. Squads
        let ctx = SquadContext {
            registry: &self.registry,
            spatial: &self.spatial,
            terrain: services.terrain,
            mineral_workers: self.workers.data().count(JobKind::Mining),
        };
        let squads = self
            .squads
            .update(&ctx, &mut self.workers, &mut self.commands, services.debug);

        // 3. Workers, degraded if the squads took too long
        let degraded = self.budget.exceeded();
        if degraded {
            tracing::warn!(
                "Tick {} over budget after squad pass ({:.2}ms > {:.2}ms); degrading worker pass",
                now,
                self.budget.elapsed().as_secs_f64() * 1000.0,
                self.budget.limit().as_secs_f64() * 1000.0
            );
        }
        self.workers.update(
            &self.registry,
            &self.spatial,
            services.production,
            &mut self.commands,
            degraded,
        );

        let elapsed = self.budget.end(degraded);
        TickReport {
            tick: now,
            squads,
            commands: self.commands.len(),
            degraded,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }
}
