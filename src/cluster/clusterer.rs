//! Iterative growing-radius clustering
//!
//! A cluster starts at a seed unit and absorbs every remaining unit of the
//! same flight class within the current radius of its centroid. After each
//! round the centroid and radius are refitted to the members, the search
//! radius grows to `radius + radius_step`, and growth stops on the first
//! round that absorbs nothing.

use crate::cluster::cluster::Cluster;
use crate::core::config::ClusterConfig;
use crate::core::types::{UnitId, Vec2};
use crate::units::UnitRegistry;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    id: UnitId,
    position: Vec2,
    air: bool,
}

/// Partitions unit sets into clusters
#[derive(Debug, Clone)]
pub struct UnitClusterer {
    start_radius: f32,
    radius_step: f32,
    min_radius: f32,
    enemy_memory: u64,
}

impl UnitClusterer {
    pub fn new(config: &ClusterConfig) -> Self {
        Self {
            start_radius: config.start_radius,
            radius_step: config.radius_step,
            min_radius: config.min_radius,
            enemy_memory: config.enemy_memory,
        }
    }

    /// Cluster the given units, consuming the set
    ///
    /// Seeds are taken in ascending id order so the result does not depend
    /// on input order. Units the registry does not know, or that have no
    /// position of their own (loaded in a transport), are dropped.
    pub fn cluster(
        &self,
        units: impl IntoIterator<Item = UnitId>,
        registry: &UnitRegistry,
    ) -> Vec<Cluster> {
        let mut remaining: Vec<Candidate> = units
            .into_iter()
            .filter_map(|id| registry.get(id))
            .filter(|u| u.has_valid_position())
            .map(|u| Candidate {
                id: u.id,
                position: u.position,
                air: u.flying,
            })
            .collect();
        remaining.sort_unstable_by_key(|c| c.id);
        remaining.dedup_by_key(|c| c.id);

        let mut clusters = Vec::new();
        while !remaining.is_empty() {
            let seed = remaining[0];
            clusters.push(self.grow(seed, &mut remaining, registry));
        }
        clusters
    }

    fn grow(&self, seed: Candidate, remaining: &mut Vec<Candidate>, registry: &UnitRegistry) -> Cluster {
        let mut members: Vec<Candidate> = Vec::new();
        let mut center = seed.position;
        let mut radius = self.min_radius;
        let mut search_radius = self.start_radius;

        loop {
            let before = members.len();
            let r2 = search_radius * search_radius;
            remaining.retain(|c| {
                if c.air == seed.air && c.position.distance_squared(&center) <= r2 {
                    members.push(*c);
                    false
                } else {
                    true
                }
            });
            if members.len() == before {
                break;
            }

            (center, radius) = self.fit(&members);
            search_radius = radius + self.radius_step;
        }

        Cluster::from_members(
            members.into_iter().map(|c| c.id).collect(),
            center,
            radius,
            seed.air,
            registry,
        )
    }

    /// Mean position, and the farthest member's distance from it
    fn fit(&self, members: &[Candidate]) -> (Vec2, f32) {
        let center = Vec2::centroid(members.iter().map(|c| c.position)).unwrap_or_default();
        let radius = members
            .iter()
            .map(|c| c.position.distance(&center))
            .fold(self.min_radius, f32::max);
        (center, radius)
    }

    /// Cluster the enemy army we know about
    ///
    /// Only units the combat predictor would model count; buildings are
    /// left out, and so are units marked gone unless seen recently.
    pub fn cluster_enemies(&self, registry: &UnitRegistry) -> Vec<Cluster> {
        let ids: Vec<UnitId> = registry
            .enemy_units()
            .filter(|u| {
                let stats = registry.stats(u);
                stats.is_combat_sim_unit()
                    && !stats.is_building
                    && registry.is_recent(u, self.enemy_memory)
            })
            .map(|u| u.id)
            .collect();
        self.cluster(ids, registry)
    }
}
