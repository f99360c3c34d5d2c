//! Attack-or-retreat decisions
//!
//! Cheap proximity tests run first; the combat predictor only runs when
//! none of them settles the question.

use crate::cluster::{Cluster, ClusterStatus};
use crate::combat::EnemyFilter;
use crate::command::CommandBuffer;
use crate::core::types::{UnitId, Vec2};
use crate::squad::micro::MicroRole;
use crate::squad::squad::{Squad, SquadContext};
use crate::units::{UnitRegistry, UnitSnapshot};

impl Squad {
    /// Inside the order's radius, or within safe distance of a known enemy
    ///
    /// Ground units keep a wider berth once the enemy has fielded siege units.
    pub(super) fn unit_near_enemy(&self, unit: &UnitSnapshot, registry: &UnitRegistry) -> bool {
        if unit.position.distance(&self.order.position) <= self.order.radius {
            return true;
        }
        let safe = if !unit.flying && registry.enemy_has_siege() {
            self.config.siege_safe_distance
        } else {
            self.config.safe_distance
        };
        let safe2 = safe * safe;
        registry
            .enemy_units()
            .filter(|e| !e.observed_gone)
            .any(|e| e.position.distance_squared(&unit.position) <= safe2)
    }

    /// Fighting member closest to the order position (the vanguard)
    ///
    /// Detectors, healers and casters do not count. Squads with ground
    /// units measure by ground distance and skip members that cannot walk
    /// there.
    pub(super) fn unit_closest_to_order<'r>(
        &self,
        units: impl Iterator<Item = UnitId>,
        ctx: &SquadContext<'r>,
    ) -> Option<&'r UnitSnapshot> {
        let registry = ctx.registry;
        let goal = self.order.position;
        units
            .filter_map(|id| registry.get(id))
            .filter(|u| {
                let stats = registry.stats(u);
                u.has_valid_position() && !stats.is_detector && !stats.is_support()
            })
            .filter_map(|u| {
                let distance = if self.caps.has_ground {
                    ctx.terrain.ground_distance(u.position, goal)?
                } else {
                    u.position.distance(&goal)
                };
                Some((u, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.id.cmp(&b.0.id)))
            .map(|(u, _)| u)
    }

    /// Rearmost position: the natural if held, else the main, snapped to its region center
    pub fn final_regroup_position(&self, ctx: &SquadContext<'_>) -> Vec2 {
        ctx.terrain.region_center(ctx.registry.fallback_position())
    }

    /// Our closest static defense that can shoot what threatens this squad
    fn nearby_static_defense<'r>(&self, pos: Vec2, registry: &'r UnitRegistry) -> Option<&'r UnitSnapshot> {
        let ground = self.caps.has_ground;
        registry
            .own_units()
            .filter(|u| u.completed && u.is_alive())
            .filter(|u| {
                let stats = registry.stats(u);
                stats.is_static_defense
                    && if ground {
                        stats.has_ground_weapon()
                    } else {
                        stats.has_air_weapon()
                    }
            })
            .map(|u| (u, u.position.distance(&pos)))
            .filter(|(_, d)| *d < self.config.static_defense_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.id.cmp(&b.0.id)))
            .map(|(u, _)| u)
    }

    /// Engage or release the attack-at-max-supply latch
    fn update_supply_latch(&mut self, registry: &UnitRegistry, mineral_workers: usize) {
        let supply = registry.economy.supply_used;
        let rich = registry.economy.minerals > self.config.latch_mineral_bank
            || mineral_workers > self.config.latch_mineral_workers;
        if supply >= self.config.max_supply_latch_on && rich && !self.attack_at_max {
            tracing::info!("Squad {} near max supply ({}); attacking regardless", self.name, supply);
            self.attack_at_max = true;
        }
        if self.attack_at_max && supply < self.config.max_supply_latch_off {
            tracing::info!("Squad {} supply fell to {}; retreats allowed again", self.name, supply);
            self.attack_at_max = false;
        }
    }

    /// Which enemies the sim should count, given what this squad can shoot
    fn enemy_filter(&self) -> EnemyFilter {
        let has = |role| !self.micro.units_of(role).is_empty();
        if !has(MicroRole::Ranged) && (has(MicroRole::Melee) || has(MicroRole::Lurker) || has(MicroRole::Tank)) {
            // Nothing here shoots up, so harmless flyers do not matter
            EnemyFilter::AntiGround
        } else if has(MicroRole::Scourge) {
            EnemyFilter::AntiAirOnly
        } else {
            EnemyFilter::All
        }
    }

    /// Decide whether a threatened cluster should fall back
    pub(super) fn needs_to_regroup(&mut self, cluster: &Cluster, ctx: &SquadContext<'_>) -> bool {
        if !self.order.can_regroup() {
            self.regroup_status = "Never retreat".into();
            return false;
        }

        self.update_supply_latch(ctx.registry, ctx.mineral_workers);
        if self.attack_at_max {
            self.regroup_status = "Banzai".into();
            return false;
        }

        let Some(vanguard) = self.unit_closest_to_order(cluster.units.iter().copied(), ctx) else {
            self.regroup_status = "No vanguard".into();
            return false;
        };

        let registry = ctx.registry;
        let fallback = self.final_regroup_position(ctx);
        match self.nearby_static_defense(vanguard.position, registry) {
            Some(defense) => {
                if defense.attacking {
                    self.regroup_status = "Go static defense".into();
                    return false;
                }
                let covered = vanguard.position.distance(&defense.position) < self.config.static_defense_cover;
                if covered && vanguard.position.distance(&fallback) < defense.position.distance(&fallback) {
                    self.regroup_status = "Behind static defense".into();
                    return false;
                }
            }
            None => {
                if vanguard.position.distance(&fallback) < self.config.fallback_safe_radius {
                    self.regroup_status = "Back to the wall".into();
                    return false;
                }
            }
        }

        // Center on the enemy so that enemy movement, not ours, changes the answer
        let search = self.config.sim_enemy_search_radius;
        let center = registry
            .enemy_units()
            .filter(|e| e.visible && e.is_alive() && !e.observed_gone)
            .map(|e| (e, e.position.distance(&vanguard.position)))
            .filter(|(_, d)| *d <= search)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.id.cmp(&b.0.id)))
            .map_or(vanguard.position, |(e, _)| e.position);

        let filter = self.enemy_filter();
        self.predictor.prepare(
            &cluster.units,
            center,
            self.config.combat_sim_radius,
            self.fight_visible_only,
            filter,
            registry,
        );
        self.last_score = self.predictor.simulate(self.meat_grinder);

        let retreat = self.last_score < 0.0;
        self.regroup_status = (if retreat { "Retreat" } else { "Attack" }).to_string();
        tracing::debug!(
            "Squad {} cluster at ({:.0}, {:.0}) sim {:.2}: {}",
            self.name,
            cluster.center.x,
            cluster.center.y,
            self.last_score,
            self.regroup_status
        );
        retreat
    }

    /// Where a regrouping cluster should go
    ///
    /// In order: our static defense near the vanguard; the best neighboring
    /// cluster closer than the nearest enemy; the member furthest along
    /// that is not itself threatened; the final fallback position.
    pub(super) fn calc_regroup_position(&self, cluster: &Cluster, clusters: &[Cluster], ctx: &SquadContext<'_>) -> Vec2 {
        let registry = ctx.registry;
        if let Some(vanguard) = self.unit_closest_to_order(cluster.units.iter().copied(), ctx) {
            if let Some(defense) = self.nearby_static_defense(vanguard.position, registry) {
                return defense.position;
            }
        }

        let search = self.config.safe_distance;
        let safe_range = registry
            .enemy_units()
            .filter(|e| e.visible && e.is_alive() && !e.observed_gone)
            .map(|e| e.position.distance(&cluster.center))
            .filter(|d| *d <= search)
            .fold(None, |best: Option<f32>, d| Some(best.map_or(d, |b| b.min(d))))
            .unwrap_or(search);
        let own_progress = cluster.center.distance(&self.order.position);
        let best_neighbor = clusters
            .iter()
            .filter_map(|neighbor| {
                let d = cluster.center.distance(&neighbor.center);
                // Air may fall back onto ground, never the other way round
                let allowed = d > 0.0 && d < safe_range && (cluster.air || !neighbor.air);
                if !allowed {
                    return None;
                }
                let mut score = own_progress - neighbor.center.distance(&self.order.position);
                match neighbor.status {
                    ClusterStatus::Attack => score += self.config.neighbor_attack_bonus,
                    ClusterStatus::Regroup => score -= self.config.neighbor_regroup_penalty,
                    _ => {}
                }
                Some((neighbor.center, score))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((center, _)) = best_neighbor {
            return center;
        }

        let goal = self.order.position;
        let rear_guard = cluster
            .units
            .iter()
            .filter(|id| !self.near_enemy.contains(*id))
            .filter_map(|id| registry.get(*id))
            .filter(|u| u.has_valid_position() && !self.micro.units_of(MicroRole::Medic).contains(&u.id))
            .filter(|u| !self.caps.has_ground || ctx.terrain.ground_distance(u.position, goal).is_some())
            .min_by(|a, b| {
                a.position
                    .distance_squared(&goal)
                    .total_cmp(&b.position.distance_squared(&goal))
                    .then(a.id.cmp(&b.id))
            });
        if let Some(unit) = rear_guard {
            return unit.position;
        }

        self.final_regroup_position(ctx)
    }

    /// Move toward the nearest other cluster that is at least as far along
    pub(super) fn join_up(
        &self,
        cluster: &Cluster,
        clusters: &[Cluster],
        registry: &UnitRegistry,
        commands: &mut CommandBuffer,
    ) -> bool {
        if clusters.len() < 2 {
            return false;
        }
        let goal = self.order.position;
        let own = cluster.center.distance(&goal);
        let target = clusters
            .iter()
            .filter(|other| other.center != cluster.center && other.center.distance(&goal) <= own)
            .min_by(|a, b| {
                a.center
                    .distance_squared(&cluster.center)
                    .total_cmp(&b.center.distance_squared(&cluster.center))
            });
        match target {
            Some(other) => {
                self.move_cluster(cluster, other.center, registry, commands);
                true
            }
            None => false,
        }
    }
}
