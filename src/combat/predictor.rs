//! Deterministic attrition simulation
//!
//! Both rosters step frame by frame: each living unit picks the nearest
//! enemy it can hit, deals its damage per frame if in reach, and otherwise
//! closes the distance at its top speed. Damage and movement from one
//! frame are applied together, so roster order never changes the result.

use serde::Serialize;

use crate::combat::agent::{CombatAgent, EnemyFilter};
use crate::combat::constants::{CONTACT_DISTANCE, MEAT_GRINDER_ENEMY_WEIGHT};
use crate::core::config::CombatConfig;
use crate::core::types::{UnitId, Vec2};
use crate::units::UnitRegistry;

/// What happened in the last simulation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimOutcome {
    pub frames: u32,
    /// Units lost on each side, unweighted
    pub friendly_killed: usize,
    pub enemy_killed: usize,
    /// Value-weighted losses and survivors
    pub friendly_losses: f64,
    pub enemy_losses: f64,
    pub friendly_remaining: f64,
    pub enemy_remaining: f64,
}

/// Predicts fight outcomes between two rosters
#[derive(Debug, Clone)]
pub struct CombatPredictor {
    config: CombatConfig,
    friendly: Vec<CombatAgent>,
    enemy: Vec<CombatAgent>,
    last_outcome: Option<SimOutcome>,
}

impl CombatPredictor {
    pub fn new(config: &CombatConfig) -> Self {
        Self {
            config: config.clone(),
            friendly: Vec::new(),
            enemy: Vec::new(),
            last_outcome: None,
        }
    }

    pub fn clear(&mut self) {
        self.friendly.clear();
        self.enemy.clear();
        self.last_outcome = None;
    }

    pub fn add_friendly(&mut self, agent: CombatAgent) {
        self.friendly.push(agent);
    }

    pub fn add_enemy(&mut self, agent: CombatAgent) {
        self.enemy.push(agent);
    }

    pub fn friendly(&self) -> &[CombatAgent] {
        &self.friendly
    }

    pub fn enemy(&self) -> &[CombatAgent] {
        &self.enemy
    }

    pub fn last_outcome(&self) -> Option<&SimOutcome> {
        self.last_outcome.as_ref()
    }

    /// Fill both rosters for a fight around `enemy_center`
    ///
    /// Friendly: every given unit the model can represent, buildings
    /// excluded. Enemy: with `visible_only`, enemies in sight plus known
    /// static defense out of sight; otherwise every live enemy not marked
    /// gone, at its last-known position and health. An enemy counts when
    /// it is within `radius` plus its weapon reach plus a margin.
    pub fn prepare(
        &mut self,
        friendly: &[UnitId],
        enemy_center: Vec2,
        radius: f32,
        visible_only: bool,
        filter: EnemyFilter,
        registry: &UnitRegistry,
    ) {
        self.clear();

        let mut static_anti_air = 0u32;
        for unit in registry.enemy_units() {
            let stats = registry.stats(unit);
            if !stats.is_combat_sim_unit() || !unit.is_alive() || !unit.has_valid_position() {
                continue;
            }
            let included = if visible_only {
                (unit.visible && unit.completed) || (!unit.visible && stats.is_static_defense && !unit.observed_gone)
            } else {
                !unit.observed_gone && (unit.completed || (stats.is_building && !unit.visible))
            };
            if !included || !filter.admits(stats, unit.flying) {
                continue;
            }

            let reach = if stats.has_weapon() {
                radius + stats.max_range() + self.config.range_margin
            } else {
                radius + self.config.support_reach
            };
            if unit.position.distance_squared(&enemy_center) > reach * reach {
                continue;
            }

            if stats.is_static_defense && stats.has_air_weapon() {
                static_anti_air += 1;
            }
            self.enemy.push(CombatAgent::from_unit(unit, stats));
        }

        let mut flyers_to_drop = if visible_only {
            0
        } else {
            static_anti_air * self.config.flyers_per_static_anti_air
        };

        let mut ids = friendly.to_vec();
        ids.sort_unstable();
        ids.dedup();
        for unit in ids.iter().filter_map(|id| registry.get(*id)) {
            let stats = registry.stats(unit);
            if stats.is_building || !stats.is_combat_sim_unit() || !unit.has_valid_position() {
                continue;
            }
            if unit.flying && flyers_to_drop > 0 {
                flyers_to_drop -= 1;
                continue;
            }
            self.friendly.push(CombatAgent::from_unit(unit, stats));
        }

        self.enemy.sort_by_key(|a| a.id);
    }

    /// Run the simulation and reduce it to a score; `>= 0` means we win or draw
    ///
    /// - no enemies: 0
    /// - no friendly losses: the enemy losses
    /// - `meat_grinder`: 3 × enemy losses − friendly losses
    /// - otherwise: friendly remaining − enemy remaining
    pub fn simulate(&mut self, meat_grinder: bool) -> f64 {
        if self.enemy.is_empty() {
            self.last_outcome = Some(SimOutcome {
                friendly_remaining: side_value(&self.friendly),
                ..SimOutcome::default()
            });
            return 0.0;
        }

        let mut frames = 0;
        while frames < self.config.max_frames
            && self.friendly.iter().any(CombatAgent::is_alive)
            && self.enemy.iter().any(CombatAgent::is_alive)
        {
            step(&mut self.friendly, &mut self.enemy);
            frames += 1;
        }

        let outcome = SimOutcome {
            frames,
            friendly_killed: killed(&self.friendly),
            enemy_killed: killed(&self.enemy),
            friendly_losses: lost_value(&self.friendly),
            enemy_losses: lost_value(&self.enemy),
            friendly_remaining: side_value(&self.friendly),
            enemy_remaining: side_value(&self.enemy),
        };

        let score = if outcome.friendly_killed == 0 {
            outcome.enemy_killed as f64
        } else if meat_grinder {
            MEAT_GRINDER_ENEMY_WEIGHT * outcome.enemy_losses - outcome.friendly_losses
        } else {
            outcome.friendly_remaining - outcome.enemy_remaining
        };

        tracing::trace!(
            "Combat sim: {} vs {} over {} frames -> {:.2}",
            self.friendly.len(),
            self.enemy.len(),
            frames,
            score
        );
        self.last_outcome = Some(outcome);
        score
    }
}

fn side_value(side: &[CombatAgent]) -> f64 {
    side.iter().filter(|a| a.is_alive()).map(|a| a.value as f64).sum()
}

fn killed(side: &[CombatAgent]) -> usize {
    side.iter().filter(|a| !a.is_alive()).count()
}

fn lost_value(side: &[CombatAgent]) -> f64 {
    side.iter().filter(|a| !a.is_alive()).map(|a| a.value as f64).sum()
}

/// Planned action of one agent for the current frame
enum Action {
    Hold,
    Hit { target: usize, damage: f32 },
    Approach(Vec2),
}

fn plan(side: &[CombatAgent], opponents: &[CombatAgent]) -> Vec<Action> {
    side.iter()
        .map(|agent| {
            if !agent.is_alive() {
                return Action::Hold;
            }
            let target = opponents
                .iter()
                .enumerate()
                .filter(|(_, t)| t.is_alive())
                .filter_map(|(i, t)| agent.weapon_against(t).map(|w| (i, t, w)))
                .min_by(|a, b| {
                    a.1.position
                        .distance_squared(&agent.position)
                        .total_cmp(&b.1.position.distance_squared(&agent.position))
                });
            match target {
                None => Action::Hold,
                Some((i, t, (dpf, range))) => {
                    if agent.position.distance(&t.position) <= range + CONTACT_DISTANCE {
                        Action::Hit { target: i, damage: dpf }
                    } else if agent.speed > 0.0 {
                        Action::Approach(agent.position.step_toward(t.position, agent.speed))
                    } else {
                        Action::Hold
                    }
                }
            }
        })
        .collect()
}

fn apply(actions: Vec<Action>, side: &mut [CombatAgent], opponents: &mut [CombatAgent]) {
    for (agent, action) in side.iter_mut().zip(actions) {
        match action {
            Action::Hold => {}
            Action::Hit { target, damage } => opponents[target].health -= damage,
            Action::Approach(pos) => agent.position = pos,
        }
    }
}

fn step(friendly: &mut [CombatAgent], enemy: &mut [CombatAgent]) {
    let friendly_actions = plan(friendly, enemy);
    let enemy_actions = plan(enemy, friendly);
    apply(friendly_actions, friendly, enemy);
    apply(enemy_actions, enemy, friendly);
}
