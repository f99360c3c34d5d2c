//! The set of all squads

use std::collections::BTreeMap;

use crate::cluster::Cluster;
use crate::command::CommandBuffer;
use crate::core::config::CommanderConfig;
use crate::core::error::{CommanderError, Result};
use crate::core::types::{UnitId, Vec2};
use crate::oracle::DebugSink;
use crate::squad::order::SquadOrder;
use crate::squad::squad::{Squad, SquadContext};
use crate::units::UnitRegistry;
use crate::workers::WorkerAllocator;

/// Name of the pool holding units no other squad has claimed
pub const IDLE_SQUAD: &str = "Idle";

/// Owns every squad, keyed by name
///
/// A unit belongs to at most one squad. Moving it between squads goes
/// through [`SquadData::assign`], which removes it from the old squad
/// first.
#[derive(Debug)]
pub struct SquadData {
    squads: BTreeMap<String, Squad>,
}

impl SquadData {
    /// Start with just the idle pool, parked at `home`
    pub fn new(config: &CommanderConfig, home: Vec2) -> Self {
        let mut squads = BTreeMap::new();
        squads.insert(
            IDLE_SQUAD.to_string(),
            Squad::pool(IDLE_SQUAD, SquadOrder::idle(home), 0, config),
        );
        Self { squads }
    }

    pub fn add_squad(&mut self, squad: Squad) -> Result<()> {
        if self.squads.contains_key(squad.name()) {
            return Err(CommanderError::DuplicateSquad(squad.name().to_string()));
        }
        tracing::info!("Squad {} created (priority {})", squad.name(), squad.priority());
        self.squads.insert(squad.name().to_string(), squad);
        Ok(())
    }

    /// Disband a squad; its members go to the idle pool
    ///
    /// The idle pool itself cannot be removed.
    pub fn remove_squad(&mut self, name: &str, registry: &UnitRegistry, workers: &mut WorkerAllocator) -> Option<Squad> {
        if name == IDLE_SQUAD {
            return None;
        }
        let mut squad = self.squads.remove(name)?;
        let members = squad.clear(registry, workers);
        if let Some(idle) = self.squads.get_mut(IDLE_SQUAD) {
            for unit in members {
                idle.add_unit(unit);
            }
        }
        Some(squad)
    }

    pub fn get(&self, name: &str) -> Option<&Squad> {
        self.squads.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Squad> {
        self.squads.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.squads.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.squads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squads.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Squad> {
        self.squads.values()
    }

    pub fn combat_squads(&self) -> impl Iterator<Item = &Squad> {
        self.squads.values().filter(|s| s.is_combat())
    }

    /// The squad a unit belongs to, if any
    pub fn squad_of(&self, unit: UnitId) -> Option<&Squad> {
        debug_assert!(
            self.squads.values().filter(|s| s.contains(unit)).count() <= 1,
            "unit {} is in more than one squad",
            unit
        );
        self.squads.values().find(|s| s.contains(unit))
    }

    /// Put a unit in a squad, taking it out of its previous one
    ///
    /// Returns `false` if the squad does not exist.
    pub fn assign(&mut self, unit: UnitId, name: &str, registry: &UnitRegistry, workers: &mut WorkerAllocator) -> bool {
        if !self.squads.contains_key(name) {
            return false;
        }
        if self.squads.get(name).is_some_and(|s| s.contains(unit)) {
            return true;
        }
        self.remove_unit(unit, registry, workers);
        let Some(squad) = self.squads.get_mut(name) else {
            return false;
        };
        squad.add_unit(unit);
        if squad.is_combat() && registry.stats_of(unit).is_some_and(|s| s.is_worker) {
            workers.set_combat_worker(unit);
        }
        true
    }

    /// Take a unit out of whichever squad holds it
    pub fn remove_unit(&mut self, unit: UnitId, registry: &UnitRegistry, workers: &mut WorkerAllocator) -> Option<String> {
        let squad = self.squads.values_mut().find(|s| s.contains(unit))?;
        squad.remove_unit(unit, registry, workers);
        Some(squad.name().to_string())
    }

    pub fn set_order(&mut self, name: &str, order: SquadOrder) -> bool {
        match self.squads.get_mut(name) {
            Some(squad) => {
                squad.set_order(order);
                true
            }
            None => false,
        }
    }

    /// Update every squad, highest priority first
    ///
    /// Returns each squad's clusters for this tick.
    pub fn update(
        &mut self,
        ctx: &SquadContext<'_>,
        workers: &mut WorkerAllocator,
        commands: &mut CommandBuffer,
        debug: &mut dyn DebugSink,
    ) -> Vec<(String, Vec<Cluster>)> {
        let mut order: Vec<(u32, String)> = self
            .squads
            .values()
            .map(|s| (s.priority(), s.name().to_string()))
            .collect();
        order.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let mut report = Vec::with_capacity(order.len());
        for (_, name) in order {
            if let Some(squad) = self.squads.get_mut(&name) {
                let clusters = squad.update(ctx, workers, commands, debug);
                report.push((name, clusters));
            }
        }
        report
    }

    /// One status line per squad
    pub fn status_lines(&self) -> Vec<String> {
        self.squads.values().map(Squad::status).collect()
    }
}
