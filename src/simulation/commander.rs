//! The decision core's root context
//!
//! `Commander` owns every component. The host feeds it unit events and
//! fresh snapshots, calls [`Commander::tick`] once per frame, and drains
//! the resulting commands. External services are borrowed per tick.

use crate::command::{CommandBuffer, UnitCommand};
use crate::core::config::CommanderConfig;
use crate::core::error::{CommanderError, Result};
use crate::core::types::{Owner, UnitId};
use crate::simulation::budget::TickBudget;
use crate::simulation::event::UnitEvent;
use crate::spatial::SpatialIndex;
use crate::squad::{Squad, SquadData, SquadOrder, IDLE_SQUAD};
use crate::units::{BaseLayout, Economy, UnitCatalog, UnitRegistry, UnitSnapshot};
use crate::workers::WorkerAllocator;

#[derive(Debug)]
pub struct Commander {
    pub(super) config: CommanderConfig,
    pub(super) registry: UnitRegistry,
    pub(super) spatial: SpatialIndex,
    pub(super) squads: SquadData,
    pub(super) workers: WorkerAllocator,
    pub(super) commands: CommandBuffer,
    pub(super) budget: TickBudget,
}

impl Commander {
    /// Build every component for a map of the given size
    ///
    /// Fails if the config does not validate.
    pub fn new(
        config: CommanderConfig,
        catalog: UnitCatalog,
        layout: BaseLayout,
        map_width: f32,
        map_height: f32,
    ) -> Result<Self> {
        config.validate().map_err(CommanderError::InvalidConfig)?;
        let home = layout.main;
        Ok(Self {
            registry: UnitRegistry::new(catalog, layout),
            spatial: SpatialIndex::new(map_width, map_height, &config.spatial),
            squads: SquadData::new(&config, home),
            workers: WorkerAllocator::new(&config.workers),
            commands: CommandBuffer::new(),
            budget: TickBudget::new(config.budget.tick_millis),
            config,
        })
    }

    pub fn config(&self) -> &CommanderConfig {
        &self.config
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    pub fn squads(&self) -> &SquadData {
        &self.squads
    }

    pub fn workers(&self) -> &WorkerAllocator {
        &self.workers
    }

    /// Worker requests (builders, scouts, gas toggles) go through here
    pub fn workers_mut(&mut self) -> &mut WorkerAllocator {
        &mut self.workers
    }

    pub fn budget(&self) -> &TickBudget {
        &self.budget
    }

    pub fn commands(&self) -> &CommandBuffer {
        &self.commands
    }

    /// Hand over everything issued since the last drain
    pub fn drain_commands(&mut self) -> Vec<UnitCommand> {
        self.commands.drain()
    }

    pub fn set_economy(&mut self, economy: Economy) {
        self.registry.economy = economy;
    }

    /// Per-frame refresh of a unit the host can currently see
    pub fn observe(&mut self, snapshot: UnitSnapshot) -> Result<()> {
        self.registry.observe(snapshot)
    }

    /// The unit's last-known position is in vision and it is not there
    pub fn mark_gone(&mut self, unit: UnitId) {
        self.registry.mark_gone(unit);
    }

    /// Apply one lifecycle notification
    ///
    /// Only an unknown unit type is an error; events about units we never
    /// heard of are ignored.
    pub fn on_event(&mut self, event: UnitEvent) -> Result<()> {
        match event {
            UnitEvent::Created(snapshot) => self.unit_created(snapshot),
            UnitEvent::Shown(snapshot) => {
                if self.registry.contains(snapshot.id) {
                    self.registry.observe(snapshot)
                } else {
                    self.unit_created(snapshot)
                }
            }
            UnitEvent::Hidden(id) => {
                self.registry.hide(id);
                Ok(())
            }
            UnitEvent::Destroyed(id) => {
                self.unit_destroyed(id);
                Ok(())
            }
            UnitEvent::Morphed(snapshot) => {
                self.registry.observe(snapshot.clone())?;
                self.workers.on_unit_morphed(&snapshot, &self.registry);
                if self.registry.stats(&snapshot).is_building {
                    self.squads.remove_unit(snapshot.id, &self.registry, &mut self.workers);
                }
                Ok(())
            }
            UnitEvent::Renegaded(snapshot) => {
                tracing::info!("Unit {} changed owner to {:?}", snapshot.id, snapshot.owner);
                self.unit_destroyed(snapshot.id);
                self.unit_created(snapshot)
            }
        }
    }

    fn unit_created(&mut self, snapshot: UnitSnapshot) -> Result<()> {
        self.registry.observe(snapshot.clone())?;
        self.workers.on_unit_added(&snapshot, &self.registry);
        let joins_pool = snapshot.owner == Owner::Own
            && self.squads.squad_of(snapshot.id).is_none()
            && self.registry.stats(&snapshot).is_combat_unit();
        if joins_pool {
            self.squads
                .assign(snapshot.id, IDLE_SQUAD, &self.registry, &mut self.workers);
        }
        Ok(())
    }

    fn unit_destroyed(&mut self, id: UnitId) {
        let Some(snapshot) = self.registry.get(id).cloned() else {
            return;
        };
        self.squads.remove_unit(id, &self.registry, &mut self.workers);
        // Capacity checks during the worker rebalance must no longer see it
        self.registry.remove(id);
        self.workers.on_unit_removed(&snapshot, &self.registry);
    }

    /// Register a new squad built from this commander's config
    pub fn add_squad(&mut self, name: &str, order: SquadOrder, priority: u32) -> Result<()> {
        let squad = Squad::new(name, order, priority, &self.config);
        self.squads.add_squad(squad)
    }

    /// Register a squad the caller built, e.g. with custom micro
    pub fn insert_squad(&mut self, squad: Squad) -> Result<()> {
        self.squads.add_squad(squad)
    }

    /// Disband a squad; its members return to the idle pool
    pub fn remove_squad(&mut self, name: &str) -> Option<Squad> {
        self.squads.remove_squad(name, &self.registry, &mut self.workers)
    }

    pub fn set_squad_order(&mut self, name: &str, order: SquadOrder) -> bool {
        self.squads.set_order(name, order)
    }

    /// Move a unit into a squad; `false` if the unit or squad is unknown
    pub fn assign_unit(&mut self, unit: UnitId, squad: &str) -> bool {
        if !self.registry.contains(unit) {
            return false;
        }
        self.squads.assign(unit, squad, &self.registry, &mut self.workers)
    }
}
