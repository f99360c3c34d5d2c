//! Information layer: the single owned table of unit snapshots
//!
//! Every other component refers to units by [`UnitId`] and resolves them
//! here on demand. Iteration order is by id so every pass over the table
//! is reproducible.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::error::{CommanderError, Result};
use crate::core::types::{Owner, Tick, UnitId, Vec2};
use crate::units::snapshot::UnitSnapshot;
use crate::units::unit_type::{UnitCatalog, UnitStats};

/// An own depot this close to the natural expansion means we hold it
const NATURAL_HELD_RADIUS: f32 = 256.0;

/// Banked resources and supply
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Economy {
    pub minerals: u32,
    pub gas: u32,
    pub supply_used: u32,
    pub supply_total: u32,
}

/// Fixed facts about the map, known once terrain analysis is done
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaseLayout {
    /// Our starting base
    pub main: Vec2,
    /// Our natural expansion, if the map has one
    pub natural: Option<Vec2>,
    /// Every possible starting location on the map
    pub start_locations: Vec<Vec2>,
}

/// Owned table of everything we know about every unit
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    catalog: UnitCatalog,
    units: BTreeMap<UnitId, UnitSnapshot>,
    now: Tick,
    enemy_has_siege: bool,
    pub economy: Economy,
    pub layout: BaseLayout,
}

impl UnitRegistry {
    pub fn new(catalog: UnitCatalog, layout: BaseLayout) -> Self {
        Self {
            catalog,
            units: BTreeMap::new(),
            now: 0,
            enemy_has_siege: false,
            economy: Economy::default(),
            layout,
        }
    }

    pub fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    pub fn stats(&self, unit: &UnitSnapshot) -> &UnitStats {
        self.catalog.stats(unit.unit_type)
    }

    /// Stats for a unit id; `None` if the unit is unknown
    pub fn stats_of(&self, id: UnitId) -> Option<&UnitStats> {
        self.units.get(&id).map(|u| self.catalog.stats(u.unit_type))
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    pub fn set_now(&mut self, tick: Tick) {
        debug_assert!(tick >= self.now, "time went backwards: {} -> {}", self.now, tick);
        self.now = tick;
    }

    /// Record a fresh sighting of a unit
    ///
    /// Clears `observed_gone` and stamps the update time. Rejects unit types
    /// the catalog does not know, since nothing downstream could reason
    /// about them.
    pub fn observe(&mut self, mut snapshot: UnitSnapshot) -> Result<()> {
        let stats = self
            .catalog
            .get(snapshot.unit_type)
            .ok_or(CommanderError::UnknownUnitType(snapshot.unit_type))?;

        if snapshot.owner == Owner::Enemy && stats.siege_capable && !self.enemy_has_siege {
            tracing::info!("Enemy siege unit {} sighted; widening safe distance", snapshot.id);
            self.enemy_has_siege = true;
        }

        snapshot.observed_gone = false;
        snapshot.last_update = self.now;
        self.units.insert(snapshot.id, snapshot);
        Ok(())
    }

    /// The unit left our vision; keep its last-known state
    pub fn hide(&mut self, id: UnitId) {
        if let Some(unit) = self.units.get_mut(&id) {
            unit.visible = false;
        }
    }

    /// Its last-known position is in vision and it is not there
    ///
    /// Only a later [`observe`](Self::observe) clears the flag.
    pub fn mark_gone(&mut self, id: UnitId) {
        if let Some(unit) = self.units.get_mut(&id) {
            unit.visible = false;
            unit.observed_gone = true;
        }
    }

    pub fn remove(&mut self, id: UnitId) -> Option<UnitSnapshot> {
        self.units.remove(&id)
    }

    pub fn get(&self, id: UnitId) -> Option<&UnitSnapshot> {
        self.units.get(&id)
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.units.values()
    }

    pub fn own_units(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.units.values().filter(|u| u.owner == Owner::Own)
    }

    pub fn enemy_units(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.units.values().filter(|u| u.owner == Owner::Enemy)
    }

    /// Once any enemy siege unit has been seen this stays true
    pub fn enemy_has_siege(&self) -> bool {
        self.enemy_has_siege
    }

    /// Fresh enough to plan around: not marked gone, or seen within `memory` frames
    pub fn is_recent(&self, unit: &UnitSnapshot, memory: Tick) -> bool {
        !unit.observed_gone || self.now.saturating_sub(unit.last_update) <= memory
    }

    /// Completed own resource depots
    pub fn own_depots(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.own_units()
            .filter(move |u| u.completed && self.catalog.stats(u.unit_type).is_depot)
    }

    /// Completed own refineries
    pub fn own_refineries(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.own_units()
            .filter(move |u| u.completed && self.catalog.stats(u.unit_type).is_refinery)
    }

    /// Every mineral field we know about
    pub fn mineral_fields(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.units
            .values()
            .filter(move |u| self.catalog.stats(u.unit_type).is_mineral_field && !u.observed_gone)
    }

    pub fn minerals_near(&self, pos: Vec2, radius: f32) -> impl Iterator<Item = &UnitSnapshot> {
        let r2 = radius * radius;
        self.mineral_fields()
            .filter(move |m| m.position.distance_squared(&pos) <= r2)
    }

    /// Closest completed own depot to a position
    pub fn closest_depot(&self, pos: Vec2) -> Option<&UnitSnapshot> {
        closest(self.own_depots(), pos)
    }

    /// An own depot stands on the natural expansion
    pub fn natural_held(&self) -> bool {
        match self.layout.natural {
            Some(natural) => self
                .own_depots()
                .any(|d| d.position.distance(&natural) <= NATURAL_HELD_RADIUS),
            None => false,
        }
    }

    /// Where the army goes when there is nowhere better: the natural if
    /// held, else the main base
    pub fn fallback_position(&self) -> Vec2 {
        match self.layout.natural {
            Some(natural) if self.natural_held() => natural,
            _ => self.layout.main,
        }
    }
}

/// Closest unit to `pos` among `units`
pub fn closest<'a>(
    units: impl Iterator<Item = &'a UnitSnapshot>,
    pos: Vec2,
) -> Option<&'a UnitSnapshot> {
    units.min_by(|a, b| {
        a.position
            .distance_squared(&pos)
            .total_cmp(&b.position.distance_squared(&pos))
            .then(a.id.cmp(&b.id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::UnitTypeId;
    use crate::units::unit_type::{UnitRole, UnitStats};

    const DEPOT: UnitTypeId = UnitTypeId(1);
    const TANK: UnitTypeId = UnitTypeId(2);

    fn registry() -> UnitRegistry {
        let mut catalog = UnitCatalog::new();
        let mut depot = UnitStats::new(DEPOT, "Depot", UnitRole::Building);
        depot.is_depot = true;
        catalog.insert(depot);
        let mut tank = UnitStats::new(TANK, "Tank", UnitRole::Tank);
        tank.siege_capable = true;
        tank.ground_dpf = 1.0;
        catalog.insert(tank);
        UnitRegistry::new(
            catalog,
            BaseLayout {
                main: Vec2::new(100.0, 100.0),
                natural: Some(Vec2::new(800.0, 100.0)),
                start_locations: vec![],
            },
        )
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut reg = registry();
        let unit = UnitSnapshot::new(UnitId(1), Owner::Own, UnitTypeId(77), Vec2::ZERO);
        assert!(matches!(reg.observe(unit), Err(CommanderError::UnknownUnitType(_))));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_gone_flag_cleared_only_by_sighting() {
        let mut reg = registry();
        let tank = UnitSnapshot::new(UnitId(5), Owner::Enemy, TANK, Vec2::ZERO);
        reg.observe(tank.clone()).unwrap();
        reg.mark_gone(UnitId(5));
        assert!(reg.get(UnitId(5)).unwrap().observed_gone);

        reg.hide(UnitId(5));
        assert!(reg.get(UnitId(5)).unwrap().observed_gone);

        reg.observe(tank).unwrap();
        assert!(!reg.get(UnitId(5)).unwrap().observed_gone);
    }

    #[test]
    fn test_siege_latch() {
        let mut reg = registry();
        assert!(!reg.enemy_has_siege());
        reg.observe(UnitSnapshot::new(UnitId(5), Owner::Enemy, TANK, Vec2::ZERO))
            .unwrap();
        reg.remove(UnitId(5));
        assert!(reg.enemy_has_siege());
    }

    #[test]
    fn test_fallback_prefers_held_natural() {
        let mut reg = registry();
        assert_eq!(reg.fallback_position(), Vec2::new(100.0, 100.0));
        reg.observe(UnitSnapshot::new(UnitId(2), Owner::Own, DEPOT, Vec2::new(810.0, 110.0)))
            .unwrap();
        assert_eq!(reg.fallback_position(), Vec2::new(800.0, 100.0));
    }

    #[test]
    fn test_is_recent() {
        let mut reg = registry();
        reg.observe(UnitSnapshot::new(UnitId(5), Owner::Enemy, TANK, Vec2::ZERO))
            .unwrap();
        reg.mark_gone(UnitId(5));
        reg.set_now(100);
        let unit = reg.get(UnitId(5)).unwrap().clone();
        assert!(reg.is_recent(&unit, 120));
        reg.set_now(121);
        assert!(!reg.is_recent(&unit, 120));
    }
}
