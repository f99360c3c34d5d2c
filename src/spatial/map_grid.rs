//! Spatial index: units bucketed by cell, with exploration timestamps

use crate::core::config::SpatialConfig;
use crate::core::types::{Owner, Tick, UnitId, Vec2};
use crate::oracle::{PartitionId, TerrainOracle};
use crate::spatial::grid::Grid;
use crate::units::UnitRegistry;

/// One cell of the map grid
#[derive(Debug, Clone, Default)]
pub struct GridCell {
    /// Last tick an own unit stood here (`None` = never explored)
    pub last_visited: Option<Tick>,
    /// Last tick an enemy unit was seen here
    pub last_opponent_seen: Option<Tick>,
    /// Start of the most recent detection pulse here
    pub last_scan: Option<Tick>,
    own_units: Vec<(UnitId, Vec2)>,
    enemy_units: Vec<(UnitId, Vec2)>,
}

/// Uniform grid refreshed once per tick
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    grid: Grid<GridCell>,
    scan_duration: Tick,
    now: Tick,
}

impl SpatialIndex {
    pub fn new(map_width: f32, map_height: f32, config: &SpatialConfig) -> Self {
        Self {
            grid: Grid::covering(map_width, map_height, config.cell_size),
            scan_duration: config.scan_duration,
            now: 0,
        }
    }

    pub fn cols(&self) -> usize {
        self.grid.cols
    }

    pub fn rows(&self) -> usize {
        self.grid.rows
    }

    pub fn cell(&self, pos: Vec2) -> &GridCell {
        self.grid.at(pos)
    }

    /// Rebucket every unit and stamp exploration times
    ///
    /// A unit is inserted only once completed, except buildings, which
    /// count while still under construction. Enemies are inserted only
    /// while currently visible. Units inside transports have no position
    /// of their own and are skipped.
    pub fn refresh(&mut self, registry: &UnitRegistry) {
        self.now = registry.now();
        for cell in self.grid.iter_mut() {
            cell.own_units.clear();
            cell.enemy_units.clear();
        }

        let now = self.now;
        for unit in registry.iter() {
            if !unit.has_valid_position() || !(unit.completed || registry.stats(unit).is_building) {
                continue;
            }
            match unit.owner {
                Owner::Own => {
                    let cell = self.grid.at_mut(unit.position);
                    cell.own_units.push((unit.id, unit.position));
                    cell.last_visited = Some(now);
                }
                Owner::Enemy if unit.visible && !unit.observed_gone => {
                    let cell = self.grid.at_mut(unit.position);
                    cell.enemy_units.push((unit.id, unit.position));
                    cell.last_opponent_seen = Some(now);
                }
                _ => {}
            }
        }
    }

    /// Units whose position lies within `radius` of `center`
    ///
    /// Only cells overlapping the circle's bounding box are examined, and
    /// every candidate is checked against the exact squared distance.
    pub fn query(&self, center: Vec2, radius: f32, want_own: bool, want_enemy: bool) -> Vec<UnitId> {
        let r2 = radius * radius;
        let (cols, rows) = self.grid.cells_overlapping(center, radius);
        let mut found = Vec::new();
        for row in rows {
            for col in cols.clone() {
                let Some(cell) = self.grid.get(col, row) else {
                    continue;
                };
                if want_own {
                    found.extend(
                        cell.own_units
                            .iter()
                            .filter(|(_, p)| p.distance_squared(&center) <= r2)
                            .map(|(id, _)| *id),
                    );
                }
                if want_enemy {
                    found.extend(
                        cell.enemy_units
                            .iter()
                            .filter(|(_, p)| p.distance_squared(&center) <= r2)
                            .map(|(id, _)| *id),
                    );
                }
            }
        }
        found
    }

    /// Record a detection pulse covering the cell at `pos`
    pub fn mark_scan(&mut self, pos: Vec2) {
        let now = self.now;
        self.grid.at_mut(pos).last_scan = Some(now);
    }

    /// A detection pulse still covers the cell at `pos`
    pub fn is_scan_active(&self, pos: Vec2) -> bool {
        self.grid
            .at(pos)
            .last_scan
            .is_some_and(|t| t + self.scan_duration > self.now)
    }

    /// Where to look next
    ///
    /// An unexplored start location wins outright. Otherwise the cell
    /// visited longest ago, ties going to the cell farthest from `home`.
    /// With `by_ground`, only positions in `from` partition qualify; if
    /// none do, the restriction is dropped so a position is always returned.
    pub fn least_explored_position(
        &self,
        terrain: &dyn TerrainOracle,
        by_ground: bool,
        from: PartitionId,
        home: Vec2,
        start_locations: &[Vec2],
    ) -> Vec2 {
        let reachable = |pos: Vec2| !by_ground || terrain.partition_id(pos) == from;

        if let Some(start) = start_locations
            .iter()
            .copied()
            .find(|&s| self.grid.at(s).last_visited.is_none() && reachable(s))
        {
            return start;
        }

        self.oldest_cell(home, &reachable)
            .or_else(|| self.oldest_cell(home, &|_: Vec2| true))
            .unwrap_or(home)
    }

    fn oldest_cell(&self, home: Vec2, accept: &dyn Fn(Vec2) -> bool) -> Option<Vec2> {
        let mut best: Option<(Option<Tick>, f32, Vec2)> = None;
        for ((col, row), cell) in self.grid.iter() {
            let center = self.grid.cell_center(col, row);
            if !accept(center) {
                continue;
            }
            let dist = center.distance(&home);
            let better = match best {
                None => true,
                Some((visited, best_dist, _)) => {
                    cell.last_visited < visited || (cell.last_visited == visited && dist > best_dist)
                }
            };
            if better {
                best = Some((cell.last_visited, dist, center));
            }
        }
        best.map(|(_, _, center)| center)
    }
}
