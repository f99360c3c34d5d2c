//! Shared fixtures for integration tests

#![allow(dead_code)]

use rts_commander::units::{UnitRole, UnitStats};
use rts_commander::{
    BaseLayout, Commander, CommanderConfig, DebugSink, OpenTerrain, Owner, ProductionStatus, Services, UnitCatalog,
    UnitId, UnitSnapshot, UnitTypeId, Vec2,
};

pub const SCV: UnitTypeId = UnitTypeId(1);
pub const CC: UnitTypeId = UnitTypeId(2);
pub const MINERALS: UnitTypeId = UnitTypeId(3);
pub const REFINERY: UnitTypeId = UnitTypeId(4);
pub const MARINE: UnitTypeId = UnitTypeId(5);
pub const ZERGLING: UnitTypeId = UnitTypeId(6);
pub const HYDRA: UnitTypeId = UnitTypeId(7);
pub const BUNKER: UnitTypeId = UnitTypeId(8);
pub const MEDIC: UnitTypeId = UnitTypeId(9);
pub const DROPSHIP: UnitTypeId = UnitTypeId(10);
pub const MUTALISK: UnitTypeId = UnitTypeId(11);

/// Main base depot position used by every fixture
pub const MAIN: Vec2 = Vec2 { x: 500.0, y: 500.0 };
pub const DEPOT_ID: u32 = 100;
pub const MAP_SIZE: f32 = 4096.0;

pub fn catalog() -> UnitCatalog {
    let mut catalog = UnitCatalog::new();

    let mut scv = UnitStats::new(SCV, "SCV", UnitRole::Worker);
    scv.max_health = 60.0;
    scv.ground_dpf = 0.33;
    scv.ground_range = 10.0;
    scv.top_speed = 4.9;
    scv.supply = 1;
    catalog.insert(scv);

    let mut cc = UnitStats::new(CC, "Command Center", UnitRole::Building);
    cc.is_depot = true;
    cc.max_health = 1500.0;
    catalog.insert(cc);

    catalog.insert(UnitStats::new(MINERALS, "Mineral Field", UnitRole::Resource));

    let mut refinery = UnitStats::new(REFINERY, "Refinery", UnitRole::Building);
    refinery.is_refinery = true;
    refinery.max_health = 750.0;
    catalog.insert(refinery);

    let mut marine = UnitStats::new(MARINE, "Marine", UnitRole::Ranged);
    marine.can_stim = true;
    marine.ground_dpf = 0.4;
    marine.air_dpf = 0.4;
    marine.ground_range = 128.0;
    marine.air_range = 128.0;
    marine.top_speed = 4.0;
    marine.max_health = 40.0;
    marine.supply = 1;
    catalog.insert(marine);

    let mut ling = UnitStats::new(ZERGLING, "Zergling", UnitRole::Melee);
    ling.ground_dpf = 0.63;
    ling.ground_range = 15.0;
    ling.top_speed = 5.6;
    ling.max_health = 35.0;
    catalog.insert(ling);

    let mut hydra = UnitStats::new(HYDRA, "Hydralisk", UnitRole::Ranged);
    hydra.ground_dpf = 0.67;
    hydra.air_dpf = 0.67;
    hydra.ground_range = 128.0;
    hydra.air_range = 128.0;
    hydra.top_speed = 3.7;
    hydra.max_health = 80.0;
    catalog.insert(hydra);

    let mut bunker = UnitStats::new(BUNKER, "Bunker", UnitRole::Building);
    bunker.is_static_defense = true;
    bunker.ground_dpf = 1.6;
    bunker.air_dpf = 1.6;
    bunker.ground_range = 160.0;
    bunker.air_range = 160.0;
    bunker.max_health = 350.0;
    catalog.insert(bunker);

    let mut medic = UnitStats::new(MEDIC, "Medic", UnitRole::Medic);
    medic.top_speed = 4.0;
    medic.max_health = 60.0;
    catalog.insert(medic);

    let mut dropship = UnitStats::new(DROPSHIP, "Dropship", UnitRole::Transport);
    dropship.flyer = true;
    dropship.top_speed = 5.5;
    dropship.max_health = 150.0;
    dropship.space_provided = 8;
    catalog.insert(dropship);

    let mut muta = UnitStats::new(MUTALISK, "Mutalisk", UnitRole::AirToAir);
    muta.flyer = true;
    muta.ground_dpf = 0.3;
    muta.air_dpf = 0.3;
    muta.ground_range = 96.0;
    muta.air_range = 96.0;
    muta.top_speed = 6.7;
    muta.max_health = 120.0;
    catalog.insert(muta);

    catalog
}

pub fn layout() -> BaseLayout {
    BaseLayout {
        main: MAIN,
        natural: None,
        start_locations: vec![MAIN, Vec2::new(3500.0, 3500.0)],
    }
}

/// A full-health unit of the given type
pub fn unit(id: u32, owner: Owner, ty: UnitTypeId, x: f32, y: f32) -> UnitSnapshot {
    let max_health = catalog().stats(ty).max_health;
    let mut snapshot = UnitSnapshot::new(UnitId(id), owner, ty, Vec2::new(x, y)).with_health(max_health, 0.0);
    snapshot.flying = catalog().stats(ty).flyer;
    snapshot
}

pub fn own(id: u32, ty: UnitTypeId, x: f32, y: f32) -> UnitSnapshot {
    unit(id, Owner::Own, ty, x, y)
}

pub fn enemy(id: u32, ty: UnitTypeId, x: f32, y: f32) -> UnitSnapshot {
    unit(id, Owner::Enemy, ty, x, y)
}

pub fn commander() -> Commander {
    commander_with(CommanderConfig::default())
}

pub fn commander_with(config: CommanderConfig) -> Commander {
    Commander::new(config, catalog(), layout(), MAP_SIZE, MAP_SIZE).unwrap()
}

/// Command center at [`MAIN`] with `patches` mineral fields in a row north of it
///
/// Patch ids start at 200.
pub fn main_base(patches: u32) -> Vec<UnitSnapshot> {
    let mut units = vec![own(DEPOT_ID, CC, MAIN.x, MAIN.y)];
    for i in 0..patches {
        units.push(unit(200 + i, Owner::Neutral, MINERALS, 400.0 + 25.0 * i as f32, 380.0));
    }
    units
}

/// Debug sink that counts what was drawn
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub circles: Vec<String>,
    pub lines: usize,
    pub texts: usize,
}

impl DebugSink for RecordingSink {
    fn draw_circle(&mut self, _center: Vec2, _radius: f32, label: &str) {
        self.circles.push(label.to_string());
    }

    fn draw_line(&mut self, _from: Vec2, _to: Vec2) {
        self.lines += 1;
    }

    fn draw_text(&mut self, _at: Vec2, _text: &str) {
        self.texts += 1;
    }
}

/// The host side of the services a tick borrows
#[derive(Debug, Default)]
pub struct Host {
    pub terrain: OpenTerrain,
    pub production: ProductionStatus,
    pub debug: RecordingSink,
}

impl Host {
    pub fn services(&mut self) -> Services<'_> {
        Services {
            terrain: &self.terrain,
            production: &self.production,
            debug: &mut self.debug,
        }
    }
}
