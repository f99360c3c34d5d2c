//! Fight prediction through the public API

mod common;

use common::*;
use rts_commander::combat::CombatAgent;
use rts_commander::core::config::CombatConfig;
use rts_commander::{CombatPredictor, EnemyFilter, UnitId, UnitRegistry, Vec2};

#[test]
fn test_stronger_unit_wins_cleanly() {
    let mut sim = CombatPredictor::new(&CombatConfig::default());
    sim.add_friendly(CombatAgent::simple(1, Vec2::ZERO, 100.0, 10.0, 32.0));
    sim.add_enemy(CombatAgent::simple(2, Vec2::new(16.0, 0.0), 50.0, 5.0, 32.0));
    assert_eq!(sim.simulate(false), 1.0);
}

#[test]
fn test_clean_win_counts_kills_not_value() {
    let mut catalog = catalog();
    let mut hydra = catalog.stats(HYDRA).clone();
    hydra.sim_value = 1.5;
    catalog.insert(hydra);
    let mut reg = UnitRegistry::new(catalog, layout());
    for i in 0..6 {
        reg.observe(own(1 + i, MARINE, 1000.0, 1000.0 + 10.0 * i as f32)).unwrap();
    }
    reg.observe(enemy(20, HYDRA, 1100.0, 1020.0).with_health(1.0, 0.0)).unwrap();
    let friendly: Vec<UnitId> = (1..=6).map(UnitId).collect();

    let mut sim = CombatPredictor::new(&CombatConfig::default());
    sim.prepare(&friendly, Vec2::new(1100.0, 1020.0), 300.0, true, EnemyFilter::All, &reg);

    assert_eq!(sim.simulate(false), 1.0);
    let outcome = sim.last_outcome().unwrap();
    assert_eq!(outcome.friendly_killed, 0);
    assert_eq!(outcome.enemy_killed, 1);
    assert_eq!(outcome.enemy_losses, 1.5);
}

#[test]
fn test_no_enemies_is_a_draw() {
    let mut sim = CombatPredictor::new(&CombatConfig::default());
    sim.add_friendly(CombatAgent::simple(1, Vec2::ZERO, 100.0, 10.0, 32.0));
    assert_eq!(sim.simulate(false), 0.0);
    assert_eq!(sim.simulate(true), 0.0);
}

#[test]
fn test_marines_lose_to_hydra_pack() {
    let mut reg = UnitRegistry::new(catalog(), layout());
    reg.observe(own(1, MARINE, 1000.0, 1000.0)).unwrap();
    reg.observe(own(2, MARINE, 1010.0, 1000.0)).unwrap();
    for i in 0..6 {
        reg.observe(enemy(10 + i, HYDRA, 1120.0, 960.0 + 15.0 * i as f32)).unwrap();
    }

    let mut sim = CombatPredictor::new(&CombatConfig::default());
    sim.prepare(&[UnitId(1), UnitId(2)], Vec2::new(1120.0, 1000.0), 300.0, true, EnemyFilter::All, &reg);
    assert_eq!(sim.friendly().len(), 2);
    assert_eq!(sim.enemy().len(), 6);
    assert!(sim.simulate(false) < 0.0);
}

#[test]
fn test_ground_only_squad_ignores_harmless_flyers() {
    let mut reg = UnitRegistry::new(catalog(), layout());
    reg.observe(own(1, ZERGLING, 1000.0, 1000.0)).unwrap();
    let mut overlord = enemy(10, DROPSHIP, 1050.0, 1000.0);
    overlord.flying = true;
    reg.observe(overlord).unwrap();
    reg.observe(enemy(11, MUTALISK, 1060.0, 1000.0)).unwrap();
    reg.observe(enemy(12, MARINE, 1070.0, 1000.0)).unwrap();

    let mut sim = CombatPredictor::new(&CombatConfig::default());
    sim.prepare(&[UnitId(1)], Vec2::new(1000.0, 1000.0), 300.0, true, EnemyFilter::AntiGround, &reg);
    let ids: Vec<UnitId> = sim.enemy().iter().map(|a| a.id).collect();
    // The unarmed transport is not a combat unit; the mutalisk can hit ground
    assert_eq!(ids, vec![UnitId(11), UnitId(12)]);

    sim.prepare(&[UnitId(1)], Vec2::new(1000.0, 1000.0), 300.0, true, EnemyFilter::AntiAirOnly, &reg);
    let ids: Vec<UnitId> = sim.enemy().iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![UnitId(12)]);
}

#[test]
fn test_meat_grinder_rewards_trades() {
    let mut reg = UnitRegistry::new(catalog(), layout());
    for i in 0..4 {
        reg.observe(own(1 + i, ZERGLING, 1000.0, 1000.0 + 10.0 * i as f32)).unwrap();
    }
    for i in 0..3 {
        reg.observe(enemy(10 + i, MARINE, 1100.0, 1000.0 + 10.0 * i as f32)).unwrap();
    }
    let friendly: Vec<UnitId> = (1..=4).map(UnitId).collect();
    let center = Vec2::new(1100.0, 1010.0);

    let mut plain = CombatPredictor::new(&CombatConfig::default());
    plain.prepare(&friendly, center, 300.0, true, EnemyFilter::All, &reg);
    let plain_score = plain.simulate(false);

    let mut grinder = CombatPredictor::new(&CombatConfig::default());
    grinder.prepare(&friendly, center, 300.0, true, EnemyFilter::All, &reg);
    let grinder_score = grinder.simulate(true);

    let outcome = grinder.last_outcome().unwrap().clone();
    if outcome.friendly_killed > 0 {
        assert_eq!(grinder_score, 3.0 * outcome.enemy_losses - outcome.friendly_losses);
        assert_eq!(plain_score, outcome.friendly_remaining - outcome.enemy_remaining);
    } else {
        assert_eq!(grinder_score, plain_score);
    }
}

#[test]
fn test_default_catalog_file_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/units.toml");
    let catalog = rts_commander::units::load_catalog(path).unwrap();
    let marine = catalog.find_by_name("marine").unwrap();
    assert!(marine.can_stim);
    assert!(catalog.find_by_name("Siege Tank").unwrap().siege_capable);
    assert_eq!(catalog.find_by_name("Dropship").unwrap().space_provided, 8);
}
