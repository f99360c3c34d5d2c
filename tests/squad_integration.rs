//! Squad decisions driven through the commander

mod common;

use common::*;
use rts_commander::units::UnitSnapshot;
use rts_commander::{
    ClusterStatus, Commander, CommanderError, Economy, SquadOrder, SquadOrderType, UnitCommand, UnitEvent, UnitId,
    Vec2, WorkerJob,
};

const ARMY: &str = "Army";

/// Where a losing army with nowhere better to go ends up
const FALLBACK: Vec2 = Vec2 { x: 384.0, y: 384.0 };

fn army(order: SquadOrder, units: Vec<UnitSnapshot>) -> Commander {
    let mut cmd = commander();
    cmd.add_squad(ARMY, order, 10).unwrap();
    for unit in units {
        let id = unit.id;
        let ours = unit.is_own();
        cmd.on_event(UnitEvent::Created(unit)).unwrap();
        if ours {
            assert!(cmd.assign_unit(id, ARMY));
        }
    }
    cmd
}

fn commands_for(commands: &[UnitCommand], unit: u32) -> Vec<UnitCommand> {
    commands
        .iter()
        .filter(|c| c.unit() == UnitId(unit))
        .copied()
        .collect()
}

fn marines_vs_hydras(order: SquadOrder) -> Commander {
    let mut units = vec![own(1, MARINE, 1600.0, 1600.0), own(2, MARINE, 1610.0, 1600.0)];
    for i in 0..6 {
        units.push(enemy(10 + i, HYDRA, 1720.0, 1560.0 + 15.0 * i as f32));
    }
    army(order, units)
}

#[test]
fn test_new_combat_units_wait_in_idle_pool() {
    let mut cmd = commander();
    cmd.on_event(UnitEvent::Created(own(1, MARINE, 100.0, 100.0))).unwrap();
    cmd.on_event(UnitEvent::Created(own(2, CC, 500.0, 500.0))).unwrap();
    assert_eq!(cmd.squads().squad_of(UnitId(1)).map(|s| s.name()), Some("Idle"));
    assert!(cmd.squads().squad_of(UnitId(2)).is_none());
}

#[test]
fn test_winning_fight_attacks() {
    let mut units: Vec<UnitSnapshot> = (1..=6).map(|i| own(i, MARINE, 1590.0 + 10.0 * i as f32, 1600.0)).collect();
    units.push(enemy(100, ZERGLING, 1700.0, 1600.0));
    let mut cmd = army(SquadOrder::attack(Vec2::new(2000.0, 1600.0), 100.0), units);
    let mut host = Host::default();

    let report = cmd.tick(1, host.services());

    let clusters = report.clusters_of(ARMY);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].status, ClusterStatus::Attack);
    let squad = cmd.squads().get(ARMY).unwrap();
    assert_eq!(squad.last_score(), 1.0);
    assert_eq!(squad.regroup_status(), "Attack");

    let commands = cmd.drain_commands();
    for id in 1..=6 {
        assert!(commands.contains(&UnitCommand::Attack { unit: UnitId(id), target: UnitId(100) }));
    }
    assert_eq!(host.debug.circles, vec!["Army attack".to_string()]);
}

#[test]
fn test_losing_fight_falls_back() {
    let mut cmd = marines_vs_hydras(SquadOrder::attack(Vec2::new(2000.0, 1600.0), 100.0));
    let mut host = Host::default();

    let report = cmd.tick(1, host.services());

    assert_eq!(report.count_status(ClusterStatus::Regroup), 1);
    assert!(cmd.squads().get(ARMY).unwrap().last_score() < 0.0);
    let commands = cmd.drain_commands();
    for id in 1..=2 {
        assert!(commands.contains(&UnitCommand::Move { unit: UnitId(id), to: FALLBACK }));
    }
    assert_eq!(host.debug.lines, 1);
}

#[test]
fn test_hold_order_never_retreats() {
    let mut cmd = marines_vs_hydras(SquadOrder::hold(Vec2::new(2000.0, 1600.0), 100.0));
    let mut host = Host::default();

    let report = cmd.tick(1, host.services());

    assert_eq!(report.count_status(ClusterStatus::Attack), 1);
    assert_eq!(cmd.squads().get(ARMY).unwrap().regroup_status(), "Never retreat");
    let commands = cmd.drain_commands();
    assert!(!commands.iter().any(|c| matches!(c, UnitCommand::Move { .. })));
}

#[test]
fn test_max_supply_latch() {
    let mut cmd = marines_vs_hydras(SquadOrder::attack(Vec2::new(2000.0, 1600.0), 100.0));
    let mut host = Host::default();
    cmd.set_economy(Economy {
        minerals: 1500,
        gas: 0,
        supply_used: 395,
        supply_total: 400,
    });

    let report = cmd.tick(1, host.services());
    assert_eq!(report.count_status(ClusterStatus::Attack), 1);
    assert!(cmd.squads().get(ARMY).unwrap().attack_at_max());

    // Still above the release threshold
    cmd.set_economy(Economy {
        minerals: 0,
        gas: 0,
        supply_used: 340,
        supply_total: 400,
    });
    let report = cmd.tick(2, host.services());
    assert_eq!(report.count_status(ClusterStatus::Attack), 1);

    cmd.set_economy(Economy {
        minerals: 0,
        gas: 0,
        supply_used: 300,
        supply_total: 400,
    });
    let report = cmd.tick(3, host.services());
    assert_eq!(report.count_status(ClusterStatus::Regroup), 1);
    assert!(!cmd.squads().get(ARMY).unwrap().attack_at_max());
}

#[test]
fn test_firing_static_defense_holds_the_line() {
    let mut cmd = marines_vs_hydras(SquadOrder::attack(Vec2::new(2000.0, 1600.0), 100.0));
    let mut bunker = own(50, BUNKER, 1500.0, 1600.0);
    bunker.attacking = true;
    cmd.on_event(UnitEvent::Created(bunker)).unwrap();
    let mut host = Host::default();

    let report = cmd.tick(1, host.services());

    assert_eq!(report.count_status(ClusterStatus::Attack), 1);
    assert_eq!(cmd.squads().get(ARMY).unwrap().regroup_status(), "Go static defense");
}

#[test]
fn test_idle_bunker_becomes_the_rally_point() {
    let mut cmd = marines_vs_hydras(SquadOrder::attack(Vec2::new(2000.0, 1600.0), 100.0));
    cmd.on_event(UnitEvent::Created(own(50, BUNKER, 1200.0, 1600.0))).unwrap();
    let mut host = Host::default();

    let report = cmd.tick(1, host.services());

    assert_eq!(report.count_status(ClusterStatus::Regroup), 1);
    let commands = cmd.drain_commands();
    assert!(commands.contains(&UnitCommand::Move { unit: UnitId(1), to: Vec2::new(1200.0, 1600.0) }));
}

#[test]
fn test_unthreatened_squad_advances() {
    let goal = Vec2::new(3000.0, 3000.0);
    let mut cmd = army(
        SquadOrder::attack(goal, 200.0),
        vec![own(1, MARINE, 1000.0, 1000.0), own(2, MARINE, 1020.0, 1000.0)],
    );
    let mut host = Host::default();

    let report = cmd.tick(1, host.services());

    assert_eq!(report.count_status(ClusterStatus::Advance), 1);
    let commands = cmd.drain_commands();
    assert_eq!(commands_for(&commands, 1), vec![UnitCommand::Move { unit: UnitId(1), to: goal }]);
}

#[test]
fn test_combat_is_phased_across_frames() {
    let mut units = Vec::new();
    for g in 0..12u32 {
        let x = 300.0 + 600.0 * (g % 6) as f32;
        let y = 1500.0 + 1000.0 * (g / 6) as f32;
        for k in 0..3u32 {
            units.push(own(10 * g + k + 1, MARINE, x, y + 15.0 * k as f32));
        }
        units.push(enemy(500 + g, ZERGLING, x + 60.0, y + 15.0));
    }
    let mut cmd = army(SquadOrder::attack(Vec2::new(2000.0, 2000.0), 0.0), units);
    let mut host = Host::default();

    let report = cmd.tick(10, host.services());

    assert_eq!(report.clusters_of(ARMY).len(), 12);
    assert_eq!(report.count_status(ClusterStatus::Attack), 12);
    let commands = cmd.drain_commands();
    for g in 0..12u32 {
        let marine = 10 * g + 1;
        let acted = commands_for(&commands, marine)
            .iter()
            .any(|c| !matches!(c, UnitCommand::Stim { .. }));
        // Two phases: on an even frame only even clusters fight
        assert_eq!(acted, g % 2 == 0, "cluster {}", g);
    }
}

#[test]
fn test_transports_load_one_unit_per_tick() {
    let pickup = Vec2::new(1000.0, 1000.0);
    let mut cmd = army(
        SquadOrder::new(SquadOrderType::Load, pickup, 0.0, "Load"),
        vec![
            own(1, MARINE, 900.0, 1000.0),
            own(2, MARINE, 910.0, 1000.0),
            own(3, MARINE, 920.0, 1000.0),
            own(50, DROPSHIP, 1000.0, 1000.0),
        ],
    );
    let mut host = Host::default();

    cmd.tick(1, host.services());
    let commands = cmd.drain_commands();
    let loads: Vec<_> = commands
        .iter()
        .filter(|c| matches!(c, UnitCommand::Load { .. }))
        .collect();
    assert_eq!(loads, vec![&UnitCommand::Load { unit: UnitId(1), transport: UnitId(50) }]);
    assert!(commands.contains(&UnitCommand::Move { unit: UnitId(3), to: pickup }));

    // Marine 1 boarded; leaving the load order empties the transport
    let mut boarded = own(1, MARINE, 1000.0, 1000.0);
    boarded.loaded_into = Some(UnitId(50));
    cmd.observe(boarded).unwrap();
    assert!(cmd.set_squad_order(ARMY, SquadOrder::attack(Vec2::new(3000.0, 1000.0), 100.0)));

    cmd.tick(2, host.services());
    let commands = cmd.drain_commands();
    assert!(commands.contains(&UnitCommand::UnloadAll { transport: UnitId(50), at: pickup }));
}

#[test]
fn test_borrowed_worker_is_handed_back() {
    let mut cmd = commander();
    for unit in main_base(8) {
        cmd.on_event(UnitEvent::Created(unit)).unwrap();
    }
    cmd.on_event(UnitEvent::Created(own(1, SCV, 480.0, 470.0))).unwrap();
    cmd.add_squad(ARMY, SquadOrder::defend(MAIN, 400.0).of_main_base(), 10).unwrap();

    assert!(cmd.assign_unit(UnitId(1), ARMY));
    assert_eq!(cmd.workers().job(UnitId(1)), Some(WorkerJob::Combat));

    let disbanded = cmd.remove_squad(ARMY).unwrap();
    assert!(disbanded.is_empty());
    assert_eq!(cmd.workers().job(UnitId(1)), Some(WorkerJob::Idle));
    assert_eq!(cmd.squads().squad_of(UnitId(1)).map(|s| s.name()), Some("Idle"));
}

#[test]
fn test_unit_belongs_to_one_squad() {
    let mut cmd = army(
        SquadOrder::attack(Vec2::new(3000.0, 3000.0), 100.0),
        vec![own(1, MARINE, 1000.0, 1000.0)],
    );
    cmd.add_squad("Second", SquadOrder::defend(MAIN, 300.0), 5).unwrap();

    assert!(cmd.assign_unit(UnitId(1), "Second"));
    assert!(!cmd.squads().get(ARMY).unwrap().contains(UnitId(1)));
    assert!(cmd.squads().get("Second").unwrap().contains(UnitId(1)));
    assert!(!cmd.assign_unit(UnitId(1), "Nowhere"));
    assert!(!cmd.assign_unit(UnitId(999), ARMY));
}

#[test]
fn test_duplicate_squad_is_rejected() {
    let mut cmd = commander();
    cmd.add_squad(ARMY, SquadOrder::attack(MAIN, 100.0), 1).unwrap();
    let err = cmd.add_squad(ARMY, SquadOrder::attack(MAIN, 100.0), 1).unwrap_err();
    assert!(matches!(err, CommanderError::DuplicateSquad(name) if name == ARMY));
    assert!(cmd.remove_squad("Idle").is_none());
}

#[test]
fn test_status_lines_summarise_every_squad() {
    let mut cmd = marines_vs_hydras(SquadOrder::attack(Vec2::new(2000.0, 1600.0), 100.0));
    let mut host = Host::default();
    cmd.tick(1, host.services());

    let lines = cmd.squads().status_lines();
    assert_eq!(lines.len(), 2);
    let army_line = lines.iter().find(|l| l.contains(ARMY)).unwrap();
    assert!(army_line.starts_with("a Army Attack: 2 units, 1 clusters"));
    assert!(army_line.ends_with("Retreat"));
}
