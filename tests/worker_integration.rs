//! Worker allocation through the public API

mod common;

use common::*;
use proptest::prelude::*;
use rts_commander::core::config::{SpatialConfig, WorkerConfig};
use rts_commander::units::UnitOrder;
use rts_commander::{
    CommandBuffer, JobKind, ProductionStatus, SpatialIndex, UnitCommand, UnitEvent, UnitId, UnitRegistry,
    WorkerAllocator, WorkerJob,
};
use rts_commander::workers::WorkerData;

fn registry_with_base(patches: u32) -> UnitRegistry {
    let mut reg = UnitRegistry::new(catalog(), layout());
    for unit in main_base(patches) {
        reg.observe(unit).unwrap();
    }
    reg
}

fn spatial(reg: &UnitRegistry) -> SpatialIndex {
    let mut index = SpatialIndex::new(MAP_SIZE, MAP_SIZE, &SpatialConfig::default());
    index.refresh(reg);
    index
}

fn add_workers(reg: &mut UnitRegistry, alloc: &mut WorkerAllocator, ids: impl IntoIterator<Item = u32>) {
    for id in ids {
        let scv = own(id, SCV, 480.0, 470.0);
        reg.observe(scv.clone()).unwrap();
        alloc.on_unit_added(&scv, reg);
    }
}

/// Pretend every miner obeyed its gather order
fn obey_gather(reg: &mut UnitRegistry, alloc: &WorkerAllocator) {
    for (id, job) in alloc.data().iter().collect::<Vec<_>>() {
        if let WorkerJob::Mining { patch, .. } = job {
            let mut scv = reg.get(id).unwrap().clone();
            scv.order = UnitOrder::Gather { target: patch, harvesting: true };
            reg.observe(scv).unwrap();
        }
    }
}

#[test]
fn test_depot_full_at_two_per_patch() {
    let reg = registry_with_base(8);
    let config = WorkerConfig::default();
    let depot = UnitId(DEPOT_ID);
    let mut data = WorkerData::new();
    data.add_depot(depot);

    for i in 0..15u32 {
        data.add_worker(UnitId(i + 1));
        data.set_job(UnitId(i + 1), WorkerJob::Mining { depot, patch: UnitId(200 + i % 8) });
    }
    assert_eq!(data.depot_assigned(depot), 15);
    assert!(!data.is_depot_full(depot, &reg, &config));

    data.add_worker(UnitId(16));
    data.set_job(UnitId(16), WorkerJob::Mining { depot, patch: UnitId(207) });
    assert!(data.is_depot_full(depot, &reg, &config));
}

#[test]
fn test_surplus_workers_stay_idle_when_base_is_full() {
    let mut reg = registry_with_base(2);
    let mut alloc = WorkerAllocator::new(&WorkerConfig::default());
    add_workers(&mut reg, &mut alloc, 1..=6);

    alloc.update(&reg, &spatial(&reg), &ProductionStatus::default(), &mut CommandBuffer::new(), false);

    assert_eq!(alloc.data().count(JobKind::Mining), 4);
    assert_eq!(alloc.data().count(JobKind::Idle), 2);
    assert_eq!(alloc.data().patch_assigned(UnitId(200)), 2);
    assert_eq!(alloc.data().patch_assigned(UnitId(201)), 2);
}

#[test]
fn test_reconcile_is_idempotent_once_workers_obey() {
    let mut reg = registry_with_base(8);
    let mut alloc = WorkerAllocator::new(&WorkerConfig::default());
    add_workers(&mut reg, &mut alloc, 1..=10);
    alloc.update(&reg, &spatial(&reg), &ProductionStatus::default(), &mut CommandBuffer::new(), false);
    obey_gather(&mut reg, &alloc);

    let before: Vec<_> = alloc.data().iter().collect();
    let index = spatial(&reg);
    assert_eq!(alloc.reconcile(&reg, &index, &ProductionStatus::default(), &mut CommandBuffer::new()), 0);
    assert_eq!(alloc.reconcile(&reg, &index, &ProductionStatus::default(), &mut CommandBuffer::new()), 0);
    assert_eq!(alloc.data().iter().collect::<Vec<_>>(), before);
}

#[test]
fn test_destroyed_patch_reassigns_in_the_same_tick() {
    let mut cmd = commander();
    let mut host = Host::default();
    for unit in main_base(8) {
        cmd.on_event(UnitEvent::Created(unit)).unwrap();
    }
    for id in 1..=2 {
        cmd.on_event(UnitEvent::Created(own(id, SCV, 480.0, 470.0))).unwrap();
    }
    cmd.tick(1, host.services());
    cmd.drain_commands();

    let Some(WorkerJob::Mining { patch: lost, .. }) = cmd.workers().job(UnitId(1)) else {
        panic!("worker 1 should be mining");
    };
    for id in 1..=2 {
        let Some(WorkerJob::Mining { patch, .. }) = cmd.workers().job(UnitId(id)) else {
            panic!("worker {} should be mining", id);
        };
        let scv = own(id, SCV, 480.0, 470.0).with_order(UnitOrder::Gather { target: patch, harvesting: true });
        cmd.observe(scv).unwrap();
    }

    cmd.on_event(UnitEvent::Destroyed(lost)).unwrap();
    assert_eq!(cmd.workers().job(UnitId(1)), Some(WorkerJob::Idle));
    assert_eq!(cmd.workers().data().patch_assigned(lost), 0);

    cmd.tick(2, host.services());
    let Some(WorkerJob::Mining { patch, .. }) = cmd.workers().job(UnitId(1)) else {
        panic!("worker 1 should be mining again");
    };
    assert_ne!(patch, lost);
    assert!(cmd.registry().contains(patch));
    assert!(cmd
        .drain_commands()
        .contains(&UnitCommand::Gather { unit: UnitId(1), target: patch }));
}

#[test]
fn test_lost_patch_sheds_miners_over_capacity() {
    let mut cmd = commander();
    let mut host = Host::default();
    for unit in main_base(8) {
        cmd.on_event(UnitEvent::Created(unit)).unwrap();
    }
    for id in 1..=16 {
        cmd.on_event(UnitEvent::Created(own(id, SCV, 480.0, 470.0))).unwrap();
    }
    cmd.tick(1, host.services());
    let depot = UnitId(DEPOT_ID);
    assert_eq!(cmd.workers().data().depot_assigned(depot), 16);
    for i in 0..8 {
        assert_eq!(cmd.workers().data().patch_assigned(UnitId(200 + i)), 2);
    }

    cmd.on_event(UnitEvent::Destroyed(UnitId(200))).unwrap();

    // Seven patches hold 14; a full depot sheds until it has room again
    assert_eq!(cmd.workers().data().depot_assigned(depot), 13);
    assert_eq!(cmd.workers().data().count(JobKind::Mining), 13);
    assert_eq!(cmd.workers().data().count(JobKind::Idle), 3);
}

#[test]
fn test_income_projection() {
    let mut reg = registry_with_base(8);
    reg.economy.minerals = 100;
    let mut alloc = WorkerAllocator::new(&WorkerConfig::default());
    add_workers(&mut reg, &mut alloc, 1..=10);
    alloc.update(&reg, &spatial(&reg), &ProductionStatus::default(), &mut CommandBuffer::new(), false);
    assert_eq!(alloc.data().count(JobKind::Mining), 10);

    // 10 miners bring in 0.45 minerals per frame
    assert!(alloc.will_have_resources(100, 0, 0.0, &reg));
    assert!(alloc.will_have_resources(150, 0, 200.0, &reg));
    assert!(!alloc.will_have_resources(150, 0, 100.0, &reg));
    assert!(!alloc.will_have_resources(150, 25, 1000.0, &reg));
}

#[test]
fn test_builder_prefers_worker_already_moving() {
    let mut reg = registry_with_base(8);
    let mut alloc = WorkerAllocator::new(&WorkerConfig::default());
    add_workers(&mut reg, &mut alloc, 1..=3);
    alloc.update(&reg, &spatial(&reg), &ProductionStatus::default(), &mut CommandBuffer::new(), false);

    let mut far = reg.get(UnitId(3)).unwrap().clone();
    far.position.x = 1500.0;
    reg.observe(far).unwrap();
    let site = rts_commander::Vec2::new(470.0, 470.0);

    alloc.set_move_worker(UnitId(3), 150, 0, site);
    assert_eq!(alloc.data().reserved_resources(), (150, 0));
    assert_eq!(alloc.get_builder(site, REFINERY, &reg, true), Some(UnitId(3)));
    assert_eq!(alloc.job(UnitId(3)), Some(WorkerJob::Building { building: REFINERY }));

    // Nobody is moving now, so the closest free worker is picked
    assert_eq!(alloc.get_builder(site, REFINERY, &reg, false), Some(UnitId(1)));
}

proptest! {
    #[test]
    fn prop_counters_match_jobs(
        workers in 1u32..40,
        removed in prop::collection::vec(any::<bool>(), 40),
        lost_patch in 0u32..8,
    ) {
        let depot = UnitId(DEPOT_ID);
        let mut data = WorkerData::new();
        data.add_depot(depot);
        for i in 0..workers {
            data.add_worker(UnitId(i + 1));
            data.set_job(UnitId(i + 1), WorkerJob::Mining { depot, patch: UnitId(200 + i % 8) });
        }
        let mut remaining = workers as usize;
        for i in 0..workers {
            if removed[i as usize] {
                data.remove_worker(UnitId(i + 1));
                remaining -= 1;
            }
        }
        prop_assert_eq!(data.len(), remaining);
        prop_assert_eq!(data.depot_assigned(depot), remaining);
        let per_patch: usize = (200..208).map(|p| data.patch_assigned(UnitId(p))).sum();
        prop_assert_eq!(per_patch, remaining);

        let demoted = data.remove_patch(UnitId(200 + lost_patch));
        prop_assert_eq!(data.count(JobKind::Idle), demoted.len());
        prop_assert_eq!(data.depot_assigned(depot), remaining - demoted.len());
        prop_assert_eq!(data.count(JobKind::Mining), remaining - demoted.len());
        let per_patch: usize = (200..208).map(|p| data.patch_assigned(UnitId(p))).sum();
        prop_assert_eq!(per_patch, remaining - demoted.len());
    }
}
