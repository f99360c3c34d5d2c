//! Clustering through the public API

mod common;

use std::collections::BTreeSet;

use common::*;
use proptest::prelude::*;
use rts_commander::core::config::ClusterConfig;
use rts_commander::{UnitClusterer, UnitId, UnitRegistry};

fn registry_with(units: &[(f32, f32, bool)]) -> UnitRegistry {
    let mut reg = UnitRegistry::new(catalog(), layout());
    for (i, &(x, y, air)) in units.iter().enumerate() {
        let ty = if air { MUTALISK } else { MARINE };
        reg.observe(own(i as u32 + 1, ty, x, y)).unwrap();
    }
    reg
}

#[test]
fn test_separate_groups_become_separate_clusters() {
    let reg = registry_with(&[
        (100.0, 100.0, false),
        (130.0, 110.0, false),
        (2000.0, 2000.0, false),
        (2020.0, 1990.0, false),
    ]);
    let clusterer = UnitClusterer::new(&ClusterConfig::default());
    let clusters = clusterer.cluster((1..=4).map(UnitId), &reg);

    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0].units, vec![UnitId(1), UnitId(2)]);
    assert_eq!(clusters[1].units, vec![UnitId(3), UnitId(4)]);
    assert_eq!(clusters[0].total_health, 80.0);
    assert!((clusters[0].ground_dpf - 0.8).abs() < 1e-6);
    assert_eq!(clusters[0].slowest_speed, 4.0);
}

#[test]
fn test_enemy_memory_keeps_recent_ghosts() {
    let mut reg = UnitRegistry::new(catalog(), layout());
    reg.observe(enemy(1, ZERGLING, 100.0, 100.0)).unwrap();
    reg.observe(enemy(2, ZERGLING, 900.0, 900.0)).unwrap();
    reg.mark_gone(UnitId(2));
    let clusterer = UnitClusterer::new(&ClusterConfig::default());

    reg.set_now(60);
    assert_eq!(clusterer.cluster_enemies(&reg).len(), 2);

    reg.set_now(1000);
    let clusters = clusterer.cluster_enemies(&reg);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].units, vec![UnitId(1)]);
}

fn arb_units() -> impl Strategy<Value = Vec<(f32, f32, bool)>> {
    prop::collection::vec((0.0f32..3000.0, 0.0f32..3000.0, any::<bool>()), 1..60)
}

proptest! {
    #[test]
    fn prop_clusters_partition_the_input(units in arb_units()) {
        let reg = registry_with(&units);
        let ids: Vec<UnitId> = (1..=units.len() as u32).map(UnitId).collect();
        let clusters = UnitClusterer::new(&ClusterConfig::default()).cluster(ids.clone(), &reg);

        let mut seen = BTreeSet::new();
        for cluster in &clusters {
            prop_assert!(!cluster.is_empty());
            prop_assert_eq!(cluster.count, cluster.units.len());
            prop_assert!(cluster.units.windows(2).all(|w| w[0] < w[1]));
            for id in &cluster.units {
                prop_assert!(seen.insert(*id), "unit {} in two clusters", id);
                let member = reg.get(*id).unwrap();
                prop_assert_eq!(member.flying, cluster.air);
                prop_assert!(member.position.distance(&cluster.center) <= cluster.radius + 0.01);
            }
        }
        prop_assert_eq!(seen.into_iter().collect::<Vec<_>>(), ids);
    }

    #[test]
    fn prop_input_order_does_not_matter(units in arb_units(), rotate in 0usize..60) {
        let reg = registry_with(&units);
        let mut ids: Vec<UnitId> = (1..=units.len() as u32).map(UnitId).collect();
        let clusterer = UnitClusterer::new(&ClusterConfig::default());
        let forward = clusterer.cluster(ids.clone(), &reg);

        let len = ids.len();
        ids.rotate_left(rotate % len);
        ids.reverse();
        let shuffled = clusterer.cluster(ids, &reg);

        let a: Vec<_> = forward.iter().map(|c| c.units.clone()).collect();
        let b: Vec<_> = shuffled.iter().map(|c| c.units.clone()).collect();
        prop_assert_eq!(a, b);
    }
}
