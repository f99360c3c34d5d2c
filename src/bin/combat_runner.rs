//! Headless Combat Runner
//!
//! Clusters a scenario's friendly army and predicts each cluster's fight
//! against the enemies around it. Scenarios come from a JSON file or are
//! generated from a seed.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use rts_commander::combat::SimOutcome;
use rts_commander::core::config::load_config;
use rts_commander::units::load_catalog;
use rts_commander::{
    BaseLayout, CombatPredictor, CommanderConfig, EnemyFilter, Owner, UnitCatalog, UnitClusterer, UnitId,
    UnitRegistry, UnitSnapshot, Vec2,
};

/// Headless Combat Runner - cluster an army and predict its fights
#[derive(Parser, Debug)]
#[command(name = "combat_runner")]
#[command(about = "Cluster a scenario's army and predict each cluster's fight")]
struct Args {
    /// JSON scenario file; a random one is generated when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Unit catalog (TOML); overrides the scenario's own catalog path
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Commander config (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for generated scenarios
    #[arg(long)]
    seed: Option<u64>,

    /// Units per side in generated scenarios
    #[arg(long, default_value_t = 24)]
    army_size: usize,

    /// Score with the meat-grinder weighting
    #[arg(long)]
    meat_grinder: bool,

    /// Only count enemies in sight (plus known static defense)
    #[arg(long)]
    visible_only: bool,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    catalog: Option<PathBuf>,
    units: Vec<UnitSnapshot>,
}

/// JSON output for one friendly cluster
#[derive(Debug, Serialize)]
struct ClusterResult {
    units: Vec<UnitId>,
    center: Vec2,
    radius: f32,
    air: bool,
    score: f64,
    verdict: &'static str,
    outcome: Option<SimOutcome>,
}

#[derive(Debug, Serialize)]
struct RunResult {
    seed: Option<u64>,
    friendly_units: usize,
    enemy_units: usize,
    enemy_clusters: usize,
    clusters: Vec<ClusterResult>,
}

const DEFAULT_CATALOG: &str = "data/units.toml";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("combat_runner: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> rts_commander::Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => CommanderConfig::default(),
    };

    let (catalog, units, seed) = match &args.scenario {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let scenario: Scenario = serde_json::from_str(&text)?;
            let catalog_path = args
                .catalog
                .clone()
                .or(scenario.catalog)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG));
            (load_catalog(catalog_path)?, scenario.units, None)
        }
        None => {
            let catalog = load_catalog(args.catalog.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG)))?;
            let seed = args.seed.unwrap_or_else(rand::random);
            let units = random_scenario(&catalog, args.army_size, seed);
            (catalog, units, Some(seed))
        }
    };

    let mut registry = UnitRegistry::new(catalog, BaseLayout::default());
    for unit in units {
        registry.observe(unit)?;
    }

    let result = evaluate(&registry, &config, args, seed);
    match args.format.as_str() {
        "text" => print_text(&result),
        _ => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

fn evaluate(registry: &UnitRegistry, config: &CommanderConfig, args: &Args, seed: Option<u64>) -> RunResult {
    let clusterer = UnitClusterer::new(&config.cluster);
    let mut predictor = CombatPredictor::new(&config.combat);

    let friendly: Vec<UnitId> = registry
        .own_units()
        .filter(|u| registry.stats(u).is_combat_unit())
        .map(|u| u.id)
        .collect();
    let enemy_clusters = clusterer.cluster_enemies(registry);

    let mut clusters = Vec::new();
    for cluster in clusterer.cluster(friendly.iter().copied(), registry) {
        // Fight the enemy group closest to this cluster
        let Some(target) = enemy_clusters.iter().min_by(|a, b| {
            a.center
                .distance_squared(&cluster.center)
                .total_cmp(&b.center.distance_squared(&cluster.center))
        }) else {
            clusters.push(ClusterResult {
                units: cluster.units.clone(),
                center: cluster.center,
                radius: cluster.radius,
                air: cluster.air,
                score: 0.0,
                verdict: "attack",
                outcome: None,
            });
            continue;
        };

        predictor.prepare(
            &cluster.units,
            target.center,
            config.squad.combat_sim_radius,
            args.visible_only,
            EnemyFilter::All,
            registry,
        );
        let score = predictor.simulate(args.meat_grinder);
        tracing::debug!("Cluster at {:?} vs {:?}: score {:.1}", cluster.center, target.center, score);
        clusters.push(ClusterResult {
            units: cluster.units.clone(),
            center: cluster.center,
            radius: cluster.radius,
            air: cluster.air,
            score,
            verdict: if score < 0.0 { "regroup" } else { "attack" },
            outcome: predictor.last_outcome().cloned(),
        });
    }

    RunResult {
        seed,
        friendly_units: friendly.len(),
        enemy_units: registry.enemy_units().count(),
        enemy_clusters: enemy_clusters.len(),
        clusters,
    }
}

/// Two armies of random combat units facing each other across a field
fn random_scenario(catalog: &UnitCatalog, army_size: usize, seed: u64) -> Vec<UnitSnapshot> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut fighters: Vec<_> = catalog
        .iter()
        .filter(|s| s.is_combat_unit() && s.has_weapon())
        .map(|s| (s.id, s.max_health, s.flyer))
        .collect();
    fighters.sort_by_key(|f| f.0);
    if fighters.is_empty() {
        tracing::warn!("Catalog has no armed combat units; scenario is empty");
        return Vec::new();
    }

    let mut units = Vec::with_capacity(army_size * 2);
    let mut next_id = 1u32;
    for (owner, anchor) in [(Owner::Own, Vec2::new(800.0, 1000.0)), (Owner::Enemy, Vec2::new(1400.0, 1000.0))] {
        // A few loose groups per side
        let groups: Vec<Vec2> = (0..3)
            .map(|_| Vec2::new(anchor.x + rng.gen_range(-250.0..250.0), anchor.y + rng.gen_range(-400.0..400.0)))
            .collect();
        for _ in 0..army_size {
            let Some(&(unit_type, max_health, flyer)) = fighters.choose(&mut rng) else {
                continue;
            };
            let Some(&base) = groups.choose(&mut rng) else {
                continue;
            };
            let position = Vec2::new(base.x + rng.gen_range(-60.0..60.0), base.y + rng.gen_range(-60.0..60.0));
            let health = max_health * rng.gen_range(0.5..=1.0);
            let mut unit = UnitSnapshot::new(UnitId(next_id), owner, unit_type, position).with_health(health, 0.0);
            if flyer {
                unit = unit.flying();
            }
            units.push(unit);
            next_id += 1;
        }
    }
    units
}

fn print_text(result: &RunResult) {
    if let Some(seed) = result.seed {
        println!("seed {}", seed);
    }
    println!(
        "{} friendly units in {} clusters vs {} enemy units in {} clusters",
        result.friendly_units,
        result.clusters.len(),
        result.enemy_units,
        result.enemy_clusters
    );
    for (i, c) in result.clusters.iter().enumerate() {
        println!(
            "  #{:<2} {:>3} units{} at ({:.0}, {:.0}) r={:.0}: score {:>8.1} -> {}",
            i,
            c.units.len(),
            if c.air { " (air)" } else { "" },
            c.center.x,
            c.center.y,
            c.radius,
            c.score,
            c.verdict
        );
    }
}
