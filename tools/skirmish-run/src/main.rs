//! skirmish-run: headless two-fleet battle runner.
//!
//! Usage:
//!   skirmish-run --seed 7 --ticks 900
//!   RUST_LOG=combat_sim=debug skirmish-run --ships 5 --belt --archive battle.json

use std::cell::RefCell;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use clap::Parser;
use glam::Vec3;

use combat_core::enums::UnitKind;
use combat_core::events::EventLog;
use combat_obstacles::BeltObstacle;
use combat_sim::engine::{SimConfig, SimulationEngine};
use combat_sim::world_setup::SkirmishSetup;

/// Run a seeded skirmish and print a JSON summary
#[derive(Parser)]
#[command(name = "skirmish-run", version, about, long_about = None)]
struct Cli {
    /// RNG seed for fleet placement
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Ticks to simulate
    #[arg(long, default_value_t = 900)]
    ticks: u64,

    /// Line ships per side
    #[arg(long, default_value_t = 3)]
    ships: usize,

    /// Carriers per side
    #[arg(long, default_value_t = 1)]
    carriers: usize,

    /// Fighters per wing (each carrier launches one interceptor and one bomber wing)
    #[arg(long, default_value_t = 4)]
    fighters: u32,

    /// Place an asteroid belt around the battlefield
    #[arg(long)]
    belt: bool,

    /// Write the final battle archive to this file
    #[arg(long)]
    archive: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut engine = SimulationEngine::new(SimConfig {
        seed: cli.seed,
        ..SimConfig::default()
    });
    let log = Rc::new(RefCell::new(EventLog::default()));
    engine.set_listener(Box::new(log.clone()));

    let setup = SkirmishSetup {
        ships_per_side: cli.ships,
        carriers_per_side: cli.carriers,
        fighters_per_wing: cli.fighters,
        belt: cli.belt.then(|| BeltObstacle::new(Vec3::ZERO, 400.0, 30.0)),
        ..SkirmishSetup::default()
    };
    if let Err(err) = engine.setup_skirmish(&setup) {
        eprintln!("Setup failed: {err}");
        process::exit(1);
    }

    let mut survivors_at = None;
    for _ in 0..cli.ticks {
        engine.tick();
        if survivors_at.is_none() && one_side_left(&engine) {
            survivors_at = Some(engine.tick_count());
        }
    }

    if let Some(path) = &cli.archive {
        let json = match engine.save().to_json() {
            Ok(json) => json,
            Err(err) => {
                eprintln!("Cannot encode archive: {err}");
                process::exit(1);
            }
        };
        if let Err(err) = std::fs::write(path, json) {
            eprintln!("Cannot write {}: {err}", path.display());
            process::exit(1);
        }
    }

    let summary = serde_json::json!({
        "seed": cli.seed,
        "ticks": engine.tick_count(),
        "decided_at_tick": survivors_at,
        "units": {
            "ships": engine.units_of_kind(UnitKind::Ship).len(),
            "interceptors": engine.units_of_kind(UnitKind::Interceptor).len(),
            "bombers": engine.units_of_kind(UnitKind::Bomber).len(),
            "missiles": engine.units_of_kind(UnitKind::Missile).len(),
        },
        "formations": engine.formations().count(),
        "events": log.borrow().tally(),
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(text) => println!("{text}"),
        Err(err) => {
            eprintln!("Cannot encode summary: {err}");
            process::exit(1);
        }
    }
}

/// Only one empire still has ships.
fn one_side_left(engine: &SimulationEngine) -> bool {
    let mut owners: Vec<_> = engine
        .units_of_kind(UnitKind::Ship)
        .into_iter()
        .filter_map(|ship| engine.battle().owner(ship))
        .collect();
    owners.sort();
    owners.dedup();
    owners.len() <= 1
}
