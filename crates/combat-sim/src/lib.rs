//! Tactical combat simulation engine.
//!
//! Owns the hecs ECS world as the unit registry, keeps the proximity and
//! attacker indexes in step with it, and runs ships, fighter formations
//! and missiles at a fixed tick rate.

pub mod attackers;
pub mod battle;
pub mod engine;
pub mod formation;
pub mod persistence;
pub mod ranking;
pub mod spatial;
pub mod systems;
pub mod world_setup;

pub use combat_core as core;
pub use engine::SimulationEngine;
