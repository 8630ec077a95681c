//! Core types and definitions for the tactical combat simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! unit ids and membership flags, kinematic state, ship/fighter/missile
//! records, missions and orders, listener events, constants, and errors.
//! It has no dependency on the entity registry or any runtime framework.

pub mod commands;
pub mod components;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod flags;
pub mod missions;
pub mod types;

pub use glam::Vec3;

#[cfg(test)]
mod tests;
