//! Per-tick systems operating on the battle.
//!
//! Systems are free functions over `&mut Battle`. They keep no state of their
//! own; everything persistent lives in components or in the battle indexes.

pub mod cleanup;
pub mod fighters;
pub mod missiles;
pub mod ships;
pub mod steering;
