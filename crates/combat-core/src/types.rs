//! Fundamental identity and time types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Weak handle to a unit in the battle registry.
///
/// The value is the registry's generational handle packed into 64 bits.
/// Holding a `UnitId` never keeps the unit alive; every dereference goes
/// through the registry, which rejects handles whose generation has expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(u64);

impl UnitId {
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U{:x}", self.0)
    }
}

/// Owning faction of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmpireId(pub u8);

impl fmt::Display for EmpireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "empire-{}", self.0)
    }
}

/// Stable identifier of a fighter formation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FormationId(pub u32);

impl fmt::Display for FormationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl SimTime {
    /// Seconds per tick at the fixed tick rate.
    pub fn dt(&self) -> f32 {
        crate::constants::DT
    }

    /// Advance by one tick.
    pub fn advance(&mut self) {
        self.tick += 1;
        self.elapsed_secs += f64::from(self.dt());
    }

    /// Whether a unit with the given registry index re-evaluates its mission this tick.
    pub fn is_mission_tick(&self, unit_index: u32, stagger: u64) -> bool {
        let stagger = stagger.max(1);
        u64::from(unit_index) % stagger == self.tick % stagger
    }
}
