//! Orders sent from a controller (player input or AI) to the simulation.
//!
//! An order is the only sanctioned way to alter a unit's mission stack from
//! outside a tick. Orders are applied immediately by the engine and rejected
//! with an error when the unit is unknown or the mission kind does not fit it.

use serde::{Deserialize, Serialize};

use crate::missions::{FighterMission, ShipMission};
use crate::types::UnitId;

/// Mission carried by an order; the tag decides which unit kind accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "mission")]
pub enum OrderMission {
    Ship(ShipMission),
    /// Applies to the whole formation of the addressed fighter.
    Fighter(FighterMission),
}

/// Mission order for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatOrder {
    pub unit: UnitId,
    /// Queue beneath existing missions instead of replacing them.
    pub append: bool,
    pub mission: OrderMission,
}

impl CombatOrder {
    pub fn ship(unit: UnitId, mission: ShipMission, append: bool) -> Self {
        Self {
            unit,
            append,
            mission: OrderMission::Ship(mission),
        }
    }

    pub fn fighter(unit: UnitId, mission: FighterMission, append: bool) -> Self {
        Self {
            unit,
            append,
            mission: OrderMission::Fighter(mission),
        }
    }
}
