//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Kind of a battle unit as seen by targeting and the proximity index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum UnitKind {
    Ship,
    Interceptor,
    Bomber,
    Missile,
}

impl UnitKind {
    pub fn is_fighter(self) -> bool {
        matches!(self, UnitKind::Interceptor | UnitKind::Bomber)
    }
}

/// Fighter airframe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum FighterKind {
    /// Dogfighter: attacks fighters and missiles.
    Interceptor,
    /// Strike craft: attacks ships, flees interceptors.
    Bomber,
}

impl FighterKind {
    pub fn unit_kind(self) -> UnitKind {
        match self {
            FighterKind::Interceptor => UnitKind::Interceptor,
            FighterKind::Bomber => UnitKind::Bomber,
        }
    }
}

/// Ship weapon part category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum WeaponKind {
    /// Beam or mass driver: instant damage against ships.
    DirectFire,
    /// Short-range defense against fighters and missiles.
    PointDefense,
    /// Fires a missile entity at a ship.
    MissileLauncher,
}
