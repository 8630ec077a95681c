//! ECS components for hecs entities.
//!
//! Components are plain data. `Kinematics` carries the vehicle integration
//! step since every unit kind moves the same way; decision logic lives in
//! the simulation systems.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::missions::{FighterMission, MissionQueue, ShipMission};
use crate::types::{EmpireId, FormationId, UnitId};

/// Position, orientation basis and motion limits of a steerable unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub position: Vec3,
    /// Unit vector along the direction of travel.
    pub forward: Vec3,
    pub side: Vec3,
    pub up: Vec3,
    pub speed: f32,
    pub max_speed: f32,
    pub max_force: f32,
    pub mass: f32,
    /// Collision radius.
    pub radius: f32,
}

impl Kinematics {
    pub fn new(position: Vec3, forward: Vec3, max_speed: f32, max_force: f32, radius: f32) -> Self {
        let mut kinematics = Self {
            position,
            forward: Vec3::X,
            side: Vec3::NEG_Y,
            up: Vec3::Z,
            speed: 0.0,
            max_speed,
            max_force,
            mass: 1.0,
            radius,
        };
        kinematics.regenerate_basis(forward);
        kinematics
    }

    pub fn velocity(&self) -> Vec3 {
        self.forward * self.speed
    }

    /// Where the unit will be after `seconds` at its current velocity.
    pub fn predict_position(&self, seconds: f32) -> Vec3 {
        self.position + self.velocity() * seconds
    }

    /// Map an offset given as (forward, side, up) components into world space.
    pub fn local_to_world(&self, offset: Vec3) -> Vec3 {
        self.position + self.forward * offset.x + self.side * offset.y + self.up * offset.z
    }

    /// Integrate one step under `force`.
    pub fn apply_steering_force(&mut self, force: Vec3, dt: f32) {
        let force = force.clamp_length_max(self.max_force);
        let acceleration = force / self.mass.max(f32::EPSILON);
        let velocity = (self.velocity() + acceleration * dt).clamp_length_max(self.max_speed);
        self.speed = velocity.length();
        self.position += velocity * dt;
        if self.speed > 1.0e-5 {
            self.regenerate_basis(velocity / self.speed);
        }
    }

    /// Reduce speed by `rate` of its current value, keeping heading.
    pub fn brake(&mut self, rate: f32, dt: f32) {
        let decel = self.speed * rate.clamp(0.0, 1.0);
        self.speed = (self.speed - decel).max(0.0);
        self.position += self.velocity() * dt;
    }

    /// Rebuild an orthonormal basis around a new forward direction.
    pub fn regenerate_basis(&mut self, forward: Vec3) {
        let Some(forward) = forward.try_normalize() else {
            return;
        };
        let mut side = forward.cross(self.up);
        if side.length_squared() < 1.0e-8 {
            // forward is parallel to up; pick any perpendicular
            side = forward.any_orthonormal_vector();
        }
        let side = side.normalize();
        self.forward = forward;
        self.side = side;
        self.up = side.cross(forward).normalize();
    }
}

/// Hit points of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub current: f32,
    pub max: f32,
}

impl Structure {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn apply_damage(&mut self, amount: f32) {
        self.current -= amount.max(0.0);
    }

    pub fn is_destroyed(&self) -> bool {
        self.current <= 0.0
    }

    /// Remaining fraction in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }
}

/// Owning empire of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner(pub EmpireId);

/// One weapon part of a ship design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponPart {
    /// Design part name, reported with every shot.
    pub name: String,
    pub kind: WeaponKind,
    pub range: f32,
    pub damage: f32,
    pub cooldown_ticks: u32,
    /// Ticks until the part can fire again.
    #[serde(default)]
    pub ready_in: u32,
}

/// Fighter bay of a carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hangar {
    pub kind: FighterKind,
    pub capacity: u32,
    /// Fighters currently aboard.
    pub docked: u32,
}

/// Weapons and hangars of a ship design.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipLoadout {
    pub weapons: Vec<WeaponPart>,
    pub hangars: Vec<Hangar>,
}

impl ShipLoadout {
    /// Engagement range: farthest weapon when `standoff`, otherwise the
    /// shortest-reaching non-PD weapon. Zero without weapons.
    pub fn weapon_range(&self, standoff: bool) -> f32 {
        let ranges = self.weapons.iter();
        let range = if standoff {
            ranges.map(|w| w.range).reduce(f32::max)
        } else {
            ranges
                .filter(|w| w.kind != WeaponKind::PointDefense)
                .map(|w| w.range)
                .reduce(f32::min)
        };
        range.unwrap_or(0.0)
    }

    /// Sustained damage per tick over all weapons.
    pub fn danger(&self) -> f32 {
        self.weapons.iter().map(sustained_damage).sum()
    }

    /// Sustained damage per tick over point-defense weapons.
    pub fn pd_strength(&self) -> f32 {
        self.weapons
            .iter()
            .filter(|w| w.kind == WeaponKind::PointDefense)
            .map(sustained_damage)
            .sum()
    }

    pub fn hangar_mut(&mut self, kind: FighterKind) -> Option<&mut Hangar> {
        self.hangars.iter_mut().find(|h| h.kind == kind)
    }
}

fn sustained_damage(weapon: &WeaponPart) -> f32 {
    weapon.damage / weapon.cooldown_ticks.max(1) as f32
}

/// Ship-specific state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipState {
    pub design_name: String,
    pub loadout: ShipLoadout,
    pub missions: MissionQueue<ShipMission>,
    /// Point the ship currently seeks, if any.
    pub mission_destination: Option<Vec3>,
    /// Unit this ship is registered as attacking.
    pub attacking: Option<UnitId>,
    /// Ticks spent immobilized at a starlane entry point.
    pub starlane_ticks: u32,
}

/// Gun of a fighter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FighterWeapon {
    pub range: f32,
    pub damage: f32,
    pub cooldown_ticks: u32,
    #[serde(default)]
    pub ready_in: u32,
}

/// Real fighter occupying a formation slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FighterState {
    pub kind: FighterKind,
    pub formation: FormationId,
    pub slot: u32,
    /// Carrier the fighter launched from.
    pub carrier: UnitId,
    pub weapon: FighterWeapon,
    /// Unscaled airframe limits; formation keeping scales the live ones.
    pub base_max_speed: f32,
    pub base_max_force: f32,
    pub attacking: Option<UnitId>,
}

/// Invisible steering anchor of a formation. Resolves the formation's
/// missions and carries the shared mission vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationLeader {
    pub formation: FormationId,
    pub kind: FighterKind,
    pub carrier: UnitId,
    pub missions: MissionQueue<FighterMission>,
    pub mission_destination: Option<Vec3>,
    pub mission_weight: f32,
    /// Target of the current attack mission, shared with members.
    pub mission_target: Option<UnitId>,
}

/// Missile in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissileState {
    pub target: UnitId,
    /// Last known target position.
    pub destination: Vec3,
    pub damage: f32,
    pub launcher: UnitId,
    /// Launcher part name.
    pub part: String,
}

/// Steering force computed on the unit's last evaluation tick, applied every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Steering {
    pub force: Vec3,
    /// Decelerate instead of applying `force`.
    #[serde(default)]
    pub brake: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(kind: WeaponKind, range: f32) -> WeaponPart {
        WeaponPart {
            name: "part".into(),
            kind,
            range,
            damage: 6.0,
            cooldown_ticks: 3,
            ready_in: 0,
        }
    }

    #[test]
    fn test_weapon_range_standoff_uses_max() {
        let loadout = ShipLoadout {
            weapons: vec![
                part(WeaponKind::DirectFire, 30.0),
                part(WeaponKind::PointDefense, 50.0),
                part(WeaponKind::MissileLauncher, 80.0),
            ],
            hangars: vec![],
        };
        assert_eq!(loadout.weapon_range(true), 80.0);
        assert_eq!(loadout.weapon_range(false), 30.0);
    }

    #[test]
    fn test_weapon_range_ignores_pd_and_defaults_zero() {
        let pd_only = ShipLoadout {
            weapons: vec![part(WeaponKind::PointDefense, 50.0)],
            hangars: vec![],
        };
        assert_eq!(pd_only.weapon_range(false), 0.0);
        assert_eq!(ShipLoadout::default().weapon_range(true), 0.0);
    }

    #[test]
    fn test_danger_and_pd_strength() {
        let loadout = ShipLoadout {
            weapons: vec![
                part(WeaponKind::DirectFire, 30.0),
                part(WeaponKind::PointDefense, 50.0),
            ],
            hangars: vec![],
        };
        assert!((loadout.danger() - 4.0).abs() < 1e-5);
        assert!((loadout.pd_strength() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_steering_force_clipped_to_limits() {
        let mut k = Kinematics::new(Vec3::ZERO, Vec3::X, 10.0, 5.0, 1.0);
        for _ in 0..100 {
            k.apply_steering_force(Vec3::new(100.0, 0.0, 0.0), 0.1);
        }
        assert!(k.speed <= 10.0 + 1e-4, "speed {} exceeds max", k.speed);
        assert!(k.position.x > 0.0);
        assert!((k.forward - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn test_basis_stays_orthonormal_after_turn() {
        let mut k = Kinematics::new(Vec3::ZERO, Vec3::X, 10.0, 50.0, 1.0);
        k.apply_steering_force(Vec3::new(0.0, 40.0, 10.0), 0.5);
        assert!((k.forward.length() - 1.0).abs() < 1e-4);
        assert!(k.forward.dot(k.side).abs() < 1e-4);
        assert!(k.forward.dot(k.up).abs() < 1e-4);
        assert!(k.side.dot(k.up).abs() < 1e-4);
    }

    #[test]
    fn test_local_to_world_uses_basis() {
        let k = Kinematics::new(Vec3::new(1.0, 1.0, 0.0), Vec3::Y, 1.0, 1.0, 1.0);
        let p = k.local_to_world(Vec3::new(2.0, 0.0, 0.0));
        assert!((p - Vec3::new(1.0, 3.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_structure_damage() {
        let mut s = Structure::new(10.0);
        s.apply_damage(4.0);
        assert!(!s.is_destroyed());
        assert!((s.fraction() - 0.6).abs() < 1e-6);
        s.apply_damage(6.0);
        assert!(s.is_destroyed());
    }
}
