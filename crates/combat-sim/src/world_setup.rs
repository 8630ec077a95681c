//! Unit spawn factories and skirmish setup.
//!
//! Creates ships, fighter formations and missiles with their component
//! bundles, registers combatants in the proximity index and announces them
//! to the listener.

use glam::Vec3;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use combat_core::components::*;
use combat_core::constants::*;
use combat_core::enums::*;
use combat_core::error::{CombatError, Result};
use combat_core::missions::{FighterMission, MissionQueue, ShipMission};
use combat_core::types::{EmpireId, FormationId, UnitId};
use combat_obstacles::{BeltObstacle, Obstacle};

use crate::battle::{unit_id, Battle};
use crate::formation::{slot_offset, Formation};

/// Everything needed to place a ship.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipSpec {
    pub design_name: String,
    pub owner: EmpireId,
    pub position: Vec3,
    pub forward: Vec3,
    pub max_speed: f32,
    pub max_force: f32,
    pub radius: f32,
    pub structure: f32,
    pub loadout: ShipLoadout,
    /// Initial missions, bottom first. Empty leaves the `None` sentinel.
    pub missions: Vec<ShipMission>,
}

impl ShipSpec {
    /// Light escort: one beam, one point-defense mount.
    pub fn corvette(owner: EmpireId, position: Vec3) -> Self {
        Self {
            design_name: "Corvette".into(),
            owner,
            position,
            forward: Vec3::X,
            max_speed: 12.0,
            max_force: 6.0,
            radius: 2.0,
            structure: 60.0,
            loadout: ShipLoadout {
                weapons: vec![
                    weapon("Laser", WeaponKind::DirectFire, 30.0, 4.0, 10),
                    weapon("Flak", WeaponKind::PointDefense, 15.0, 3.0, 5),
                ],
                hangars: vec![],
            },
            missions: vec![],
        }
    }

    /// Line ship with a missile battery.
    pub fn cruiser(owner: EmpireId, position: Vec3) -> Self {
        Self {
            design_name: "Cruiser".into(),
            max_speed: 8.0,
            max_force: 4.0,
            radius: 4.0,
            structure: 150.0,
            loadout: ShipLoadout {
                weapons: vec![
                    weapon("Mass Driver", WeaponKind::DirectFire, 25.0, 6.0, 12),
                    weapon("Missile Battery", WeaponKind::MissileLauncher, 90.0, 12.0, 60),
                    weapon("Flak", WeaponKind::PointDefense, 15.0, 3.0, 5),
                ],
                hangars: vec![],
            },
            ..Self::corvette(owner, position)
        }
    }

    /// Slow hull with interceptor and bomber bays.
    pub fn carrier(owner: EmpireId, position: Vec3) -> Self {
        Self {
            design_name: "Carrier".into(),
            max_speed: 6.0,
            max_force: 3.0,
            radius: 5.0,
            structure: 200.0,
            loadout: ShipLoadout {
                weapons: vec![weapon("Flak", WeaponKind::PointDefense, 15.0, 3.0, 5)],
                hangars: vec![
                    Hangar {
                        kind: FighterKind::Interceptor,
                        capacity: 6,
                        docked: 6,
                    },
                    Hangar {
                        kind: FighterKind::Bomber,
                        capacity: 6,
                        docked: 6,
                    },
                ],
            },
            ..Self::corvette(owner, position)
        }
    }

    pub fn facing(mut self, forward: Vec3) -> Self {
        self.forward = forward;
        self
    }

    pub fn with_mission(mut self, mission: ShipMission) -> Self {
        self.missions.push(mission);
        self
    }
}

fn weapon(name: &str, kind: WeaponKind, range: f32, damage: f32, cooldown_ticks: u32) -> WeaponPart {
    WeaponPart {
        name: name.into(),
        kind,
        range,
        damage,
        cooldown_ticks,
        ready_in: 0,
    }
}

/// Place a ship in the battle.
pub fn spawn_ship(battle: &mut Battle, spec: ShipSpec) -> UnitId {
    let kinematics = Kinematics::new(
        spec.position,
        spec.forward,
        spec.max_speed,
        spec.max_force,
        spec.radius,
    );
    let mut initial = spec.missions.into_iter();
    let mut missions = match initial.next() {
        Some(first) => MissionQueue::with(first),
        None => MissionQueue::new(),
    };
    for mission in initial {
        missions.push(mission);
    }

    let ship = ShipState {
        design_name: spec.design_name,
        loadout: spec.loadout,
        missions,
        mission_destination: None,
        attacking: None,
        starlane_ticks: 0,
    };
    let entity = battle.world.spawn((
        UnitKind::Ship,
        Owner(spec.owner),
        kinematics,
        Structure::new(spec.structure),
        ship,
        Steering::default(),
    ));
    battle.index_unit(entity, UnitKind::Ship, spec.owner, spec.position);

    let unit = unit_id(entity);
    battle.listener.unit_placed(unit, UnitKind::Ship, spec.owner);
    tracing::info!(unit = %unit, owner = %spec.owner, "ship placed");
    unit
}

/// Flight characteristics of a fighter kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Airframe {
    pub speed: f32,
    pub force: f32,
    pub structure: f32,
    pub weapon: FighterWeapon,
}

pub fn airframe(kind: FighterKind) -> Airframe {
    match kind {
        FighterKind::Interceptor => Airframe {
            speed: INTERCEPTOR_SPEED,
            force: INTERCEPTOR_FORCE,
            structure: INTERCEPTOR_STRUCTURE,
            weapon: FighterWeapon {
                range: INTERCEPTOR_RANGE,
                damage: INTERCEPTOR_DAMAGE,
                cooldown_ticks: INTERCEPTOR_COOLDOWN_TICKS,
                ready_in: 0,
            },
        },
        FighterKind::Bomber => Airframe {
            speed: BOMBER_SPEED,
            force: BOMBER_FORCE,
            structure: BOMBER_STRUCTURE,
            weapon: FighterWeapon {
                range: BOMBER_RANGE,
                damage: BOMBER_DAMAGE,
                cooldown_ticks: BOMBER_COOLDOWN_TICKS,
                ready_in: 0,
            },
        },
    }
}

/// Launch `count` fighters of `kind` from `carrier` as one formation.
pub fn launch_formation(
    battle: &mut Battle,
    carrier: UnitId,
    kind: FighterKind,
    count: u32,
) -> Result<(FormationId, Vec<UnitId>)> {
    let entity = battle.entity(carrier).ok_or(CombatError::UnitNotFound(carrier))?;
    let (origin, owner) = {
        let entity_ref = battle
            .world
            .entity(entity)
            .map_err(|_| CombatError::UnitNotFound(carrier))?;
        let kinematics = *entity_ref
            .get::<&Kinematics>()
            .ok_or(CombatError::NotACarrier(carrier))?;
        let owner = entity_ref
            .get::<&Owner>()
            .ok_or(CombatError::NotACarrier(carrier))?
            .0;
        let mut ship = entity_ref
            .get::<&mut ShipState>()
            .ok_or(CombatError::NotACarrier(carrier))?;
        let hangar = ship
            .loadout
            .hangar_mut(kind)
            .ok_or(CombatError::NotACarrier(carrier))?;
        if count == 0 || hangar.docked < count {
            return Err(CombatError::InsufficientFighters {
                carrier,
                kind,
                available: hangar.docked,
                requested: count,
            });
        }
        hangar.docked -= count;
        (kinematics, owner)
    };

    let frame = airframe(kind);
    let id = battle.allocate_formation();
    let mut formation = Formation::new(id);

    let leader_kinematics = Kinematics::new(
        origin.position,
        origin.forward,
        frame.speed * LEADER_SPEED_FACTOR,
        frame.force,
        0.0,
    );
    let leader = battle.world.spawn((
        Owner(owner),
        leader_kinematics,
        FormationLeader {
            formation: id,
            kind,
            carrier,
            missions: MissionQueue::with(FighterMission::roaming(kind)),
            mission_destination: None,
            mission_weight: 0.0,
            mission_target: None,
        },
        Steering::default(),
    ));
    formation.set_leader(unit_id(leader))?;

    let unit_kind = kind.unit_kind();
    let mut fighters = Vec::with_capacity(count as usize);
    for slot in 0..count {
        let position = leader_kinematics.local_to_world(slot_offset(slot));
        let fighter = battle.world.spawn((
            unit_kind,
            Owner(owner),
            Kinematics::new(position, origin.forward, frame.speed, frame.force, FIGHTER_RADIUS),
            Structure::new(frame.structure),
            FighterState {
                kind,
                formation: id,
                slot,
                carrier,
                weapon: frame.weapon,
                base_max_speed: frame.speed,
                base_max_force: frame.force,
                attacking: None,
            },
            Steering::default(),
        ));
        battle.index_unit(fighter, unit_kind, owner, position);
        let fighter = unit_id(fighter);
        formation.add_member(slot, fighter);
        battle.listener.fighter_launched(fighter, carrier, kind);
        fighters.push(fighter);
    }

    battle.formations.insert(id, formation);
    tracing::info!(carrier = %carrier, formation = %id, %kind, count, "fighters launched");
    Ok((id, fighters))
}

/// Fire a missile from `from` at `target`.
pub fn spawn_missile(
    battle: &mut Battle,
    launcher: UnitId,
    owner: EmpireId,
    from: &Kinematics,
    target: UnitId,
    damage: f32,
    part: &str,
) -> UnitId {
    let destination = battle
        .position(target)
        .unwrap_or(from.position + from.forward);
    let forward = (destination - from.position)
        .try_normalize()
        .unwrap_or(from.forward);
    let mut kinematics = Kinematics::new(from.position, forward, MISSILE_SPEED, MISSILE_FORCE, MISSILE_RADIUS);
    kinematics.speed = MISSILE_SPEED;

    let entity = battle.world.spawn((
        UnitKind::Missile,
        Owner(owner),
        kinematics,
        Structure::new(MISSILE_STRUCTURE),
        MissileState {
            target,
            destination,
            damage,
            launcher,
            part: part.to_owned(),
        },
        Steering::default(),
    ));
    battle.index_unit(entity, UnitKind::Missile, owner, from.position);

    let missile = unit_id(entity);
    battle.listener.missile_launched(missile, launcher, target);
    missile
}

/// Two-sided skirmish layout.
#[derive(Debug, Clone, PartialEq)]
pub struct SkirmishSetup {
    pub ships_per_side: usize,
    pub carriers_per_side: usize,
    /// Fighters of each kind launched per carrier at the start.
    pub fighters_per_wing: u32,
    /// Distance between the two battle lines.
    pub separation: f32,
    pub belt: Option<BeltObstacle>,
}

impl Default for SkirmishSetup {
    fn default() -> Self {
        Self {
            ships_per_side: 3,
            carriers_per_side: 1,
            fighters_per_wing: 4,
            separation: 300.0,
            belt: None,
        }
    }
}

/// Place two opposing fleets facing each other across the origin.
/// Returns the placed ships of both sides.
pub fn setup_skirmish(
    battle: &mut Battle,
    rng: &mut ChaCha8Rng,
    setup: &SkirmishSetup,
) -> Result<Vec<UnitId>> {
    if let Some(belt) = setup.belt {
        battle.obstacles.push(Obstacle::Belt(belt));
    }

    let mut placed = Vec::new();
    for side in 0..2u8 {
        let owner = EmpireId(side);
        let sign = if side == 0 { -1.0 } else { 1.0 };
        let line_x = sign * setup.separation * 0.5;
        let forward = Vec3::new(-sign, 0.0, 0.0);

        for i in 0..setup.ships_per_side {
            let position = line_position(rng, line_x, i, 25.0);
            let spec = if i % 2 == 0 {
                ShipSpec::corvette(owner, position)
            } else {
                ShipSpec::cruiser(owner, position)
            };
            placed.push(spawn_ship(battle, spec.facing(forward)));
        }

        for i in 0..setup.carriers_per_side {
            let position = line_position(rng, line_x + sign * 40.0, i, 30.0);
            let carrier = spawn_ship(battle, ShipSpec::carrier(owner, position).facing(forward));
            placed.push(carrier);
            if setup.fighters_per_wing > 0 {
                launch_formation(battle, carrier, FighterKind::Interceptor, setup.fighters_per_wing)?;
                launch_formation(battle, carrier, FighterKind::Bomber, setup.fighters_per_wing)?;
            }
        }
    }
    Ok(placed)
}

fn line_position(rng: &mut ChaCha8Rng, x: f32, index: usize, spacing: f32) -> Vec3 {
    // 0, +1, -1, +2, -2, ... slots either side of the line center
    let rank = ((index + 1) / 2) as f32;
    let y = (if index % 2 == 0 { -rank } else { rank }) * spacing;
    Vec3::new(
        x + rng.gen_range(-5.0..5.0),
        y + rng.gen_range(-5.0..5.0),
        rng.gen_range(-2.0..2.0),
    )
}
