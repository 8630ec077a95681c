//! Ship system: mission resolution, steering, starlane exit and weapons.
//!
//! Missions are re-evaluated on the ship's stagger tick; the steering force
//! computed then is applied every tick. Weapons fire every tick.

use glam::Vec3;
use hecs::Entity;

use combat_core::components::*;
use combat_core::constants::*;
use combat_core::enums::WeaponKind;
use combat_core::flags::UnitFlags;
use combat_core::missions::{Mission, ShipMission};
use combat_core::types::{EmpireId, SimTime, UnitId};
use combat_obstacles::avoidance_force;

use crate::battle::{unit_id, Battle, Departure};
use crate::engine::SimConfig;
use crate::spatial::ProximityToken;
use crate::systems::steering::{self, Neighbor};
use crate::world_setup;

/// Outcome of evaluating the current mission once.
enum Step {
    /// Current mission holds; stop resolving.
    Settled,
    /// Stack changed; evaluate the new current mission.
    Continue,
}

pub fn run(battle: &mut Battle, time: &SimTime, config: &SimConfig) {
    let ships: Vec<Entity> = battle
        .world
        .query::<&ShipState>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();

    for entity in ships {
        // an earlier update may have removed this ship
        if battle.world.contains(entity) {
            update_ship(battle, entity, time, config);
        }
    }
}

fn update_ship(battle: &mut Battle, entity: Entity, time: &SimTime, config: &SimConfig) {
    let me = unit_id(entity);
    let Ok((kinematics, owner, ship, steering)) = battle
        .world
        .query_one_mut::<(&Kinematics, &Owner, &ShipState, &Steering)>(entity)
        .map(|(k, o, s, st)| (*k, o.0, s.clone(), *st))
    else {
        return;
    };
    let mut kinematics = kinematics;
    let mut ship = ship;
    let mut steering = steering;

    if time.is_mission_tick(entity.id(), config.mission_stagger) {
        let previous_target = ship.attacking;
        resolve_missions(battle, me, &kinematics, owner, &mut ship, config, time.tick);
        battle.attackers.retarget(me, previous_target, ship.attacking);
        steering = steer(battle, entity, &kinematics, &ship);
    }

    // counts only while the entry point is valid; evaluation cancels the rest
    let entering_starlane = match *ship.missions.current() {
        ShipMission::EnterStarlane { destination } => {
            at_starlane_entry(config, kinematics.position, destination)
        }
        _ => false,
    };
    if entering_starlane {
        kinematics.brake(1.0, DT);
        ship.starlane_ticks += 1;
        if ship.starlane_ticks >= ENTER_STARLANE_DELAY_TICKS {
            battle.listener.ship_entered_starlane(me);
            tracing::info!(tick = time.tick, ship = %me, "ship left through starlane");
            battle.remove_unit(entity, Departure::Withdrawn);
            return;
        }
    } else {
        ship.starlane_ticks = 0;
        if steering.brake {
            kinematics.brake(SHIP_BRAKE_RATE, DT);
        } else {
            kinematics.apply_steering_force(steering.force, DT);
        }
    }

    fire_weapons(battle, me, &kinematics, owner, &mut ship);

    if let Ok((k, s, st, token)) = battle
        .world
        .query_one_mut::<(&mut Kinematics, &mut ShipState, &mut Steering, &ProximityToken)>(entity)
    {
        *k = kinematics;
        *s = ship;
        *st = steering;
        battle.index.update(token, kinematics.position);
    }
}

/// Run the mission stack until the current mission settles.
pub(crate) fn resolve_missions(
    battle: &Battle,
    me: UnitId,
    kinematics: &Kinematics,
    owner: EmpireId,
    ship: &mut ShipState,
    config: &SimConfig,
    tick: u64,
) {
    for _ in 0..MAX_MISSION_RESOLUTION_STEPS {
        let before = *ship.missions.current();
        let step = evaluate(battle, kinematics, owner, ship, config);
        let after = *ship.missions.current();
        if before != after {
            tracing::debug!(
                tick,
                unit = %me,
                from = before.name(),
                to = after.name(),
                "ship mission transition"
            );
        }
        if let Step::Settled = step {
            return;
        }
    }
}

fn evaluate(
    battle: &Battle,
    kinematics: &Kinematics,
    owner: EmpireId,
    ship: &mut ShipState,
    config: &SimConfig,
) -> Step {
    let position = kinematics.position;
    let hostile = UnitFlags::owner(owner);

    match *ship.missions.current() {
        ShipMission::None => {
            if ship.missions.len() == 1 {
                ship.missions.replace(ShipMission::roaming());
            } else {
                ship.missions.pop();
            }
            Step::Continue
        }
        ShipMission::MoveTo { destination } => {
            if position.distance_squared(destination) < ARRIVAL_DISTANCE_SQUARED {
                return pop(ship);
            }
            settle(ship, Some(destination), None)
        }
        ShipMission::PatrolTo { destination } => {
            if position.distance_squared(destination) < ARRIVAL_DISTANCE_SQUARED {
                return pop(ship);
            }
            let found = battle.index.find_nearest_in_radius_where(
                position,
                SHIP_ENGAGEMENT_RADIUS,
                UnitFlags::NON_FIGHTERS,
                UnitFlags::FIGHTERS | hostile,
                |t| battle.is_targetable(t),
            );
            match found {
                Some(target) => {
                    ship.missions.push(ShipMission::AttackThis { target });
                    Step::Continue
                }
                None => settle(ship, Some(destination), None),
            }
        }
        ShipMission::AttackThis { target } | ShipMission::AttackThisStandoff { target } => {
            let standoff = matches!(ship.missions.current(), ShipMission::AttackThisStandoff { .. });
            let Some(target_position) = battle
                .is_targetable(target)
                .then(|| battle.position(target))
                .flatten()
            else {
                return pop(ship);
            };
            let range = ship.loadout.weapon_range(standoff);
            let point = standoff_point(position, target_position, range);
            settle(ship, Some(point), Some(target))
        }
        ShipMission::DefendThis { target } => {
            let Some(defended) = battle.position(target) else {
                return pop(ship);
            };
            let attacker = battle.weakest(battle.attackers.attackers_of(target), position);
            match attacker.and_then(|a| battle.position(a).map(|p| (a, p))) {
                Some((attacker, attacker_position)) => {
                    settle(ship, Some(attacker_position), Some(attacker))
                }
                None => settle(ship, Some(defended), None),
            }
        }
        ShipMission::AttackShipsWeakestFirst | ShipMission::AttackShipsWeakestFirstStandoff => {
            let standoff = matches!(
                ship.missions.current(),
                ShipMission::AttackShipsWeakestFirstStandoff
            );
            let candidates = battle.index.find_all(UnitFlags::SHIP, hostile);
            match battle.weakest(candidates, position) {
                Some(target) => push_attack(ship, target, standoff),
                None => pop(ship),
            }
        }
        ShipMission::AttackShipsNearestFirst | ShipMission::AttackShipsNearestFirstStandoff => {
            let standoff = matches!(
                ship.missions.current(),
                ShipMission::AttackShipsNearestFirstStandoff
            );
            let found = battle.index.find_nearest_where(position, UnitFlags::SHIP, hostile, |t| {
                battle.is_targetable(t)
            });
            match found {
                Some(target) => push_attack(ship, target, standoff),
                None => pop(ship),
            }
        }
        ShipMission::EnterStarlane { destination } => {
            if at_starlane_entry(config, position, destination) {
                ship.mission_destination = None;
                ship.attacking = None;
                Step::Settled
            } else {
                pop(ship)
            }
        }
    }
}

fn settle(ship: &mut ShipState, destination: Option<Vec3>, target: Option<UnitId>) -> Step {
    ship.mission_destination = destination;
    ship.attacking = target;
    Step::Settled
}

/// Pop the current mission. Stops when only the sentinel is left, so an
/// idle ship waits for its next evaluation instead of spinning.
fn pop(ship: &mut ShipState) -> Step {
    ship.missions.pop();
    if ship.missions.len() == 1 && ship.missions.current().is_none() {
        ship.mission_destination = None;
        ship.attacking = None;
        Step::Settled
    } else {
        Step::Continue
    }
}

fn push_attack(ship: &mut ShipState, target: UnitId, standoff: bool) -> Step {
    let mission = if standoff {
        ShipMission::AttackThisStandoff { target }
    } else {
        ShipMission::AttackThis { target }
    };
    ship.missions.push(mission);
    Step::Continue
}

/// Point on the line from target to shooter, `min(distance, range)` from the target.
pub fn standoff_point(shooter: Vec3, target: Vec3, range: f32) -> Vec3 {
    let offset = shooter - target;
    let distance = offset.length();
    if distance <= f32::EPSILON {
        return target;
    }
    target + offset / distance * distance.min(range)
}

/// Ship and destination both lie within reach of one configured entry point.
pub fn at_starlane_entry(config: &SimConfig, position: Vec3, destination: Vec3) -> bool {
    config.starlane_entry_points.iter().any(|entry| {
        entry.distance(destination) <= STARLANE_ENTRY_RADIUS
            && entry.distance(position) <= STARLANE_ENTRY_RADIUS
    })
}

/// Obstacle avoidance, then neighbor avoidance, then seek; brake when idle.
fn steer(battle: &Battle, entity: Entity, kinematics: &Kinematics, ship: &ShipState) -> Steering {
    let avoid = avoidance_force(
        &battle.obstacles,
        kinematics.position,
        kinematics.forward,
        kinematics.speed,
        kinematics.max_force,
        OBSTACLE_AVOIDANCE_TIME,
    );
    if avoid != Vec3::ZERO {
        return Steering {
            force: avoid,
            brake: false,
        };
    }

    let me = unit_id(entity);
    let neighbors: Vec<Neighbor> = battle
        .index
        .find_in_radius(
            kinematics.position,
            NEIGHBOR_AVOIDANCE_RADIUS,
            UnitFlags::SHIP,
            UnitFlags::empty(),
        )
        .into_iter()
        .filter(|u| *u != me)
        .filter_map(|u| battle.kinematics(u))
        .map(|k| Neighbor::of(&k))
        .collect();
    let dodge = steering::avoid_neighbors(kinematics, &neighbors, NEIGHBOR_AVOIDANCE_TIME);
    if dodge != Vec3::ZERO {
        return Steering {
            force: dodge,
            brake: false,
        };
    }

    match ship.mission_destination {
        Some(destination) => Steering {
            force: steering::seek(kinematics, destination),
            brake: false,
        },
        None => Steering {
            force: Vec3::ZERO,
            brake: true,
        },
    }
}

fn fire_weapons(
    battle: &mut Battle,
    me: UnitId,
    kinematics: &Kinematics,
    owner: EmpireId,
    ship: &mut ShipState,
) {
    let position = kinematics.position;
    let hostile = UnitFlags::owner(owner);
    let attacking = ship.attacking;

    for weapon in &mut ship.loadout.weapons {
        if weapon.ready_in > 0 {
            weapon.ready_in -= 1;
            continue;
        }
        let target = match weapon.kind {
            WeaponKind::PointDefense => battle.index.find_nearest_in_radius_where(
                position,
                weapon.range,
                UnitFlags::FIGHTERS | UnitFlags::MISSILE,
                hostile,
                |t| battle.is_targetable(t),
            ),
            WeaponKind::DirectFire | WeaponKind::MissileLauncher => attacking
                .filter(|t| {
                    battle.is_targetable(*t)
                        && battle
                            .position(*t)
                            .is_some_and(|p| p.distance(position) <= weapon.range)
                })
                .or_else(|| {
                    battle.index.find_nearest_in_radius_where(
                        position,
                        weapon.range,
                        UnitFlags::SHIP,
                        hostile,
                        |t| battle.is_targetable(t),
                    )
                }),
        };
        let Some(target) = target else {
            continue;
        };

        weapon.ready_in = weapon.cooldown_ticks;
        battle.listener.unit_fired(me, target, &weapon.name);
        if weapon.kind == WeaponKind::MissileLauncher {
            world_setup::spawn_missile(battle, me, owner, kinematics, target, weapon.damage, &weapon.name);
        } else {
            battle.apply_damage(target, weapon.damage);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standoff_point_clamps_to_range() {
        let point = standoff_point(Vec3::new(100.0, 0.0, 0.0), Vec3::ZERO, 30.0);
        assert!((point - Vec3::new(30.0, 0.0, 0.0)).length() < 1e-4);
        let close = standoff_point(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO, 30.0);
        assert!((close - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_starlane_entry_requires_both_near() {
        let config = SimConfig {
            starlane_entry_points: vec![Vec3::new(500.0, 0.0, 0.0)],
            ..SimConfig::default()
        };
        let entry = Vec3::new(500.0, 0.0, 0.0);
        assert!(at_starlane_entry(&config, Vec3::new(495.0, 0.0, 0.0), entry));
        assert!(!at_starlane_entry(&config, Vec3::ZERO, entry));
        assert!(!at_starlane_entry(&config, entry, Vec3::ZERO));
    }
}
