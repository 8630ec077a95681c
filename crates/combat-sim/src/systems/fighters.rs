//! Fighter system: formation leaders resolve missions, members keep station
//! and fight.
//!
//! The leader is an invisible anchor. It owns the formation's mission stack
//! and publishes a mission destination, weight and target. Leaders and
//! members steer by strict priority: static obstacles, then imminent
//! collisions with non-fighters, then a weighted blend. The leader blends
//! mission attraction with threat avoidance and flocking over the members;
//! a member blends slot keeping with threat avoidance and flocking among
//! nearby formation-mates.

use glam::Vec3;
use hecs::Entity;

use combat_core::components::*;
use combat_core::constants::*;
use combat_core::enums::FighterKind;
use combat_core::flags::UnitFlags;
use combat_core::missions::{FighterMission, Mission};
use combat_core::types::{EmpireId, FormationId, SimTime, UnitId};
use combat_obstacles::avoidance_force;

use crate::battle::{unit_id, Battle, Departure};
use crate::engine::SimConfig;
use crate::formation::slot_offset;
use crate::spatial::ProximityToken;
use crate::systems::steering::{self, Neighbor};

enum Step {
    Settled,
    Continue,
}

pub fn run(battle: &mut Battle, time: &SimTime, config: &SimConfig) {
    let leaders: Vec<Entity> = battle
        .world
        .query::<&FormationLeader>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();
    for entity in leaders {
        if battle.world.contains(entity) {
            update_leader(battle, entity, time, config);
        }
    }

    let members: Vec<Entity> = battle
        .world
        .query::<&FighterState>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();
    for entity in members {
        if battle.world.contains(entity) {
            update_member(battle, entity, time, config);
        }
    }
}

/// What hostiles a fighter kind engages.
pub fn engagement_mask(kind: FighterKind) -> UnitFlags {
    match kind {
        FighterKind::Interceptor => UnitFlags::FIGHTERS | UnitFlags::MISSILE,
        FighterKind::Bomber => UnitFlags::SHIP,
    }
}

// --- Leaders ---

fn update_leader(battle: &mut Battle, entity: Entity, time: &SimTime, config: &SimConfig) {
    let me = unit_id(entity);
    let Ok((mut kinematics, owner, mut leader, mut steering)) = battle
        .world
        .query_one_mut::<(&Kinematics, &Owner, &FormationLeader, &Steering)>(entity)
        .map(|(k, o, l, s)| (*k, o.0, l.clone(), *s))
    else {
        return;
    };

    if time.is_mission_tick(entity.id(), config.mission_stagger) {
        resolve_missions(battle, me, &kinematics, owner, &mut leader, time.tick);
        let members = member_neighbors(battle, leader.formation, None);
        steering = steer_leader(battle, &kinematics, owner, &leader, &members);
    }

    if matches!(leader.missions.current(), FighterMission::ReturnToBase) {
        let docked = battle
            .position(leader.carrier)
            .is_some_and(|p| p.distance(kinematics.position) <= FIGHTER_DOCKING_DISTANCE);
        if docked {
            dock_formation(battle, leader.formation, leader.carrier, time.tick);
            return;
        }
    }

    if steering.brake {
        kinematics.brake(SHIP_BRAKE_RATE, DT);
    } else {
        kinematics.apply_steering_force(steering.force, DT);
    }

    if let Ok((k, l, s)) = battle
        .world
        .query_one_mut::<(&mut Kinematics, &mut FormationLeader, &mut Steering)>(entity)
    {
        *k = kinematics;
        *l = leader;
        *s = steering;
    }
}

pub(crate) fn resolve_missions(
    battle: &Battle,
    me: UnitId,
    kinematics: &Kinematics,
    owner: EmpireId,
    leader: &mut FormationLeader,
    tick: u64,
) {
    for _ in 0..MAX_MISSION_RESOLUTION_STEPS {
        let before = *leader.missions.current();
        let step = evaluate(battle, kinematics, owner, leader);
        let after = *leader.missions.current();
        if before != after {
            tracing::debug!(
                tick,
                unit = %me,
                formation = %leader.formation,
                from = before.name(),
                to = after.name(),
                "formation mission transition"
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
    leader: &mut FormationLeader,
) -> Step {
    let position = kinematics.position;
    let hostile = UnitFlags::owner(owner);

    match *leader.missions.current() {
        FighterMission::None => {
            if leader.missions.len() == 1 {
                leader.missions.replace(FighterMission::roaming(leader.kind));
            } else {
                leader.missions.pop();
            }
            Step::Continue
        }
        FighterMission::MoveTo { destination } => {
            if position.distance_squared(destination) < ARRIVAL_DISTANCE_SQUARED {
                return pop(leader);
            }
            settle(leader, Some(destination), None)
        }
        FighterMission::PatrolTo { destination } => {
            if position.distance_squared(destination) < ARRIVAL_DISTANCE_SQUARED {
                return pop(leader);
            }
            let found = battle.index.find_nearest_in_radius_where(
                position,
                FIGHTER_ENGAGEMENT_RADIUS,
                engagement_mask(leader.kind),
                hostile,
                |t| battle.is_targetable(t),
            );
            match found {
                Some(target) => {
                    leader.missions.push(FighterMission::AttackThis { target });
                    Step::Continue
                }
                None => settle(leader, Some(destination), None),
            }
        }
        FighterMission::AttackThis { target } => {
            match battle.is_targetable(target).then(|| battle.position(target)).flatten() {
                Some(target_position) => settle(leader, Some(target_position), Some(target)),
                None => pop(leader),
            }
        }
        FighterMission::DefendThis { target } => {
            let Some(defended) = battle.position(target) else {
                return pop(leader);
            };
            let attacker = battle.weakest(battle.attackers.attackers_of(target), position);
            match attacker.and_then(|a| battle.position(a).map(|p| (a, p))) {
                Some((attacker, attacker_position)) => {
                    settle(leader, Some(attacker_position), Some(attacker))
                }
                None => settle(leader, Some(defended), None),
            }
        }
        FighterMission::AttackFightersBombersFirst => {
            let found = nearest_hostile(battle, position, UnitFlags::BOMBER, hostile)
                .or_else(|| nearest_hostile(battle, position, UnitFlags::INTERCEPTOR, hostile));
            push_attack_or_pop(leader, found)
        }
        FighterMission::AttackFightersInterceptorsFirst => {
            let found = nearest_hostile(battle, position, UnitFlags::INTERCEPTOR, hostile)
                .or_else(|| nearest_hostile(battle, position, UnitFlags::BOMBER, hostile));
            push_attack_or_pop(leader, found)
        }
        FighterMission::AttackShipsWeakestFirst => {
            let candidates = battle.index.find_all(UnitFlags::SHIP, hostile);
            let found = battle.weakest(candidates, position);
            push_attack_or_pop(leader, found)
        }
        FighterMission::AttackShipsNearestFirst => {
            let found = nearest_hostile(battle, position, UnitFlags::SHIP, hostile);
            push_attack_or_pop(leader, found)
        }
        FighterMission::ReturnToBase => match battle.position(leader.carrier) {
            Some(carrier) => settle(leader, Some(carrier), None),
            None => pop(leader),
        },
    }
}

fn nearest_hostile(battle: &Battle, position: Vec3, kinds: UnitFlags, hostile: UnitFlags) -> Option<UnitId> {
    battle
        .index
        .find_nearest_where(position, kinds, hostile, |t| battle.is_targetable(t))
}

fn settle(leader: &mut FormationLeader, destination: Option<Vec3>, target: Option<UnitId>) -> Step {
    leader.mission_destination = destination;
    leader.mission_weight = if destination.is_some() { MISSION_WEIGHT } else { 0.0 };
    leader.mission_target = target;
    Step::Settled
}

fn pop(leader: &mut FormationLeader) -> Step {
    leader.missions.pop();
    if leader.missions.len() == 1 && leader.missions.current().is_none() {
        settle(leader, None, None)
    } else {
        Step::Continue
    }
}

fn push_attack_or_pop(leader: &mut FormationLeader, target: Option<UnitId>) -> Step {
    match target {
        Some(target) => {
            leader.missions.push(FighterMission::AttackThis { target });
            Step::Continue
        }
        None => pop(leader),
    }
}

fn steer_leader(
    battle: &Battle,
    kinematics: &Kinematics,
    owner: EmpireId,
    leader: &FormationLeader,
    members: &[Neighbor],
) -> Steering {
    if let Some(force) = overriding_avoidance(battle, kinematics, None) {
        return Steering { force, brake: false };
    }
    let Some(destination) = leader.mission_destination else {
        return Steering {
            force: Vec3::ZERO,
            brake: true,
        };
    };
    // attack target and docking carrier exert no push
    let mut spared: Vec<UnitId> = leader.mission_target.into_iter().collect();
    if matches!(leader.missions.current(), FighterMission::ReturnToBase) {
        spared.push(leader.carrier);
    }
    let max_force = kinematics.max_force;
    let force = steering::seek(kinematics, destination) * leader.mission_weight
        + threat_avoidance(battle, kinematics, owner, leader.kind, &spared)
        + steering::separation(kinematics, members) * SEPARATION_WEIGHT * max_force
        + steering::alignment(kinematics, members) * ALIGNMENT_WEIGHT * max_force
        + steering::cohesion(kinematics, members) * COHESION_WEIGHT * max_force;
    Steering { force, brake: false }
}

fn dock_formation(battle: &mut Battle, formation: FormationId, carrier: UnitId, tick: u64) {
    let Some(members) = battle.formations.get(&formation).map(|f| f.members().to_vec()) else {
        return;
    };
    for member in members {
        let Some(entity) = battle.entity(member.unit) else {
            continue;
        };
        let kind = battle.world.get::<&FighterState>(entity).ok().map(|f| f.kind);
        if let (Some(kind), Some(carrier_entity)) = (kind, battle.entity(carrier)) {
            if let Ok(mut ship) = battle.world.get::<&mut ShipState>(carrier_entity) {
                if let Some(hangar) = ship.loadout.hangar_mut(kind) {
                    hangar.docked = (hangar.docked + 1).min(hangar.capacity);
                }
            }
        }
        battle.listener.fighter_docked(member.unit, carrier);
        battle.remove_unit(entity, Departure::Withdrawn);
    }
    tracing::info!(tick, formation = %formation, carrier = %carrier, "formation docked");
}

// --- Members ---

fn update_member(battle: &mut Battle, entity: Entity, time: &SimTime, config: &SimConfig) {
    let me = unit_id(entity);
    let Ok((mut kinematics, owner, mut fighter, mut steering)) = battle
        .world
        .query_one_mut::<(&Kinematics, &Owner, &FighterState, &Steering)>(entity)
        .map(|(k, o, f, s)| (*k, o.0, *f, *s))
    else {
        return;
    };

    let leader = battle
        .formations
        .get(&fighter.formation)
        .and_then(|f| f.leader())
        .and_then(|l| battle.entity(l))
        .and_then(|l| {
            let entity_ref = battle.world.entity(l).ok()?;
            let k = *entity_ref.get::<&Kinematics>()?;
            let target = entity_ref.get::<&FormationLeader>()?.mission_target;
            Some((k, target))
        });

    if time.is_mission_tick(entity.id(), config.mission_stagger) {
        let mission_target = leader.and_then(|(_, target)| target);
        battle.attackers.retarget(me, fighter.attacking, mission_target);
        fighter.attacking = mission_target;

        steering = match leader {
            Some((leader_kinematics, _)) => {
                let slot = leader_kinematics.local_to_world(slot_offset(fighter.slot));
                scale_to_slot(&mut kinematics, &fighter, &leader_kinematics, slot);
                steer_member(battle, entity, &kinematics, owner, &fighter, slot)
            }
            None => Steering {
                force: Vec3::ZERO,
                brake: true,
            },
        };
    }

    if steering.brake {
        kinematics.brake(SHIP_BRAKE_RATE, DT);
    } else {
        kinematics.apply_steering_force(steering.force, DT);
    }

    fire_weapon(battle, me, &kinematics, owner, &mut fighter);

    if let Ok((k, f, s, token)) = battle
        .world
        .query_one_mut::<(&mut Kinematics, &mut FighterState, &mut Steering, &ProximityToken)>(entity)
    {
        *k = kinematics;
        *f = fighter;
        *s = steering;
        battle.index.update(token, kinematics.position);
    }
}

/// Slow a follower smoothly as it closes on its slot, never below the
/// leader's current speed.
fn scale_to_slot(kinematics: &mut Kinematics, fighter: &FighterState, leader: &Kinematics, slot: Vec3) {
    let out_of_position = kinematics.position.distance(slot);
    let scale = steering::sigmoid(
        out_of_position,
        FORMATION_SIGMOID_STEEPNESS,
        FORMATION_SIGMOID_MIDPOINT,
    );
    kinematics.max_speed = (fighter.base_max_speed * scale)
        .max(leader.speed)
        .min(fighter.base_max_speed);
    kinematics.max_force = fighter.base_max_force * scale.max(0.2);
}

fn steer_member(
    battle: &Battle,
    entity: Entity,
    kinematics: &Kinematics,
    owner: EmpireId,
    fighter: &FighterState,
    slot: Vec3,
) -> Steering {
    let me = unit_id(entity);
    if let Some(force) = overriding_avoidance(battle, kinematics, Some(me)) {
        return Steering { force, brake: false };
    }

    let position = kinematics.position;
    let max_force = kinematics.max_force;
    let spared: Vec<UnitId> = fighter.attacking.into_iter().collect();
    let mut force = steering::seek(kinematics, slot) * FORMATION_WEIGHT
        + threat_avoidance(battle, kinematics, owner, fighter.kind, &spared);

    let mates = member_neighbors(battle, fighter.formation, Some(me))
        .into_iter()
        .filter(|n| n.position.distance(position) <= FLOCK_NEIGHBOR_RADIUS)
        .collect::<Vec<_>>();
    force += steering::separation(kinematics, &mates) * SEPARATION_WEIGHT * max_force
        + steering::alignment(kinematics, &mates) * ALIGNMENT_WEIGHT * max_force
        + steering::cohesion(kinematics, &mates) * COHESION_WEIGHT * max_force;

    Steering { force, brake: false }
}

/// Weighted pushes away from danger: hostile interceptors (bombers only),
/// nearby non-fighters and hostile ships carrying point defense. Units in
/// `spared` push nothing.
fn threat_avoidance(
    battle: &Battle,
    kinematics: &Kinematics,
    owner: EmpireId,
    kind: FighterKind,
    spared: &[UnitId],
) -> Vec3 {
    let position = kinematics.position;
    let max_force = kinematics.max_force;
    let hostile = UnitFlags::owner(owner);
    let mut force = Vec3::ZERO;

    if kind == FighterKind::Bomber {
        let interceptors = battle
            .index
            .find_in_radius(position, BOMBER_EVASION_RADIUS, UnitFlags::INTERCEPTOR, hostile)
            .into_iter()
            .filter_map(|u| battle.position(u))
            .map(|p| (p, 1.0));
        force += steering::repulsion(kinematics, interceptors) * BOMBER_EVASION_WEIGHT * max_force;
    }

    let non_fighters = battle
        .index
        .find_in_radius(
            position,
            NONFIGHTER_REPULSION_RADIUS,
            UnitFlags::NON_FIGHTERS,
            UnitFlags::empty(),
        )
        .into_iter()
        .filter(|u| !spared.contains(u))
        .filter_map(|u| battle.position(u))
        .map(|p| (p, 1.0));
    force += steering::repulsion(kinematics, non_fighters) * NONFIGHTER_REPULSION_WEIGHT * max_force;

    let point_defense = battle
        .index
        .find_in_radius(position, PD_REPULSION_RADIUS, UnitFlags::SHIP, hostile)
        .into_iter()
        .filter(|u| !spared.contains(u))
        .filter_map(|u| Some((battle.position(u)?, battle.pd_strength(u))))
        .filter(|(_, strength)| *strength > 0.0);
    force + steering::repulsion(kinematics, point_defense) * PD_REPULSION_WEIGHT * max_force
}

/// Static obstacle avoidance, then imminent collision with a non-fighter.
/// Either one replaces every other behavior.
fn overriding_avoidance(battle: &Battle, kinematics: &Kinematics, me: Option<UnitId>) -> Option<Vec3> {
    let avoid = avoidance_force(
        &battle.obstacles,
        kinematics.position,
        kinematics.forward,
        kinematics.speed,
        kinematics.max_force,
        OBSTACLE_AVOIDANCE_TIME,
    );
    if avoid != Vec3::ZERO {
        return Some(avoid);
    }

    let neighbors: Vec<Neighbor> = battle
        .index
        .find_in_radius(
            kinematics.position,
            NEIGHBOR_AVOIDANCE_RADIUS,
            UnitFlags::NON_FIGHTERS,
            UnitFlags::empty(),
        )
        .into_iter()
        .filter(|u| Some(*u) != me)
        .filter_map(|u| battle.kinematics(u))
        .map(|k| Neighbor::of(&k))
        .collect();
    let dodge = steering::avoid_neighbors(kinematics, &neighbors, NEIGHBOR_AVOIDANCE_TIME);
    (dodge != Vec3::ZERO).then_some(dodge)
}

/// Live formation members, optionally excluding one.
fn member_neighbors(battle: &Battle, formation: FormationId, except: Option<UnitId>) -> Vec<Neighbor> {
    let Some(formation) = battle.formations.get(&formation) else {
        return Vec::new();
    };
    formation
        .members()
        .iter()
        .filter(|m| Some(m.unit) != except)
        .filter_map(|m| battle.kinematics(m.unit))
        .map(|k| Neighbor::of(&k))
        .collect()
}

fn fire_weapon(
    battle: &mut Battle,
    me: UnitId,
    kinematics: &Kinematics,
    owner: EmpireId,
    fighter: &mut FighterState,
) {
    if fighter.weapon.ready_in > 0 {
        fighter.weapon.ready_in -= 1;
        return;
    }
    let position = kinematics.position;
    let range = fighter.weapon.range;
    let mask = engagement_mask(fighter.kind);

    let preferred = fighter.attacking.filter(|t| {
        battle.is_targetable(*t)
            && battle
                .kind(*t)
                .is_some_and(|k| UnitFlags::kind(k).intersects(mask))
            && battle.position(*t).is_some_and(|p| p.distance(position) <= range)
    });
    let target = preferred.or_else(|| {
        battle
            .index
            .find_nearest_in_radius_where(position, range, mask, UnitFlags::owner(owner), |t| {
                battle.is_targetable(t)
            })
    });
    let Some(target) = target else {
        return;
    };

    fighter.weapon.ready_in = fighter.weapon.cooldown_ticks;
    battle.listener.fighter_fired(me, target);
    battle.apply_damage(target, fighter.weapon.damage);
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::missions::MissionQueue;
    use combat_obstacles::{Obstacle, SphereObstacle};

    use crate::spatial::ProximityIndex;
    use crate::world_setup::{self, ShipSpec};

    fn battle() -> Battle {
        Battle::new(ProximityIndex::new(Vec3::ZERO, 2000.0, 32))
    }

    /// Hostile carrier at `position` with a wing of interceptors parked on it.
    fn hostile_carrier(battle: &mut Battle, position: Vec3) -> UnitId {
        let carrier = world_setup::spawn_ship(battle, ShipSpec::carrier(EmpireId(1), position));
        world_setup::launch_formation(battle, carrier, FighterKind::Interceptor, 3).unwrap();
        carrier
    }

    fn bomber_leader(destination: Vec3) -> FormationLeader {
        FormationLeader {
            formation: FormationId(99),
            kind: FighterKind::Bomber,
            carrier: UnitId::from_bits(u64::MAX),
            missions: MissionQueue::with(FighterMission::MoveTo { destination }),
            mission_destination: Some(destination),
            mission_weight: MISSION_WEIGHT,
            mission_target: None,
        }
    }

    fn fighter(base_max_speed: f32, base_max_force: f32) -> FighterState {
        FighterState {
            kind: FighterKind::Interceptor,
            formation: FormationId(0),
            slot: 1,
            carrier: UnitId::from_bits(1),
            weapon: FighterWeapon {
                range: 10.0,
                damage: 1.0,
                cooldown_ticks: 5,
                ready_in: 0,
            },
            base_max_speed,
            base_max_force,
            attacking: None,
        }
    }

    #[test]
    fn test_follower_far_from_slot_gets_full_limits() {
        let fighter = fighter(30.0, 60.0);
        let leader = Kinematics::new(Vec3::ZERO, Vec3::X, 27.0, 60.0, 0.0);
        let mut kinematics = Kinematics::new(Vec3::new(-50.0, 0.0, 0.0), Vec3::X, 30.0, 60.0, 1.0);

        scale_to_slot(&mut kinematics, &fighter, &leader, Vec3::ZERO);

        assert!((kinematics.max_speed - 30.0).abs() < 1e-3);
        assert!((kinematics.max_force - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_follower_in_slot_slows_to_leader_speed() {
        let fighter = fighter(30.0, 60.0);
        let mut leader = Kinematics::new(Vec3::ZERO, Vec3::X, 27.0, 60.0, 0.0);
        leader.speed = 12.0;
        let mut kinematics = Kinematics::new(Vec3::ZERO, Vec3::X, 30.0, 60.0, 1.0);

        scale_to_slot(&mut kinematics, &fighter, &leader, Vec3::ZERO);

        // the sigmoid alone would drop it well below the leader
        assert_eq!(kinematics.max_speed, 12.0);
        assert!((kinematics.max_force - 60.0 * 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_follower_scaling_is_monotonic_in_distance() {
        let fighter = fighter(30.0, 60.0);
        let leader = Kinematics::new(Vec3::ZERO, Vec3::X, 27.0, 60.0, 0.0);
        let mut previous = 0.0;
        for distance in [0.0, 1.0, 2.0, 3.0, 4.0, 6.0, 10.0] {
            let mut kinematics = Kinematics::new(Vec3::new(distance, 0.0, 0.0), Vec3::X, 30.0, 60.0, 1.0);
            scale_to_slot(&mut kinematics, &fighter, &leader, Vec3::ZERO);
            assert!(kinematics.max_speed >= previous);
            previous = kinematics.max_speed;
        }
    }

    #[test]
    fn test_leader_steers_away_from_interceptors_and_point_defense() {
        let destination = Vec3::new(0.0, 300.0, 0.0);
        let kinematics = Kinematics::new(Vec3::ZERO, Vec3::Y, 20.0, 5.0, 0.0);
        let leader = bomber_leader(destination);

        let calm = steer_leader(&battle(), &kinematics, EmpireId(0), &leader, &[]);

        let mut threatened = battle();
        hostile_carrier(&mut threatened, Vec3::new(22.0, 0.0, 0.0));
        let evading = steer_leader(&threatened, &kinematics, EmpireId(0), &leader, &[]);

        assert!(calm.force.x.abs() < 1e-4);
        assert!(evading.force.x < calm.force.x - 0.1, "{:?} vs {:?}", evading.force, calm.force);
        assert!(!evading.brake);
    }

    #[test]
    fn test_bombers_evade_interceptors_harder_than_interceptors_do() {
        let mut battle = battle();
        hostile_carrier(&mut battle, Vec3::new(22.0, 0.0, 0.0));
        let kinematics = Kinematics::new(Vec3::ZERO, Vec3::Y, 20.0, 5.0, 1.0);

        let bomber = threat_avoidance(&battle, &kinematics, EmpireId(0), FighterKind::Bomber, &[]);
        let interceptor = threat_avoidance(&battle, &kinematics, EmpireId(0), FighterKind::Interceptor, &[]);

        // point defense pushes both; only bombers flee interceptors
        assert!(interceptor.x < 0.0);
        assert!(bomber.x < interceptor.x);
    }

    #[test]
    fn test_point_defense_pushes_unless_spared_or_friendly() {
        let mut battle = battle();
        let carrier = hostile_carrier(&mut battle, Vec3::new(35.0, 0.0, 0.0));
        let kinematics = Kinematics::new(Vec3::ZERO, Vec3::Y, 20.0, 5.0, 1.0);

        let pushed = threat_avoidance(&battle, &kinematics, EmpireId(0), FighterKind::Interceptor, &[]);
        let spared = threat_avoidance(&battle, &kinematics, EmpireId(0), FighterKind::Interceptor, &[carrier]);
        let friendly = threat_avoidance(&battle, &kinematics, EmpireId(1), FighterKind::Interceptor, &[]);

        assert!(pushed.x < 0.0);
        assert_eq!(spared, Vec3::ZERO);
        assert_eq!(friendly, Vec3::ZERO);
    }

    #[test]
    fn test_obstacle_avoidance_overrides_everything() {
        let mut battle = battle();
        hostile_carrier(&mut battle, Vec3::new(0.0, 22.0, 0.0));
        battle
            .obstacles
            .push(Obstacle::Sphere(SphereObstacle::new(Vec3::new(20.0, 1.0, 0.0), 5.0)));
        let mut kinematics = Kinematics::new(Vec3::ZERO, Vec3::X, 20.0, 5.0, 0.0);
        kinematics.speed = 10.0;
        let leader = bomber_leader(Vec3::new(300.0, 0.0, 0.0));

        let steering = steer_leader(&battle, &kinematics, EmpireId(0), &leader, &[]);

        let expected = avoidance_force(
            &battle.obstacles,
            kinematics.position,
            kinematics.forward,
            kinematics.speed,
            kinematics.max_force,
            OBSTACLE_AVOIDANCE_TIME,
        );
        assert_ne!(expected, Vec3::ZERO);
        assert_eq!(steering.force, expected);
    }

    #[test]
    fn test_imminent_collision_overrides_mission() {
        let mut battle = battle();
        world_setup::spawn_ship(&mut battle, ShipSpec::corvette(EmpireId(1), Vec3::new(20.0, 0.0, 0.0)));
        let mut kinematics = Kinematics::new(Vec3::ZERO, Vec3::X, 20.0, 5.0, 1.0);
        kinematics.speed = 10.0;
        let leader = bomber_leader(Vec3::new(300.0, 0.0, 0.0));

        let steering = steer_leader(&battle, &kinematics, EmpireId(0), &leader, &[]);

        // a pure side-step: no pull toward the destination straight ahead
        assert!(steering.force.dot(kinematics.forward).abs() < 1e-4);
        assert!((steering.force.length() - kinematics.max_force).abs() < 1e-4);
    }
}
