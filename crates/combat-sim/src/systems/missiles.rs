//! Missile system: track the target, detonate on arrival.

use glam::Vec3;
use hecs::Entity;

use combat_core::components::*;
use combat_core::constants::*;
use combat_core::types::SimTime;
use combat_obstacles::avoidance_force;

use crate::battle::{unit_id, Battle, Departure};
use crate::engine::SimConfig;
use crate::spatial::ProximityToken;
use crate::systems::steering;

pub fn run(battle: &mut Battle, time: &SimTime, config: &SimConfig) {
    let missiles: Vec<Entity> = battle
        .world
        .query::<&MissileState>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();

    for entity in missiles {
        if battle.world.contains(entity) {
            update_missile(battle, entity, time, config);
        }
    }
}

fn update_missile(battle: &mut Battle, entity: Entity, time: &SimTime, config: &SimConfig) {
    let Ok((mut kinematics, mut missile, mut steering)) = battle
        .world
        .query_one_mut::<(&Kinematics, &MissileState, &Steering)>(entity)
        .map(|(k, m, s)| (*k, m.clone(), *s))
    else {
        return;
    };

    let eligible = time.is_mission_tick(entity.id(), config.mission_stagger);
    if eligible {
        if let Some(target_position) = battle
            .is_targetable(missile.target)
            .then(|| battle.position(missile.target))
            .flatten()
        {
            missile.destination = target_position;
        }
    }

    if kinematics.position.distance_squared(missile.destination) < kinematics.speed * kinematics.speed {
        detonate(battle, entity, &missile, time.tick);
        return;
    }

    if eligible {
        steering = steer(battle, &kinematics, missile.destination);
    }
    kinematics.apply_steering_force(steering.force, DT);

    if let Ok((k, m, s, token)) = battle
        .world
        .query_one_mut::<(&mut Kinematics, &mut MissileState, &mut Steering, &ProximityToken)>(entity)
    {
        *k = kinematics;
        *m = missile;
        *s = steering;
        battle.index.update(token, kinematics.position);
    }
}

/// Damage a surviving target, or fizzle if it is already gone. Either way
/// the missile leaves the battle.
fn detonate(battle: &mut Battle, entity: Entity, missile: &MissileState, tick: u64) {
    let me = unit_id(entity);
    if battle.is_targetable(missile.target) {
        let is_fighter = battle.kind(missile.target).is_some_and(|k| k.is_fighter());
        let damage = if is_fighter {
            missile.damage * MISSILE_VS_FIGHTER_DAMAGE_FACTOR
        } else {
            missile.damage
        };
        battle.apply_damage(missile.target, damage);
        battle.listener.missile_exploded(me, missile.target);
        tracing::debug!(tick, missile = %me, target = %missile.target, damage, "missile exploded");
    } else {
        battle.listener.missile_removed(me);
        tracing::debug!(tick, missile = %me, "missile lost its target");
    }
    battle.remove_unit(entity, Departure::Withdrawn);
}

/// Obstacle avoidance overrides pursuit.
fn steer(battle: &Battle, kinematics: &Kinematics, destination: Vec3) -> Steering {
    let avoid = avoidance_force(
        &battle.obstacles,
        kinematics.position,
        kinematics.forward,
        kinematics.speed,
        kinematics.max_force,
        OBSTACLE_AVOIDANCE_TIME,
    );
    let force = if avoid != Vec3::ZERO {
        avoid
    } else {
        steering::seek(kinematics, destination)
    };
    Steering { force, brake: false }
}
