//! Cleanup system: removes units whose structure reached zero.
//!
//! Damage never removes a unit directly. Units destroyed during the tick
//! leave here, after every unit has had its update.

use hecs::{Entity, World};

use combat_core::components::Structure;
use combat_core::enums::UnitKind;

use crate::battle::{Battle, Departure};

/// Remove destroyed units. Uses a pre-allocated buffer to avoid per-tick allocation.
pub fn run(battle: &mut Battle, despawn_buffer: &mut Vec<Entity>) {
    collect_destroyed(&mut battle.world, despawn_buffer);
    for entity in despawn_buffer.drain(..) {
        battle.remove_unit(entity, Departure::Destroyed);
    }
}

fn collect_destroyed(world: &mut World, despawn_buffer: &mut Vec<Entity>) {
    despawn_buffer.clear();
    for (entity, (structure, _kind)) in world.query_mut::<(&Structure, &UnitKind)>() {
        if structure.is_destroyed() {
            despawn_buffer.push(entity);
        }
    }
}
