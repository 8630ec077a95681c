//! Battle archive: explicit save and restore of the whole engine state.
//!
//! Units are archived with their registry handles. Restore respawns each
//! unit at its original handle, so every weak reference held in missions,
//! formations and the attacker index stays valid without remapping. The
//! proximity index is rebuilt from unit positions. Handles of dead units
//! that are still referenced are retired again on restore, so they keep
//! failing to resolve and are never handed out to new spawns.

use std::collections::BTreeSet;

use hecs::EntityRef;
use serde::{Deserialize, Serialize};

use combat_core::components::*;
use combat_core::enums::UnitKind;
use combat_core::error::{CombatError, Result};
use combat_core::missions::Mission;
use combat_core::types::{EmpireId, SimTime, UnitId};
use combat_obstacles::Obstacle;

use crate::attackers::AttackerIndex;
use crate::battle::{entity_of, unit_id, Battle};
use crate::engine::SimConfig;
use crate::formation::Formation;
use crate::spatial::ProximityIndex;

pub const ARCHIVE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleArchive {
    pub version: u32,
    pub config: SimConfig,
    pub time: SimTime,
    pub next_formation: u32,
    /// Sorted by id.
    pub units: Vec<UnitRecord>,
    pub formations: Vec<Formation>,
    /// (attackee, attackers) pairs.
    pub attackers: Vec<(UnitId, Vec<UnitId>)>,
    pub obstacles: Vec<Obstacle>,
}

impl BattleArchive {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One registry entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub id: UnitId,
    pub owner: EmpireId,
    pub kinematics: Kinematics,
    pub steering: Steering,
    pub body: UnitBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum UnitBody {
    Ship { structure: Structure, state: ShipState },
    Fighter { structure: Structure, state: FighterState },
    Missile { structure: Structure, state: MissileState },
    /// Formation steering anchor.
    Leader { state: FormationLeader },
}

impl UnitBody {
    fn read(entity_ref: &EntityRef<'_>) -> Option<Self> {
        if let Some(state) = entity_ref.get::<&FormationLeader>() {
            return Some(UnitBody::Leader {
                state: FormationLeader::clone(&state),
            });
        }
        let structure = *entity_ref.get::<&Structure>()?;
        if let Some(state) = entity_ref.get::<&ShipState>() {
            return Some(UnitBody::Ship {
                structure,
                state: ShipState::clone(&state),
            });
        }
        if let Some(state) = entity_ref.get::<&FighterState>() {
            return Some(UnitBody::Fighter {
                structure,
                state: *state,
            });
        }
        entity_ref.get::<&MissileState>().map(|state| UnitBody::Missile {
            structure,
            state: MissileState::clone(&state),
        })
    }

    /// Every weak handle this body holds.
    fn references(&self) -> Vec<UnitId> {
        match self {
            UnitBody::Ship { state, .. } => state
                .missions
                .iter()
                .filter_map(Mission::target)
                .chain(state.attacking)
                .collect(),
            UnitBody::Fighter { state, .. } => {
                std::iter::once(state.carrier).chain(state.attacking).collect()
            }
            UnitBody::Missile { state, .. } => vec![state.target, state.launcher],
            UnitBody::Leader { state } => state
                .missions
                .iter()
                .filter_map(Mission::target)
                .chain(std::iter::once(state.carrier))
                .chain(state.mission_target)
                .collect(),
        }
    }
}

/// Snapshot the battle.
pub fn capture(battle: &Battle, time: &SimTime, config: &SimConfig) -> BattleArchive {
    let mut units = Vec::new();
    for (entity, (owner, kinematics, steering)) in battle
        .world
        .query::<(&Owner, &Kinematics, &Steering)>()
        .iter()
    {
        let Ok(entity_ref) = battle.world.entity(entity) else {
            continue;
        };
        let Some(body) = UnitBody::read(&entity_ref) else {
            continue;
        };
        units.push(UnitRecord {
            id: unit_id(entity),
            owner: owner.0,
            kinematics: *kinematics,
            steering: *steering,
            body,
        });
    }
    units.sort_by_key(|u| u.id);

    BattleArchive {
        version: ARCHIVE_VERSION,
        config: config.clone(),
        time: *time,
        next_formation: battle.next_formation,
        units,
        formations: battle.formations.values().cloned().collect(),
        attackers: battle.attackers.to_pairs(),
        obstacles: battle.obstacles.clone(),
    }
}

/// Rebuild a battle from an archive. The listener and target ranking start
/// as the defaults.
pub fn rebuild(archive: BattleArchive) -> Result<(Battle, SimTime, SimConfig)> {
    if archive.version != ARCHIVE_VERSION {
        return Err(CombatError::ArchiveVersion {
            found: archive.version,
            expected: ARCHIVE_VERSION,
        });
    }
    let config = archive.config.clone();
    let index = ProximityIndex::new(config.index_center, config.index_diameter, config.index_cells);
    let mut battle = Battle::new(index);

    retire_dead_handles(&mut battle, &archive);

    for record in archive.units {
        let entity = entity_of(record.id).ok_or(CombatError::InvalidHandle(record.id.to_bits()))?;
        let owner = Owner(record.owner);
        let position = record.kinematics.position;
        let kind = match record.body {
            UnitBody::Ship { structure, state } => {
                battle.world.spawn_at(
                    entity,
                    (UnitKind::Ship, owner, record.kinematics, structure, state, record.steering),
                );
                Some(UnitKind::Ship)
            }
            UnitBody::Fighter { structure, state } => {
                let kind = state.kind.unit_kind();
                battle.world.spawn_at(
                    entity,
                    (kind, owner, record.kinematics, structure, state, record.steering),
                );
                Some(kind)
            }
            UnitBody::Missile { structure, state } => {
                battle.world.spawn_at(
                    entity,
                    (UnitKind::Missile, owner, record.kinematics, structure, state, record.steering),
                );
                Some(UnitKind::Missile)
            }
            UnitBody::Leader { state } => {
                battle
                    .world
                    .spawn_at(entity, (owner, record.kinematics, state, record.steering));
                None
            }
        };
        if let Some(kind) = kind {
            battle.index_unit(entity, kind, record.owner, position);
        }
    }

    battle.formations = archive
        .formations
        .into_iter()
        .map(|f| (f.id(), f))
        .collect();
    battle.next_formation = archive.next_formation;
    battle.attackers = AttackerIndex::from_pairs(archive.attackers);
    battle.obstacles = archive.obstacles;

    tracing::info!(
        tick = archive.time.tick,
        units = battle.unit_count(),
        formations = battle.formations.len(),
        "battle restored"
    );
    Ok((battle, archive.time, config))
}

/// Occupy and free each referenced handle whose unit is gone, so the slot's
/// generation moves past it the way it did in the saved world. Ascending
/// order retires older generations of a shared slot first.
fn retire_dead_handles(battle: &mut Battle, archive: &BattleArchive) {
    let live: BTreeSet<UnitId> = archive.units.iter().map(|u| u.id).collect();
    let referenced: BTreeSet<UnitId> = archive
        .units
        .iter()
        .flat_map(|u| u.body.references())
        .chain(archive.attackers.iter().flat_map(|(attackee, attackers)| {
            std::iter::once(*attackee).chain(attackers.iter().copied())
        }))
        .chain(
            archive
                .formations
                .iter()
                .flat_map(|f| f.leader().into_iter().chain(f.members().iter().map(|m| m.unit))),
        )
        .collect();

    for dead in referenced.difference(&live) {
        let Some(entity) = entity_of(*dead) else {
            continue;
        };
        battle.world.spawn_at(entity, ());
        let _ = battle.world.despawn(entity);
    }
}
