//! Shared battle state and the lookups every system needs.
//!
//! `Battle` bundles what the engine owns exclusively: the registry (a hecs
//! world), the proximity index, the attacker index, formations, obstacles,
//! the listener and the target ranking. Systems borrow it mutably for the
//! duration of a tick.

use std::collections::BTreeMap;

use glam::Vec3;
use hecs::{Entity, World};

use combat_core::components::*;
use combat_core::enums::UnitKind;
use combat_core::events::{CombatListener, NullListener};
use combat_core::flags::UnitFlags;
use combat_core::types::{EmpireId, FormationId, UnitId};
use combat_obstacles::Obstacle;

use crate::attackers::AttackerIndex;
use crate::formation::Formation;
use crate::ranking::{self, FuzzyWeakness, RankingView, TargetRanking};
use crate::spatial::{ProximityIndex, ProximityToken};

/// Weak handle for a registry entity.
pub fn unit_id(entity: Entity) -> UnitId {
    UnitId::from_bits(entity.to_bits().get())
}

/// Registry handle for a weak id, if the bits form a valid handle.
pub fn entity_of(unit: UnitId) -> Option<Entity> {
    Entity::from_bits(unit.to_bits())
}

/// Why a unit leaves the battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// Structure reached zero. The listener hears about it here.
    Destroyed,
    /// Left on its own terms (docked, exploded, starlane); the caller has
    /// already notified the listener.
    Withdrawn,
}

pub struct Battle {
    pub world: World,
    pub index: ProximityIndex,
    pub attackers: AttackerIndex,
    pub formations: BTreeMap<FormationId, Formation>,
    pub next_formation: u32,
    pub obstacles: Vec<Obstacle>,
    pub listener: Box<dyn CombatListener>,
    pub ranking: Box<dyn TargetRanking>,
}

impl Battle {
    pub fn new(index: ProximityIndex) -> Self {
        Self {
            world: World::new(),
            index,
            attackers: AttackerIndex::new(),
            formations: BTreeMap::new(),
            next_formation: 0,
            obstacles: Vec::new(),
            listener: Box::new(NullListener),
            ranking: Box::new(FuzzyWeakness),
        }
    }

    /// Live entity behind a weak id.
    pub fn entity(&self, unit: UnitId) -> Option<Entity> {
        entity_of(unit).filter(|e| self.world.contains(*e))
    }

    pub fn kind(&self, unit: UnitId) -> Option<UnitKind> {
        let entity = self.entity(unit)?;
        self.world.get::<&UnitKind>(entity).ok().map(|k| *k)
    }

    pub fn owner(&self, unit: UnitId) -> Option<EmpireId> {
        let entity = self.entity(unit)?;
        self.world.get::<&Owner>(entity).ok().map(|o| o.0)
    }

    pub fn kinematics(&self, unit: UnitId) -> Option<Kinematics> {
        let entity = self.entity(unit)?;
        self.world.get::<&Kinematics>(entity).ok().map(|k| *k)
    }

    pub fn position(&self, unit: UnitId) -> Option<Vec3> {
        self.kinematics(unit).map(|k| k.position)
    }

    /// Whether `unit` is a live, not yet destroyed combatant.
    pub fn is_targetable(&self, unit: UnitId) -> bool {
        let Some(entity) = self.entity(unit) else {
            return false;
        };
        let Ok(entity_ref) = self.world.entity(entity) else {
            return false;
        };
        entity_ref.has::<UnitKind>()
            && entity_ref
                .get::<&Structure>()
                .map_or(false, |s| !s.is_destroyed())
    }

    /// Damage per tick `unit` can deal.
    pub fn danger(&self, unit: UnitId) -> f32 {
        let Some(entity) = self.entity(unit) else {
            return 0.0;
        };
        let Ok(entity_ref) = self.world.entity(entity) else {
            return 0.0;
        };
        if let Some(ship) = entity_ref.get::<&ShipState>() {
            return ship.loadout.danger();
        }
        if let Some(fighter) = entity_ref.get::<&FighterState>() {
            return fighter.weapon.damage / fighter.weapon.cooldown_ticks.max(1) as f32;
        }
        if let Some(missile) = entity_ref.get::<&MissileState>() {
            return missile.damage;
        }
        0.0
    }

    /// Point-defense strength of a ship; zero for anything else.
    pub fn pd_strength(&self, unit: UnitId) -> f32 {
        self.entity(unit)
            .and_then(|e| self.world.get::<&ShipState>(e).ok().map(|s| s.loadout.pd_strength()))
            .unwrap_or(0.0)
    }

    pub fn ranking_view(&self, unit: UnitId, from: Vec3) -> Option<RankingView> {
        let entity = self.entity(unit)?;
        let kind = *self.world.get::<&UnitKind>(entity).ok()?;
        let structure = *self.world.get::<&Structure>(entity).ok()?;
        let position = self.world.get::<&Kinematics>(entity).ok()?.position;
        Some(RankingView {
            unit,
            kind,
            structure: structure.current,
            max_structure: structure.max,
            danger: self.danger(unit),
            distance: position.distance(from),
        })
    }

    /// Weakest live candidate as judged by the battle's ranking.
    pub fn weakest(&self, candidates: impl IntoIterator<Item = UnitId>, from: Vec3) -> Option<UnitId> {
        let views: Vec<RankingView> = candidates
            .into_iter()
            .filter(|u| self.is_targetable(*u))
            .filter_map(|u| self.ranking_view(u, from))
            .collect();
        ranking::weakest(self.ranking.as_ref(), &views)
    }

    pub fn apply_damage(&mut self, unit: UnitId, amount: f32) {
        if let Some(entity) = self.entity(unit) {
            if let Ok(mut structure) = self.world.get::<&mut Structure>(entity) {
                structure.apply_damage(amount);
            }
        }
    }

    /// Register a combatant in the proximity index and attach its token.
    pub fn index_unit(&mut self, entity: Entity, kind: UnitKind, owner: EmpireId, position: Vec3) {
        let token = self
            .index
            .insert(unit_id(entity), UnitFlags::membership(kind, owner), position);
        if let Err(err) = self.world.insert_one(entity, token) {
            tracing::warn!(%err, "cannot attach proximity token");
        }
    }

    pub fn allocate_formation(&mut self) -> FormationId {
        let id = FormationId(self.next_formation);
        self.next_formation += 1;
        id
    }

    /// Take a unit out of the battle: listener, proximity index, attacker
    /// index, formation membership, then the registry.
    pub fn remove_unit(&mut self, entity: Entity, departure: Departure) {
        let unit = unit_id(entity);
        let kind = self.world.get::<&UnitKind>(entity).ok().map(|k| *k);

        if departure == Departure::Destroyed {
            match kind {
                Some(UnitKind::Ship) => self.listener.unit_destroyed(unit),
                Some(UnitKind::Interceptor | UnitKind::Bomber) => self.listener.fighter_destroyed(unit),
                Some(UnitKind::Missile) => self.listener.missile_removed(unit),
                None => {}
            }
            tracing::info!(unit = %unit, kind = ?kind, "unit destroyed");
        }

        if let Ok(token) = self.world.remove_one::<ProximityToken>(entity) {
            self.index.release(token);
        }
        self.attackers.remove_unit(unit);

        let formation = self.world.get::<&FighterState>(entity).ok().map(|f| f.formation);
        if let Some(formation) = formation {
            self.leave_formation(formation, unit);
        }

        let _ = self.world.despawn(entity);
    }

    /// Drop `unit` from its formation; an emptied formation goes away with its leader.
    fn leave_formation(&mut self, id: FormationId, unit: UnitId) {
        let Some(formation) = self.formations.get_mut(&id) else {
            return;
        };
        formation.remove_member(unit);
        if !formation.is_empty() {
            return;
        }
        let leader = formation.leader();
        self.formations.remove(&id);
        if let Some(leader) = leader.and_then(|l| self.entity(l)) {
            self.attackers.remove_unit(unit_id(leader));
            let _ = self.world.despawn(leader);
        }
        tracing::debug!(formation = %id, "formation disbanded");
    }

    /// Live combatants (ships, fighters, missiles), leaders excluded.
    pub fn unit_count(&self) -> usize {
        self.world.query::<&UnitKind>().iter().count()
    }
}
