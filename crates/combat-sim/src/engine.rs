//! Simulation engine: owns the battle and drives the per-tick update.
//!
//! `SimulationEngine` owns the hecs world and every index built over it,
//! applies controller orders, and runs the systems in a fixed order each
//! tick. Completely headless and deterministic for a given seed.

use glam::Vec3;
use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use combat_core::commands::{CombatOrder, OrderMission};
use combat_core::components::*;
use combat_core::constants::*;
use combat_core::enums::{FighterKind, UnitKind, WeaponKind};
use combat_core::error::{CombatError, Result};
use combat_core::events::CombatListener;
use combat_core::missions::{FighterMission, Mission, MissionQueue, ShipMission};
use combat_core::types::{FormationId, SimTime, UnitId};
use combat_obstacles::Obstacle;

use crate::battle::{unit_id, Battle};
use crate::formation::Formation;
use crate::persistence::{self, BattleArchive};
use crate::ranking::TargetRanking;
use crate::spatial::ProximityIndex;
use crate::systems;
use crate::world_setup::{self, ShipSpec, SkirmishSetup};

/// Runtime configuration of a battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// RNG seed for scenario setup. Same seed = same battle.
    pub seed: u64,
    pub index_center: Vec3,
    /// Side of the cube covered by the proximity index.
    pub index_diameter: f32,
    pub index_cells: u32,
    /// Units re-evaluate missions every `mission_stagger` ticks.
    pub mission_stagger: u64,
    #[serde(default)]
    pub starlane_entry_points: Vec<Vec3>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            index_center: Vec3::ZERO,
            index_diameter: DEFAULT_INDEX_DIAMETER,
            index_cells: DEFAULT_INDEX_CELLS,
            mission_stagger: MISSION_STAGGER,
            starlane_entry_points: Vec::new(),
        }
    }
}

/// The simulation engine. Owns the registry and all battle state.
pub struct SimulationEngine {
    battle: Battle,
    time: SimTime,
    config: SimConfig,
    rng: ChaCha8Rng,
    despawn_buffer: Vec<Entity>,
}

impl SimulationEngine {
    pub fn new(config: SimConfig) -> Self {
        let index = ProximityIndex::new(config.index_center, config.index_diameter, config.index_cells);
        Self::from_parts(Battle::new(index), SimTime::default(), config)
    }

    fn from_parts(battle: Battle, time: SimTime, config: SimConfig) -> Self {
        Self {
            battle,
            time,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            despawn_buffer: Vec::new(),
        }
    }

    pub fn set_listener(&mut self, listener: Box<dyn CombatListener>) {
        self.battle.listener = listener;
    }

    pub fn set_target_ranking(&mut self, ranking: Box<dyn TargetRanking>) {
        self.battle.ranking = ranking;
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.battle.obstacles.push(obstacle);
    }

    pub fn spawn_ship(&mut self, spec: ShipSpec) -> UnitId {
        world_setup::spawn_ship(&mut self.battle, spec)
    }

    /// Launch a formation of `count` fighters from `carrier`.
    pub fn launch_fighters(
        &mut self,
        carrier: UnitId,
        kind: FighterKind,
        count: u32,
    ) -> Result<(FormationId, Vec<UnitId>)> {
        world_setup::launch_formation(&mut self.battle, carrier, kind, count)
    }

    /// Fire the launcher part named `part` of `launcher` at `target`,
    /// regardless of range or cooldown.
    pub fn fire_missile(&mut self, launcher: UnitId, target: UnitId, part: &str) -> Result<UnitId> {
        let entity = self
            .battle
            .entity(launcher)
            .ok_or(CombatError::UnitNotFound(launcher))?;
        if !self.battle.is_targetable(target) {
            return Err(CombatError::UnitNotFound(target));
        }
        let unknown = || CombatError::UnknownLauncher {
            unit: launcher,
            part: part.to_owned(),
        };
        let (kinematics, owner, damage) = {
            let entity_ref = self.battle.world.entity(entity).map_err(|_| unknown())?;
            let ship = entity_ref.get::<&ShipState>().ok_or_else(unknown)?;
            let weapon = ship
                .loadout
                .weapons
                .iter()
                .find(|w| w.kind == WeaponKind::MissileLauncher && w.name == part)
                .ok_or_else(unknown)?;
            let kinematics = *entity_ref.get::<&Kinematics>().ok_or_else(unknown)?;
            let owner = entity_ref.get::<&Owner>().ok_or_else(unknown)?.0;
            (kinematics, owner, weapon.damage)
        };

        self.battle.listener.unit_fired(launcher, target, part);
        Ok(world_setup::spawn_missile(
            &mut self.battle,
            launcher,
            owner,
            &kinematics,
            target,
            damage,
            part,
        ))
    }

    /// Apply a controller order. Fighter orders address the formation of
    /// the given fighter (or its leader directly).
    pub fn issue_order(&mut self, order: CombatOrder) -> Result<()> {
        let result = self.apply_order(order);
        if let Err(err) = &result {
            tracing::warn!(unit = %order.unit, %err, "order rejected");
        }
        result
    }

    fn apply_order(&mut self, order: CombatOrder) -> Result<()> {
        let entity = self
            .battle
            .entity(order.unit)
            .ok_or(CombatError::UnitNotFound(order.unit))?;
        match order.mission {
            OrderMission::Ship(mission) => {
                let mut ship = self
                    .battle
                    .world
                    .get::<&mut ShipState>(entity)
                    .map_err(|_| CombatError::MissionKindMismatch {
                        unit: order.unit,
                        expected: "ship",
                    })?;
                enqueue(&mut ship.missions, mission, order.append);
            }
            OrderMission::Fighter(mission) => {
                let leader = self.leader_entity(entity).ok_or(CombatError::MissionKindMismatch {
                    unit: order.unit,
                    expected: "fighter",
                })?;
                let mut leader = self
                    .battle
                    .world
                    .get::<&mut FormationLeader>(leader)
                    .map_err(|_| CombatError::MissionKindMismatch {
                        unit: order.unit,
                        expected: "fighter",
                    })?;
                enqueue(&mut leader.missions, mission, order.append);
            }
        }
        tracing::debug!(unit = %order.unit, append = order.append, "order applied");
        Ok(())
    }

    /// Leader entity for a fighter or a leader.
    fn leader_entity(&self, entity: Entity) -> Option<Entity> {
        if self.battle.world.get::<&FormationLeader>(entity).is_ok() {
            return Some(entity);
        }
        let formation = self.battle.world.get::<&FighterState>(entity).ok()?.formation;
        let leader = self.battle.formations.get(&formation)?.leader()?;
        self.battle.entity(leader)
    }

    /// Advance the battle by one tick.
    pub fn tick(&mut self) {
        self.time.advance();

        // 1. Ships: missions, steering, starlane exit, weapons
        systems::ships::run(&mut self.battle, &self.time, &self.config);
        // 2. Fighter formations: leaders, then members
        systems::fighters::run(&mut self.battle, &self.time, &self.config);
        // 3. Missiles
        systems::missiles::run(&mut self.battle, &self.time, &self.config);
        // 4. Cleanup (destroyed units)
        systems::cleanup::run(&mut self.battle, &mut self.despawn_buffer);

        tracing::trace!(
            tick = self.time.tick,
            units = self.battle.unit_count(),
            formations = self.battle.formations.len(),
            "tick complete"
        );
    }

    /// Run `ticks` ticks.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Place two opposing fleets using the engine's seeded RNG.
    pub fn setup_skirmish(&mut self, setup: &SkirmishSetup) -> Result<Vec<UnitId>> {
        world_setup::setup_skirmish(&mut self.battle, &mut self.rng, setup)
    }

    pub fn save(&self) -> BattleArchive {
        persistence::capture(&self.battle, &self.time, &self.config)
    }

    /// Rebuild an engine from an archive. The listener and target ranking
    /// are not archived; the restored engine starts with the defaults.
    pub fn restore(archive: BattleArchive) -> Result<Self> {
        let (battle, time, config) = persistence::rebuild(archive)?;
        Ok(Self::from_parts(battle, time, config))
    }

    pub fn tick_count(&self) -> u64 {
        self.time.tick
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Live combatants: ships, fighters and missiles.
    pub fn unit_count(&self) -> usize {
        self.battle.unit_count()
    }

    /// Ids of live combatants, sorted.
    pub fn units(&self) -> Vec<UnitId> {
        let mut units: Vec<UnitId> = self
            .battle
            .world
            .query::<&UnitKind>()
            .iter()
            .map(|(entity, _)| unit_id(entity))
            .collect();
        units.sort();
        units
    }

    pub fn units_of_kind(&self, kind: UnitKind) -> Vec<UnitId> {
        self.units()
            .into_iter()
            .filter(|u| self.battle.kind(*u) == Some(kind))
            .collect()
    }

    pub fn contains(&self, unit: UnitId) -> bool {
        self.battle.entity(unit).is_some()
    }

    pub fn kind(&self, unit: UnitId) -> Option<UnitKind> {
        self.battle.kind(unit)
    }

    pub fn kinematics(&self, unit: UnitId) -> Option<Kinematics> {
        self.battle.kinematics(unit)
    }

    pub fn structure(&self, unit: UnitId) -> Option<Structure> {
        let entity = self.battle.entity(unit)?;
        self.battle.world.get::<&Structure>(entity).ok().map(|s| *s)
    }

    pub fn ship_state(&self, unit: UnitId) -> Option<ShipState> {
        let entity = self.battle.entity(unit)?;
        self.battle.world.get::<&ShipState>(entity).ok().map(|s| ShipState::clone(&s))
    }

    pub fn ship_missions(&self, unit: UnitId) -> Option<Vec<ShipMission>> {
        self.ship_state(unit).map(|s| s.missions.iter().copied().collect())
    }

    pub fn fighter_state(&self, unit: UnitId) -> Option<FighterState> {
        let entity = self.battle.entity(unit)?;
        self.battle.world.get::<&FighterState>(entity).ok().map(|f| *f)
    }

    pub fn missile_state(&self, unit: UnitId) -> Option<MissileState> {
        let entity = self.battle.entity(unit)?;
        self.battle.world.get::<&MissileState>(entity).ok().map(|m| MissileState::clone(&m))
    }

    pub fn formation(&self, id: FormationId) -> Option<&Formation> {
        self.battle.formations.get(&id)
    }

    pub fn formations(&self) -> impl Iterator<Item = &Formation> {
        self.battle.formations.values()
    }

    /// Steering anchor state of a formation.
    pub fn leader_state(&self, id: FormationId) -> Option<FormationLeader> {
        let leader = self.battle.formations.get(&id)?.leader()?;
        let entity = self.battle.entity(leader)?;
        self.battle
            .world
            .get::<&FormationLeader>(entity)
            .ok()
            .map(|l| FormationLeader::clone(&l))
    }

    pub fn formation_missions(&self, id: FormationId) -> Option<Vec<FighterMission>> {
        self.leader_state(id).map(|l| l.missions.iter().copied().collect())
    }

    pub fn attackers_of(&self, unit: UnitId) -> Vec<UnitId> {
        self.battle.attackers.attackers_of(unit).collect()
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.battle.obstacles
    }

    pub fn index(&self) -> &ProximityIndex {
        &self.battle.index
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.battle.world
    }

    pub fn battle(&self) -> &Battle {
        &self.battle
    }

    /// Direct battle access for scenario scripting between ticks.
    pub fn battle_mut(&mut self) -> &mut Battle {
        &mut self.battle
    }
}

fn enqueue<M: Mission>(missions: &mut MissionQueue<M>, mission: M, append: bool) {
    if append {
        missions.append(mission);
    } else {
        missions.replace(mission);
    }
}
