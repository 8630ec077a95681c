//! Mission directives and the per-unit mission stack.
//!
//! A unit's missions form a stack: the current mission sits on top, suspended
//! higher-level goals below it. The stack always holds a current entry. When
//! nothing is left the sentinel `None` mission takes its place, and the next
//! evaluation swaps it for the unit's default roaming mission.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::enums::FighterKind;
use crate::types::UnitId;

/// Shared surface of ship and fighter missions.
pub trait Mission: Clone + Default {
    /// Whether this is the `None` sentinel.
    fn is_none(&self) -> bool;
    /// Diagnostic name, e.g. `ATTACK_THIS`.
    fn name(&self) -> &'static str;
    /// Weak target reference, if the mission has one.
    fn target(&self) -> Option<UnitId>;
    /// Destination point, if the mission has one.
    fn destination(&self) -> Option<Vec3>;
}

/// Ship mission directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(tag = "type")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipMission {
    #[default]
    None,
    MoveTo { destination: Vec3 },
    AttackThis { target: UnitId },
    AttackThisStandoff { target: UnitId },
    DefendThis { target: UnitId },
    PatrolTo { destination: Vec3 },
    AttackShipsWeakestFirst,
    AttackShipsWeakestFirstStandoff,
    AttackShipsNearestFirst,
    AttackShipsNearestFirstStandoff,
    EnterStarlane { destination: Vec3 },
}

impl ShipMission {
    /// Mission a ship falls back to when its stack runs dry.
    pub fn roaming() -> Self {
        ShipMission::AttackShipsNearestFirst
    }
}

impl Mission for ShipMission {
    fn is_none(&self) -> bool {
        matches!(self, ShipMission::None)
    }

    fn name(&self) -> &'static str {
        self.into()
    }

    fn target(&self) -> Option<UnitId> {
        match *self {
            ShipMission::AttackThis { target }
            | ShipMission::AttackThisStandoff { target }
            | ShipMission::DefendThis { target } => Some(target),
            _ => None,
        }
    }

    fn destination(&self) -> Option<Vec3> {
        match *self {
            ShipMission::MoveTo { destination }
            | ShipMission::PatrolTo { destination }
            | ShipMission::EnterStarlane { destination } => Some(destination),
            _ => None,
        }
    }
}

/// Fighter formation mission directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(tag = "type")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FighterMission {
    #[default]
    None,
    MoveTo { destination: Vec3 },
    AttackThis { target: UnitId },
    DefendThis { target: UnitId },
    PatrolTo { destination: Vec3 },
    AttackFightersBombersFirst,
    AttackFightersInterceptorsFirst,
    AttackShipsWeakestFirst,
    AttackShipsNearestFirst,
    ReturnToBase,
}

impl FighterMission {
    /// Mission a formation falls back to when its stack runs dry.
    pub fn roaming(kind: FighterKind) -> Self {
        match kind {
            FighterKind::Interceptor => FighterMission::AttackFightersBombersFirst,
            FighterKind::Bomber => FighterMission::AttackShipsWeakestFirst,
        }
    }
}

impl Mission for FighterMission {
    fn is_none(&self) -> bool {
        matches!(self, FighterMission::None)
    }

    fn name(&self) -> &'static str {
        self.into()
    }

    fn target(&self) -> Option<UnitId> {
        match *self {
            FighterMission::AttackThis { target } | FighterMission::DefendThis { target } => {
                Some(target)
            }
            _ => None,
        }
    }

    fn destination(&self) -> Option<Vec3> {
        match *self {
            FighterMission::MoveTo { destination } | FighterMission::PatrolTo { destination } => {
                Some(destination)
            }
            _ => None,
        }
    }
}

/// Mission stack of one unit. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionQueue<M> {
    current: M,
    /// Suspended missions, bottom first.
    suspended: Vec<M>,
}

impl<M: Mission> Default for MissionQueue<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Mission> MissionQueue<M> {
    /// A queue holding only the `None` sentinel.
    pub fn new() -> Self {
        Self {
            current: M::default(),
            suspended: Vec::new(),
        }
    }

    /// A queue whose current mission is `mission`.
    pub fn with(mission: M) -> Self {
        Self {
            current: mission,
            suspended: Vec::new(),
        }
    }

    pub fn current(&self) -> &M {
        &self.current
    }

    /// Number of entries including the current one.
    pub fn len(&self) -> usize {
        self.suspended.len() + 1
    }

    /// Always false; present for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Entries from bottom to current.
    pub fn iter(&self) -> impl Iterator<Item = &M> {
        self.suspended.iter().chain(std::iter::once(&self.current))
    }

    /// Suspend the current mission beneath `mission`.
    pub fn push(&mut self, mission: M) {
        let previous = std::mem::replace(&mut self.current, mission);
        self.suspended.push(previous);
    }

    /// Queue `mission` at the bottom, to run after everything above it.
    pub fn append(&mut self, mission: M) {
        self.suspended.insert(0, mission);
    }

    /// Drop every entry and make `mission` current.
    pub fn replace(&mut self, mission: M) {
        self.suspended.clear();
        self.current = mission;
    }

    /// Remove the current mission, resuming the one beneath it. Leaves the
    /// `None` sentinel when nothing remains.
    pub fn pop(&mut self) -> M {
        let next = self.suspended.pop().unwrap_or_default();
        std::mem::replace(&mut self.current, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_queue_holds_sentinel() {
        let queue: MissionQueue<ShipMission> = MissionQueue::new();
        assert_eq!(queue.len(), 1);
        assert!(queue.current().is_none());
    }

    #[test]
    fn test_pop_last_leaves_sentinel() {
        let mut queue = MissionQueue::with(ShipMission::roaming());
        let popped = queue.pop();
        assert_eq!(popped, ShipMission::AttackShipsNearestFirst);
        assert_eq!(queue.len(), 1);
        assert!(queue.current().is_none());
    }

    #[test]
    fn test_push_suspends_and_pop_resumes() {
        let target = UnitId::from_bits(7);
        let mut queue = MissionQueue::with(ShipMission::AttackShipsWeakestFirst);
        queue.push(ShipMission::AttackThis { target });
        assert_eq!(queue.current().target(), Some(target));
        queue.pop();
        assert_eq!(*queue.current(), ShipMission::AttackShipsWeakestFirst);
    }

    #[test]
    fn test_append_goes_to_bottom() {
        let destination = Vec3::new(1.0, 2.0, 3.0);
        let mut queue = MissionQueue::with(FighterMission::MoveTo { destination });
        queue.append(FighterMission::ReturnToBase);
        assert_eq!(queue.current().destination(), Some(destination));
        queue.pop();
        assert_eq!(*queue.current(), FighterMission::ReturnToBase);
    }

    #[test]
    fn test_replace_clears_stack() {
        let mut queue = MissionQueue::with(ShipMission::AttackShipsNearestFirst);
        queue.push(ShipMission::AttackThis {
            target: UnitId::from_bits(1),
        });
        queue.replace(ShipMission::MoveTo {
            destination: Vec3::ZERO,
        });
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.current().name(), "MOVE_TO");
    }

    #[test]
    fn test_mission_names() {
        assert_eq!(ShipMission::None.name(), "NONE");
        assert_eq!(
            ShipMission::AttackShipsWeakestFirstStandoff.name(),
            "ATTACK_SHIPS_WEAKEST_FIRST_STANDOFF"
        );
        assert_eq!(FighterMission::ReturnToBase.name(), "RETURN_TO_BASE");
    }

    #[test]
    fn test_fighter_roaming_by_kind() {
        assert_eq!(
            FighterMission::roaming(FighterKind::Interceptor),
            FighterMission::AttackFightersBombersFirst
        );
        assert_eq!(
            FighterMission::roaming(FighterKind::Bomber),
            FighterMission::AttackShipsWeakestFirst
        );
    }
}
