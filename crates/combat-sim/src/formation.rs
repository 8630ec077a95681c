//! Fighter formations.
//!
//! A formation has one leader, an invisible steering anchor that resolves
//! missions for the group, and real fighters in numbered slots. Members hold
//! their slot's offset in the leader's local frame.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use combat_core::constants::{FORMATION_SLOT_PATTERN, FORMATION_SPACING};
use combat_core::error::{CombatError, Result};
use combat_core::types::{FormationId, UnitId};

/// Slot offsets in (forward, side, up) leader coordinates, before spacing.
const SLOT_OFFSETS: [Vec3; FORMATION_SLOT_PATTERN as usize] = [
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(-1.0, 1.0, 0.0),
    Vec3::new(-1.0, -1.0, 0.0),
    Vec3::new(-2.0, 2.0, 0.0),
    Vec3::new(-2.0, -2.0, 0.0),
];

/// Offset of `slot` from the leader in leader-local coordinates.
/// Slots past the pattern repeat it in rings further behind the leader.
pub fn slot_offset(slot: u32) -> Vec3 {
    let base = SLOT_OFFSETS[(slot % FORMATION_SLOT_PATTERN) as usize];
    let ring = (slot / FORMATION_SLOT_PATTERN) as f32;
    (base - Vec3::new(3.0 * ring, 0.0, 0.0)) * FORMATION_SPACING
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationMember {
    pub slot: u32,
    pub unit: UnitId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    id: FormationId,
    leader: Option<UnitId>,
    /// Sorted by slot.
    members: Vec<FormationMember>,
}

impl Formation {
    pub fn new(id: FormationId) -> Self {
        Self {
            id,
            leader: None,
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> FormationId {
        self.id
    }

    /// Designate the leader. A formation gets exactly one.
    pub fn set_leader(&mut self, leader: UnitId) -> Result<()> {
        if self.leader.is_some() {
            return Err(CombatError::FormationLeaderAlreadySet(self.id));
        }
        self.leader = Some(leader);
        Ok(())
    }

    pub fn leader(&self) -> Option<UnitId> {
        self.leader
    }

    pub fn add_member(&mut self, slot: u32, unit: UnitId) {
        debug_assert!(
            self.members.iter().all(|m| m.slot != slot && m.unit != unit),
            "slot {slot} or unit {unit} already in formation {}",
            self.id
        );
        let at = self.members.partition_point(|m| m.slot < slot);
        self.members.insert(at, FormationMember { slot, unit });
    }

    /// Remove a member; returns whether it belonged to the formation.
    pub fn remove_member(&mut self, unit: UnitId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.unit != unit);
        self.members.len() != before
    }

    pub fn members(&self) -> &[FormationMember] {
        &self.members
    }

    pub fn contains(&self, unit: UnitId) -> bool {
        self.members.iter().any(|m| m.unit == unit)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_leader_rejected() {
        let mut formation = Formation::new(FormationId(3));
        formation.set_leader(UnitId::from_bits(1)).unwrap();
        let err = formation.set_leader(UnitId::from_bits(2)).unwrap_err();
        assert!(matches!(err, CombatError::FormationLeaderAlreadySet(FormationId(3))));
        assert_eq!(formation.leader(), Some(UnitId::from_bits(1)));
    }

    #[test]
    fn test_members_sorted_by_slot() {
        let mut formation = Formation::new(FormationId(0));
        formation.add_member(2, UnitId::from_bits(12));
        formation.add_member(0, UnitId::from_bits(10));
        formation.add_member(1, UnitId::from_bits(11));
        let slots: Vec<u32> = formation.members().iter().map(|m| m.slot).collect();
        assert_eq!(slots, vec![0, 1, 2]);
        assert!(formation.remove_member(UnitId::from_bits(11)));
        assert!(!formation.remove_member(UnitId::from_bits(11)));
        assert_eq!(formation.len(), 2);
    }

    #[test]
    fn test_slot_offsets_distinct() {
        let offsets: Vec<Vec3> = (0..15).map(slot_offset).collect();
        for (i, a) in offsets.iter().enumerate() {
            for b in &offsets[i + 1..] {
                assert!(a.distance(*b) > 0.5, "slots overlap at {a:?}");
            }
        }
    }
}
