//! Who is attacking whom. Answers "who attacks X" for defend missions.

use std::collections::{BTreeMap, BTreeSet};

use combat_core::types::UnitId;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttackerIndex {
    by_attackee: BTreeMap<UnitId, BTreeSet<UnitId>>,
}

impl AttackerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_attack(&mut self, attacker: UnitId, attackee: UnitId) {
        self.by_attackee.entry(attackee).or_default().insert(attacker);
    }

    pub fn end_attack(&mut self, attacker: UnitId, attackee: UnitId) {
        if let Some(attackers) = self.by_attackee.get_mut(&attackee) {
            attackers.remove(&attacker);
            if attackers.is_empty() {
                self.by_attackee.remove(&attackee);
            }
        }
    }

    /// Move `attacker` from `previous` to `next`.
    pub fn retarget(&mut self, attacker: UnitId, previous: Option<UnitId>, next: Option<UnitId>) {
        if previous == next {
            return;
        }
        if let Some(previous) = previous {
            self.end_attack(attacker, previous);
        }
        if let Some(next) = next {
            self.begin_attack(attacker, next);
        }
    }

    pub fn attackers_of(&self, attackee: UnitId) -> impl Iterator<Item = UnitId> + '_ {
        self.by_attackee
            .get(&attackee)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Forget a unit leaving the battle, as attacker and as attackee.
    pub fn remove_unit(&mut self, unit: UnitId) {
        self.by_attackee.remove(&unit);
        self.by_attackee.retain(|_, attackers| {
            attackers.remove(&unit);
            !attackers.is_empty()
        });
    }

    pub fn is_empty(&self) -> bool {
        self.by_attackee.is_empty()
    }

    /// Flat (attackee, attackers) listing for archiving.
    pub fn to_pairs(&self) -> Vec<(UnitId, Vec<UnitId>)> {
        self.by_attackee
            .iter()
            .map(|(attackee, attackers)| (*attackee, attackers.iter().copied().collect()))
            .collect()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (UnitId, Vec<UnitId>)>) -> Self {
        let mut index = Self::new();
        for (attackee, attackers) in pairs {
            for attacker in attackers {
                index.begin_attack(attacker, attackee);
            }
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> UnitId {
        UnitId::from_bits(n)
    }

    #[test]
    fn test_begin_and_end_attack() {
        let mut index = AttackerIndex::new();
        index.begin_attack(id(1), id(10));
        index.begin_attack(id(2), id(10));
        assert_eq!(index.attackers_of(id(10)).collect::<Vec<_>>(), vec![id(1), id(2)]);
        index.end_attack(id(1), id(10));
        assert_eq!(index.attackers_of(id(10)).collect::<Vec<_>>(), vec![id(2)]);
        index.end_attack(id(2), id(10));
        assert!(index.is_empty());
    }

    #[test]
    fn test_remove_unit_clears_both_roles() {
        let mut index = AttackerIndex::new();
        index.begin_attack(id(1), id(10));
        index.begin_attack(id(10), id(20));
        index.begin_attack(id(3), id(20));
        index.remove_unit(id(10));
        assert_eq!(index.attackers_of(id(10)).count(), 0);
        assert_eq!(index.attackers_of(id(20)).collect::<Vec<_>>(), vec![id(3)]);
    }

    #[test]
    fn test_retarget_moves_attacker() {
        let mut index = AttackerIndex::new();
        index.retarget(id(1), None, Some(id(10)));
        index.retarget(id(1), Some(id(10)), Some(id(11)));
        assert_eq!(index.attackers_of(id(10)).count(), 0);
        assert_eq!(index.attackers_of(id(11)).collect::<Vec<_>>(), vec![id(1)]);
    }

    #[test]
    fn test_pairs_roundtrip() {
        let mut index = AttackerIndex::new();
        index.begin_attack(id(1), id(10));
        index.begin_attack(id(2), id(11));
        let restored = AttackerIndex::from_pairs(index.to_pairs());
        assert_eq!(restored, index);
    }
}
