//! Proximity-index membership flags.
//!
//! Every indexed unit carries one kind bit and one owner bit. Queries pass an
//! include mask and an exclude mask; an entry matches when it shares at least
//! one bit with the include mask and none with the exclude mask.

use bitflags::bitflags;

use crate::enums::UnitKind;
use crate::types::EmpireId;

/// First bit used for owner membership.
pub const OWNER_SHIFT: u32 = 8;

/// Number of distinct empires representable in the owner bits.
pub const MAX_EMPIRES: u8 = (u64::BITS - OWNER_SHIFT) as u8;

bitflags! {
    /// Kind and owner membership of a proximity-index entry.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct UnitFlags: u64 {
        const INTERCEPTOR = 1 << 0;
        const BOMBER      = 1 << 1;
        const SHIP        = 1 << 2;
        const MISSILE     = 1 << 3;

        const FIGHTERS    = Self::INTERCEPTOR.bits() | Self::BOMBER.bits();
        const NON_FIGHTERS = Self::SHIP.bits() | Self::MISSILE.bits();
        const UNIT_KINDS  = Self::FIGHTERS.bits() | Self::NON_FIGHTERS.bits();

        // Owner bits are assigned per empire above OWNER_SHIFT.
        const _ = !0;
    }
}

impl UnitFlags {
    /// Kind bit for a unit kind.
    pub fn kind(kind: UnitKind) -> Self {
        match kind {
            UnitKind::Ship => Self::SHIP,
            UnitKind::Interceptor => Self::INTERCEPTOR,
            UnitKind::Bomber => Self::BOMBER,
            UnitKind::Missile => Self::MISSILE,
        }
    }

    /// Owner bit for an empire.
    pub fn owner(empire: EmpireId) -> Self {
        debug_assert!(empire.0 < MAX_EMPIRES, "empire id {} out of range", empire.0);
        Self::from_bits_retain(1u64 << (OWNER_SHIFT + u32::from(empire.0)))
    }

    /// Every owner bit.
    pub fn all_owners() -> Self {
        Self::from_bits_retain(!0u64 << OWNER_SHIFT)
    }

    /// Owner bits of every empire other than `empire`.
    pub fn hostile_to(empire: EmpireId) -> Self {
        Self::from_bits_retain(Self::all_owners().bits() & !Self::owner(empire).bits())
    }

    /// Full membership for a unit: its kind bit plus its owner bit.
    pub fn membership(kind: UnitKind, owner: EmpireId) -> Self {
        Self::kind(kind) | Self::owner(owner)
    }

    /// Query predicate: shares a bit with `include` and none with `exclude`.
    pub fn matches(self, include: Self, exclude: Self) -> bool {
        self.intersects(include) && !self.intersects(exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_matches_kind_and_owner() {
        let flags = UnitFlags::membership(UnitKind::Ship, EmpireId(2));
        assert!(flags.matches(UnitFlags::SHIP, UnitFlags::empty()));
        assert!(flags.matches(UnitFlags::owner(EmpireId(2)), UnitFlags::empty()));
        assert!(!flags.matches(UnitFlags::FIGHTERS, UnitFlags::empty()));
        assert!(!flags.matches(UnitFlags::SHIP, UnitFlags::owner(EmpireId(2))));
    }

    #[test]
    fn test_empty_include_never_matches() {
        let flags = UnitFlags::membership(UnitKind::Bomber, EmpireId(0));
        assert!(!flags.matches(UnitFlags::empty(), UnitFlags::empty()));
    }

    #[test]
    fn test_hostile_mask_excludes_own_owner() {
        let hostile = UnitFlags::hostile_to(EmpireId(1));
        assert!(!hostile.intersects(UnitFlags::owner(EmpireId(1))));
        assert!(hostile.contains(UnitFlags::owner(EmpireId(0))));
        assert!(hostile.contains(UnitFlags::owner(EmpireId(MAX_EMPIRES - 1))));
        assert!(!hostile.intersects(UnitFlags::UNIT_KINDS));
    }
}
