//! Target weakness ranking for weakest-first scans and defend missions.

use combat_core::constants::{
    WEAKNESS_DANGER_WEIGHT, WEAKNESS_FRACTION_WEIGHT, WEAKNESS_STRUCTURE_WEIGHT,
};
use combat_core::enums::UnitKind;
use combat_core::types::UnitId;

/// What a ranking may consider about a candidate target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingView {
    pub unit: UnitId,
    pub kind: UnitKind,
    pub structure: f32,
    pub max_structure: f32,
    /// Sustained damage per tick the candidate can deal.
    pub danger: f32,
    pub distance: f32,
}

/// Scores candidates; the lowest score is the weakest.
pub trait TargetRanking {
    fn weakness(&self, candidate: &RankingView) -> f32;
}

/// Blend of remaining structure and threat: damaged, fragile, dangerous
/// targets rank weakest.
#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzyWeakness;

impl TargetRanking for FuzzyWeakness {
    fn weakness(&self, candidate: &RankingView) -> f32 {
        let fraction = if candidate.max_structure > 0.0 {
            (candidate.structure / candidate.max_structure).clamp(0.0, 1.0)
        } else {
            0.0
        };
        WEAKNESS_FRACTION_WEIGHT * fraction
            + WEAKNESS_STRUCTURE_WEIGHT * candidate.structure.max(0.0) / 100.0
            - WEAKNESS_DANGER_WEIGHT * candidate.danger
    }
}

/// Weakest candidate; ties go to the nearer one.
pub fn weakest<'a>(
    ranking: &dyn TargetRanking,
    candidates: impl IntoIterator<Item = &'a RankingView>,
) -> Option<UnitId> {
    candidates
        .into_iter()
        .map(|c| (ranking.weakness(c), c.distance, c.unit))
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)))
        .map(|(_, _, unit)| unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(n: u64, structure: f32, danger: f32, distance: f32) -> RankingView {
        RankingView {
            unit: UnitId::from_bits(n),
            kind: UnitKind::Ship,
            structure,
            max_structure: 100.0,
            danger,
            distance,
        }
    }

    #[test]
    fn test_damaged_target_is_weaker() {
        let views = [view(1, 90.0, 1.0, 5.0), view(2, 20.0, 1.0, 50.0)];
        assert_eq!(weakest(&FuzzyWeakness, &views), Some(UnitId::from_bits(2)));
    }

    #[test]
    fn test_dangerous_target_ranks_weaker_at_equal_health() {
        let views = [view(1, 50.0, 0.0, 5.0), view(2, 50.0, 2.0, 50.0)];
        assert_eq!(weakest(&FuzzyWeakness, &views), Some(UnitId::from_bits(2)));
    }

    #[test]
    fn test_tie_breaks_on_distance() {
        let views = [view(1, 50.0, 1.0, 30.0), view(2, 50.0, 1.0, 10.0)];
        assert_eq!(weakest(&FuzzyWeakness, &views), Some(UnitId::from_bits(2)));
    }

    #[test]
    fn test_custom_ranking() {
        struct Farthest;
        impl TargetRanking for Farthest {
            fn weakness(&self, c: &RankingView) -> f32 {
                -c.distance
            }
        }
        let views = [view(1, 10.0, 0.0, 30.0), view(2, 90.0, 0.0, 60.0)];
        assert_eq!(weakest(&Farthest, &views), Some(UnitId::from_bits(2)));
        assert_eq!(weakest(&Farthest, &[]), None);
    }
}
