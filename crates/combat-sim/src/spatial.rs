//! Proximity index: a uniform grid over a bounded cube.
//!
//! Each indexed unit holds a [`ProximityToken`] for its entry. The token is
//! not `Clone`; releasing consumes it, so an entry is released exactly once.
//! Positions outside the cube are clamped into the boundary cells, which
//! keeps them findable at the cost of crowding those cells.

use glam::Vec3;

use combat_core::flags::UnitFlags;
use combat_core::types::UnitId;

/// Handle to one entry of the proximity index.
#[derive(Debug, PartialEq, Eq)]
pub struct ProximityToken {
    slot: usize,
}

#[derive(Debug, Clone)]
struct Entry {
    unit: UnitId,
    flags: UnitFlags,
    position: Vec3,
    cell: usize,
}

#[derive(Debug, Clone)]
pub struct ProximityIndex {
    min_corner: Vec3,
    cells_per_axis: u32,
    cell_size: f32,
    cells: Vec<Vec<usize>>,
    entries: Vec<Option<Entry>>,
    free: Vec<usize>,
}

impl ProximityIndex {
    /// Grid of `cells_per_axis`³ cells covering the cube of side `diameter`
    /// centered at `center`.
    pub fn new(center: Vec3, diameter: f32, cells_per_axis: u32) -> Self {
        let cells_per_axis = cells_per_axis.max(1);
        let diameter = diameter.max(f32::EPSILON);
        let cell_count = (cells_per_axis as usize).pow(3);
        Self {
            min_corner: center - Vec3::splat(diameter * 0.5),
            cells_per_axis,
            cell_size: diameter / cells_per_axis as f32,
            cells: vec![Vec::new(); cell_count],
            entries: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&mut self, unit: UnitId, flags: UnitFlags, position: Vec3) -> ProximityToken {
        let cell = self.cell_index(self.cell_coords(position));
        let entry = Entry {
            unit,
            flags,
            position,
            cell,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.entries[slot] = Some(entry);
                slot
            }
            None => {
                self.entries.push(Some(entry));
                self.entries.len() - 1
            }
        };
        self.cells[cell].push(slot);
        ProximityToken { slot }
    }

    /// Move an entry to `position`.
    pub fn update(&mut self, token: &ProximityToken, position: Vec3) {
        let new_cell = self.cell_index(self.cell_coords(position));
        let Some(entry) = self.entries.get_mut(token.slot).and_then(Option::as_mut) else {
            debug_assert!(false, "update of released proximity token");
            return;
        };
        entry.position = position;
        let old_cell = entry.cell;
        if old_cell != new_cell {
            entry.cell = new_cell;
            remove_from_cell(&mut self.cells[old_cell], token.slot);
            self.cells[new_cell].push(token.slot);
        }
    }

    /// Remove an entry. Consumes the token.
    pub fn release(&mut self, token: ProximityToken) {
        if let Some(entry) = self.entries.get_mut(token.slot).and_then(Option::take) {
            remove_from_cell(&mut self.cells[entry.cell], token.slot);
            self.free.push(token.slot);
        }
    }

    pub fn flags(&self, token: &ProximityToken) -> Option<UnitFlags> {
        self.entry(token.slot).map(|e| e.flags)
    }

    pub fn position(&self, token: &ProximityToken) -> Option<Vec3> {
        self.entry(token.slot).map(|e| e.position)
    }

    /// Nearest matching entry anywhere in the index.
    pub fn find_nearest(&self, point: Vec3, include: UnitFlags, exclude: UnitFlags) -> Option<UnitId> {
        self.find_nearest_where(point, include, exclude, |_| true)
    }

    /// Nearest matching entry that `accept` also admits. Rejected entries
    /// are skipped, so a nearer rejected unit never hides a farther one.
    pub fn find_nearest_where(
        &self,
        point: Vec3,
        include: UnitFlags,
        exclude: UnitFlags,
        accept: impl Fn(UnitId) -> bool,
    ) -> Option<UnitId> {
        if include.is_empty() {
            return None;
        }
        if !self.in_bounds(point) {
            let candidates = self.matching(include, exclude).filter(|e| accept(e.unit));
            return self.nearest_of(point, candidates);
        }

        let center = self.cell_coords(point);
        let mut best: Option<(f32, UnitId)> = None;
        for ring in 0..self.cells_per_axis as i64 {
            for cell in self.ring_cells(center, ring) {
                for entry in self.cell_entries(cell) {
                    if !entry.flags.matches(include, exclude) || !accept(entry.unit) {
                        continue;
                    }
                    let d2 = entry.position.distance_squared(point);
                    if best.map_or(true, |(b, _)| d2 < b) {
                        best = Some((d2, entry.unit));
                    }
                }
            }
            // anything in farther rings is at least `ring` cells away
            let reach = ring as f32 * self.cell_size;
            if let Some((d2, _)) = best {
                if d2 <= reach * reach {
                    break;
                }
            }
        }
        best.map(|(_, unit)| unit)
    }

    /// Nearest matching entry within `radius` of `point`.
    pub fn find_nearest_in_radius(
        &self,
        point: Vec3,
        radius: f32,
        include: UnitFlags,
        exclude: UnitFlags,
    ) -> Option<UnitId> {
        self.find_nearest_in_radius_where(point, radius, include, exclude, |_| true)
    }

    /// Nearest matching entry within `radius` that `accept` also admits.
    pub fn find_nearest_in_radius_where(
        &self,
        point: Vec3,
        radius: f32,
        include: UnitFlags,
        exclude: UnitFlags,
        accept: impl Fn(UnitId) -> bool,
    ) -> Option<UnitId> {
        let candidates = self
            .entries_in_radius(point, radius, include, exclude)
            .filter(|e| accept(e.unit));
        self.nearest_of(point, candidates)
    }

    /// Every matching entry within `radius` of `point`.
    pub fn find_in_radius(
        &self,
        point: Vec3,
        radius: f32,
        include: UnitFlags,
        exclude: UnitFlags,
    ) -> Vec<UnitId> {
        self.entries_in_radius(point, radius, include, exclude)
            .map(|e| e.unit)
            .collect()
    }

    /// Every matching entry.
    pub fn find_all(&self, include: UnitFlags, exclude: UnitFlags) -> Vec<UnitId> {
        self.matching(include, exclude).map(|e| e.unit).collect()
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.entries.clear();
        self.free.clear();
    }

    fn entry(&self, slot: usize) -> Option<&Entry> {
        self.entries.get(slot).and_then(Option::as_ref)
    }

    fn matching(&self, include: UnitFlags, exclude: UnitFlags) -> impl Iterator<Item = &Entry> {
        self.entries
            .iter()
            .flatten()
            .filter(move |e| e.flags.matches(include, exclude))
    }

    fn entries_in_radius(
        &self,
        point: Vec3,
        radius: f32,
        include: UnitFlags,
        exclude: UnitFlags,
    ) -> impl Iterator<Item = &Entry> {
        let radius = radius.max(0.0);
        let lo = self.cell_coords(point - Vec3::splat(radius));
        let hi = self.cell_coords(point + Vec3::splat(radius));
        let r2 = radius * radius;
        (lo[2]..=hi[2])
            .flat_map(move |z| (lo[1]..=hi[1]).flat_map(move |y| (lo[0]..=hi[0]).map(move |x| [x, y, z])))
            .flat_map(move |coords| self.cell_entries(self.cell_index(coords)))
            .filter(move |e| e.flags.matches(include, exclude) && e.position.distance_squared(point) <= r2)
    }

    fn nearest_of<'a>(&self, point: Vec3, entries: impl Iterator<Item = &'a Entry>) -> Option<UnitId> {
        entries
            .map(|e| (e.position.distance_squared(point), e.unit))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, unit)| unit)
    }

    fn cell_entries(&self, cell: usize) -> impl Iterator<Item = &Entry> {
        self.cells[cell].iter().filter_map(|slot| self.entry(*slot))
    }

    fn in_bounds(&self, point: Vec3) -> bool {
        let extent = self.cell_size * self.cells_per_axis as f32;
        let local = point - self.min_corner;
        local.cmpge(Vec3::ZERO).all() && local.cmplt(Vec3::splat(extent)).all()
    }

    fn cell_coords(&self, point: Vec3) -> [i64; 3] {
        let max = self.cells_per_axis as i64 - 1;
        let local = (point - self.min_corner) / self.cell_size;
        [local.x, local.y, local.z].map(|v| (v.floor() as i64).clamp(0, max))
    }

    fn cell_index(&self, [x, y, z]: [i64; 3]) -> usize {
        let n = self.cells_per_axis as usize;
        (z as usize * n + y as usize) * n + x as usize
    }

    /// Cells at Chebyshev distance exactly `ring` from `center`, clipped to the grid.
    fn ring_cells(&self, center: [i64; 3], ring: i64) -> Vec<usize> {
        let max = self.cells_per_axis as i64 - 1;
        let lo = center.map(|c| (c - ring).max(0));
        let hi = center.map(|c| (c + ring).min(max));
        let mut cells = Vec::new();
        for z in lo[2]..=hi[2] {
            for y in lo[1]..=hi[1] {
                for x in lo[0]..=hi[0] {
                    let dist = (x - center[0])
                        .abs()
                        .max((y - center[1]).abs())
                        .max((z - center[2]).abs());
                    if dist == ring {
                        cells.push(self.cell_index([x, y, z]));
                    }
                }
            }
        }
        cells
    }
}

fn remove_from_cell(cell: &mut Vec<usize>, slot: usize) {
    if let Some(pos) = cell.iter().position(|s| *s == slot) {
        cell.swap_remove(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::enums::UnitKind;
    use combat_core::types::EmpireId;
    use proptest::prelude::*;

    fn ship(owner: u8) -> UnitFlags {
        UnitFlags::membership(UnitKind::Ship, EmpireId(owner))
    }

    fn index() -> ProximityIndex {
        ProximityIndex::new(Vec3::ZERO, 100.0, 10)
    }

    #[test]
    fn test_empty_include_finds_nothing() {
        let mut idx = index();
        let _t = idx.insert(UnitId::from_bits(1), ship(0), Vec3::ZERO);
        assert_eq!(
            idx.find_nearest_in_radius(Vec3::ZERO, 10.0, UnitFlags::empty(), UnitFlags::empty()),
            None
        );
        assert_eq!(idx.find_nearest(Vec3::ZERO, UnitFlags::empty(), UnitFlags::empty()), None);
    }

    #[test]
    fn test_single_match_in_radius() {
        let mut idx = index();
        let a = UnitId::from_bits(1);
        let _ta = idx.insert(a, ship(0), Vec3::new(3.0, 0.0, 0.0));
        let _tb = idx.insert(UnitId::from_bits(2), ship(1), Vec3::new(-3.0, 0.0, 0.0));
        assert_eq!(
            idx.find_nearest_in_radius(Vec3::ZERO, 5.0, UnitFlags::SHIP, UnitFlags::owner(EmpireId(1))),
            Some(a)
        );
        assert_eq!(
            idx.find_nearest_in_radius(Vec3::ZERO, 2.0, UnitFlags::SHIP, UnitFlags::empty()),
            None
        );
    }

    #[test]
    fn test_update_moves_between_cells() {
        let mut idx = index();
        let a = UnitId::from_bits(1);
        let token = idx.insert(a, ship(0), Vec3::new(-45.0, -45.0, -45.0));
        idx.update(&token, Vec3::new(45.0, 45.0, 45.0));
        assert_eq!(idx.position(&token), Some(Vec3::new(45.0, 45.0, 45.0)));
        assert!(idx
            .find_in_radius(Vec3::new(-45.0, -45.0, -45.0), 5.0, UnitFlags::SHIP, UnitFlags::empty())
            .is_empty());
        assert_eq!(
            idx.find_in_radius(Vec3::new(45.0, 45.0, 45.0), 5.0, UnitFlags::SHIP, UnitFlags::empty()),
            vec![a]
        );
    }

    #[test]
    fn test_release_removes_entry_and_reuses_slot() {
        let mut idx = index();
        let token = idx.insert(UnitId::from_bits(1), ship(0), Vec3::ZERO);
        idx.release(token);
        assert!(idx.is_empty());
        assert!(idx.find_all(UnitFlags::SHIP, UnitFlags::empty()).is_empty());
        let token = idx.insert(UnitId::from_bits(2), ship(0), Vec3::ZERO);
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.flags(&token), Some(ship(0)));
    }

    #[test]
    fn test_out_of_bounds_entries_still_found() {
        let mut idx = index();
        let far = UnitId::from_bits(9);
        let _t = idx.insert(far, ship(0), Vec3::new(500.0, 0.0, 0.0));
        assert_eq!(idx.find_nearest(Vec3::ZERO, UnitFlags::SHIP, UnitFlags::empty()), Some(far));
        assert_eq!(
            idx.find_nearest(Vec3::new(900.0, 0.0, 0.0), UnitFlags::SHIP, UnitFlags::empty()),
            Some(far)
        );
        assert_eq!(
            idx.find_in_radius(Vec3::new(490.0, 0.0, 0.0), 20.0, UnitFlags::SHIP, UnitFlags::empty()),
            vec![far]
        );
    }

    #[test]
    fn test_rejected_nearest_does_not_hide_farther_match() {
        let mut idx = index();
        let near = UnitId::from_bits(1);
        let far = UnitId::from_bits(2);
        let _tn = idx.insert(near, ship(1), Vec3::new(10.0, 0.0, 0.0));
        let _tf = idx.insert(far, ship(1), Vec3::new(20.0, 0.0, 0.0));

        assert_eq!(idx.find_nearest(Vec3::ZERO, UnitFlags::SHIP, UnitFlags::empty()), Some(near));
        assert_eq!(
            idx.find_nearest_where(Vec3::ZERO, UnitFlags::SHIP, UnitFlags::empty(), |u| u != near),
            Some(far)
        );
        assert_eq!(
            idx.find_nearest_in_radius_where(Vec3::ZERO, 25.0, UnitFlags::SHIP, UnitFlags::empty(), |u| {
                u != near
            }),
            Some(far)
        );
        assert_eq!(
            idx.find_nearest_where(Vec3::ZERO, UnitFlags::SHIP, UnitFlags::empty(), |_| false),
            None
        );
    }

    fn coord() -> impl Strategy<Value = f32> {
        -70.0f32..70.0
    }

    fn point() -> impl Strategy<Value = Vec3> {
        (coord(), coord(), coord()).prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    proptest! {
        #[test]
        fn prop_grid_matches_brute_force(
            units in prop::collection::vec((point(), 0u8..3, 0usize..4), 1..40),
            query in point(),
            radius in 0.0f32..60.0,
            owner in 0u8..3,
        ) {
            let kinds = [UnitKind::Ship, UnitKind::Interceptor, UnitKind::Bomber, UnitKind::Missile];
            let mut idx = index();
            let mut all = Vec::new();
            let mut tokens = Vec::new();
            for (i, (pos, o, k)) in units.iter().enumerate() {
                let id = UnitId::from_bits(i as u64 + 1);
                let flags = UnitFlags::membership(kinds[*k], EmpireId(*o));
                tokens.push(idx.insert(id, flags, *pos));
                all.push((id, flags, *pos));
            }
            let include = UnitFlags::SHIP | UnitFlags::BOMBER;
            let exclude = UnitFlags::owner(EmpireId(owner));

            let mut expected: Vec<UnitId> = all
                .iter()
                .filter(|(_, f, p)| f.matches(include, exclude) && p.distance_squared(query) <= radius * radius)
                .map(|(id, _, _)| *id)
                .collect();
            let mut found = idx.find_in_radius(query, radius, include, exclude);
            expected.sort();
            found.sort();
            prop_assert_eq!(&found, &expected);

            let best = all
                .iter()
                .filter(|(_, f, _)| f.matches(include, exclude))
                .map(|(_, _, p)| p.distance(query))
                .fold(f32::INFINITY, f32::min);
            match idx.find_nearest(query, include, exclude) {
                Some(id) => {
                    let pos = all.iter().find(|(u, _, _)| *u == id).map(|(_, _, p)| *p).unwrap();
                    prop_assert!((pos.distance(query) - best).abs() < 1e-3);
                }
                None => prop_assert!(best.is_infinite()),
            }
        }
    }
}
