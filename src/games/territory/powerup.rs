use std::collections::HashMap;

use rand::Rng;

use super::grid::Grid;
use super::state::GridPos;

/// Pickups lying on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerupKind {
    /// Move two tiles per tick
    Speed,
    /// Trail survives `trail_powerup_len` ticks longer
    LongTrail,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 2] = [PowerupKind::Speed, PowerupKind::LongTrail];

    pub fn to_proto(self) -> i32 {
        match self {
            PowerupKind::Speed => 1,
            PowerupKind::LongTrail => 2,
        }
    }

    pub fn from_proto(value: i32) -> Option<Self> {
        match value {
            1 => Some(PowerupKind::Speed),
            2 => Some(PowerupKind::LongTrail),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct PowerupField {
    pickups: HashMap<GridPos, PowerupKind>,
}

impl PowerupField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pos: &GridPos) -> Option<PowerupKind> {
        self.pickups.get(pos).copied()
    }

    pub fn take(&mut self, pos: &GridPos) -> Option<PowerupKind> {
        self.pickups.remove(pos)
    }

    pub fn insert(&mut self, pos: GridPos, kind: PowerupKind) {
        self.pickups.insert(pos, kind);
    }

    pub fn clear(&mut self) {
        self.pickups.clear();
    }

    /// Pickups ordered by position.
    pub fn sorted(&self) -> Vec<(GridPos, PowerupKind)> {
        let mut pickups: Vec<_> = self.pickups.iter().map(|(pos, kind)| (*pos, *kind)).collect();
        pickups.sort_by_key(|(pos, _)| *pos);
        pickups
    }

    pub fn len(&self) -> usize {
        self.pickups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pickups.is_empty()
    }

    /// Places one pickup of a random kind on a random empty tile, keeping a
    /// one-tile margin from the edge. Returns `None` if no tile qualifies.
    pub fn place_random<R: Rng + ?Sized>(
        &mut self,
        grid: &Grid,
        rng: &mut R,
    ) -> Option<(GridPos, PowerupKind)> {
        let (cols, rows) = grid.dimensions();
        let candidates: Vec<GridPos> = grid
            .positions()
            .filter(|pos| {
                pos.x >= 1
                    && pos.y >= 1
                    && (pos.x as u32) + 1 < cols
                    && (pos.y as u32) + 1 < rows
                    && grid.owner(pos).is_empty()
                    && !self.pickups.contains_key(pos)
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let pos = candidates[rng.gen_range(0..candidates.len())];
        let kind = PowerupKind::ALL[rng.gen_range(0..PowerupKind::ALL.len())];
        self.pickups.insert(pos, kind);
        Some((pos, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::territory::grid::TileOwner;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_place_random_is_seeded() {
        let grid = Grid::new(20, 20);
        let mut a = PowerupField::new();
        let mut b = PowerupField::new();

        let first = a.place_random(&grid, &mut ChaCha8Rng::seed_from_u64(7));
        let second = b.place_random(&grid, &mut ChaCha8Rng::seed_from_u64(7));

        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_place_random_keeps_margin_and_avoids_claimed_tiles() {
        let mut grid = Grid::new(5, 5);
        // Only (2,2) is an empty tile away from the edge.
        for pos in [(1, 1), (2, 1), (3, 1), (1, 2), (3, 2), (1, 3), (2, 3), (3, 3)] {
            grid.set(&GridPos::new(pos.0, pos.1), TileOwner::Territory(0));
        }
        let mut field = PowerupField::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let placed = field.place_random(&grid, &mut rng).unwrap();
        assert_eq!(placed.0, GridPos::new(2, 2));
        assert_eq!(field.place_random(&grid, &mut rng), None);
    }

    #[test]
    fn test_take_removes_pickup() {
        let grid = Grid::new(6, 6);
        let mut field = PowerupField::new();
        let (pos, kind) = field
            .place_random(&grid, &mut ChaCha8Rng::seed_from_u64(3))
            .unwrap();

        assert_eq!(field.get(&pos), Some(kind));
        assert_eq!(field.take(&pos), Some(kind));
        assert!(field.is_empty());
    }

    #[test]
    fn test_proto_mapping() {
        for kind in PowerupKind::ALL {
            assert_eq!(PowerupKind::from_proto(kind.to_proto()), Some(kind));
        }
        assert_eq!(PowerupKind::from_proto(0), None);
    }
}
