//! Enclosed-region detection.
//!
//! The board is copied into a scratch grid one tile larger on every side.
//! The padding ring is always empty, so a flood fill seeded at the padded
//! corner reaches everything that is outside any boundary. Whatever the fill
//! cannot reach is enclosed.

use std::collections::{HashSet, VecDeque};

use crate::game::traits::PlayerId;

use super::grid::{Grid, TileOwner};
use super::state::GridPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Empty,
    Border,
    Fill,
}

/// Scratch board with a one-tile padding ring.
struct PaddedGrid {
    width: usize,
    height: usize,
    marks: Vec<Mark>,
}

impl PaddedGrid {
    fn new(cols: u32, rows: u32) -> Self {
        let width = cols as usize + 2;
        let height = rows as usize + 2;
        Self {
            width,
            height,
            marks: vec![Mark::Empty; width * height],
        }
    }

    /// Marks a board position (unpadded coordinates) as border.
    fn mark_border(&mut self, pos: &GridPos) {
        let idx = (pos.y as usize + 1) * self.width + pos.x as usize + 1;
        self.marks[idx] = Mark::Border;
    }

    /// Breadth-first fill from the padded corner over empty cells.
    fn fill_outside(&mut self) {
        let mut queue = VecDeque::new();
        self.marks[0] = Mark::Fill;
        queue.push_back((0usize, 0usize));

        while let Some((x, y)) = queue.pop_front() {
            let mut visit = |nx: usize, ny: usize, queue: &mut VecDeque<(usize, usize)>| {
                let idx = ny * self.width + nx;
                if self.marks[idx] == Mark::Empty {
                    self.marks[idx] = Mark::Fill;
                    queue.push_back((nx, ny));
                }
            };
            if x > 0 {
                visit(x - 1, y, &mut queue);
            }
            if x + 1 < self.width {
                visit(x + 1, y, &mut queue);
            }
            if y > 0 {
                visit(x, y - 1, &mut queue);
            }
            if y + 1 < self.height {
                visit(x, y + 1, &mut queue);
            }
        }
    }

    /// Board positions (unpadded) the fill did not reach and that are not
    /// border, in row-major order. The padding ring is never reported.
    fn enclosed(&self) -> impl Iterator<Item = GridPos> + '_ {
        (1..self.height - 1).flat_map(move |y| {
            (1..self.width - 1).filter_map(move |x| {
                (self.marks[y * self.width + x] == Mark::Empty)
                    .then(|| GridPos::new(x as i32 - 1, y as i32 - 1))
            })
        })
    }
}

/// Result of filling the interior of one player's territory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FillOutcome {
    /// Territory size after the fill
    pub territory: u32,
    /// Tiles newly claimed by this fill
    pub claimed: u32,
    /// Claimed tiles that belonged to something other than empty ground,
    /// with their previous owner
    pub captured: Vec<(GridPos, TileOwner)>,
}

/// Returns `boundary` together with every tile it encloses.
///
/// Pure set-based form of [`fill_interior`]. Boundary positions outside the
/// `cols × rows` board are ignored.
pub fn enclosed_by(cols: u32, rows: u32, boundary: &HashSet<GridPos>) -> HashSet<GridPos> {
    let mut scratch = PaddedGrid::new(cols, rows);
    let mut region = HashSet::with_capacity(boundary.len());
    for pos in boundary {
        if pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < cols && (pos.y as u32) < rows {
            scratch.mark_border(pos);
            region.insert(*pos);
        }
    }
    scratch.fill_outside();
    region.extend(scratch.enclosed());
    region
}

/// Claims every tile enclosed by `player_id`'s territory directly on the
/// grid. Enclosed tiles are taken regardless of their previous owner.
pub fn fill_interior(grid: &mut Grid, player_id: PlayerId) -> FillOutcome {
    let (cols, rows) = grid.dimensions();
    let own = TileOwner::Territory(player_id);

    let mut scratch = PaddedGrid::new(cols, rows);
    let mut territory = 0;
    for pos in grid.positions() {
        if grid.owner(&pos) == own {
            scratch.mark_border(&pos);
            territory += 1;
        }
    }
    scratch.fill_outside();

    let interior: Vec<GridPos> = scratch.enclosed().collect();
    let mut outcome = FillOutcome {
        territory: territory + interior.len() as u32,
        claimed: interior.len() as u32,
        captured: Vec::new(),
    };
    for pos in interior {
        let previous = grid.owner(&pos);
        if !previous.is_empty() {
            outcome.captured.push((pos, previous));
        }
        grid.set(&pos, own);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(x0: i32, y0: i32, x1: i32, y1: i32) -> HashSet<GridPos> {
        let mut set = HashSet::new();
        for x in x0..=x1 {
            set.insert(GridPos::new(x, y0));
            set.insert(GridPos::new(x, y1));
        }
        for y in y0..=y1 {
            set.insert(GridPos::new(x0, y));
            set.insert(GridPos::new(x1, y));
        }
        set
    }

    fn paint(grid: &mut Grid, tiles: &HashSet<GridPos>, owner: TileOwner) {
        for pos in tiles {
            grid.set(pos, owner);
        }
    }

    #[test]
    fn test_ring_claims_exactly_inside() {
        // 5x5 ring from (2,2) to (6,6) encloses the 3x3 block (3..=5, 3..=5).
        let boundary = ring(2, 2, 6, 6);
        let region = enclosed_by(10, 10, &boundary);

        assert_eq!(region.len(), 25);
        for x in 0..10 {
            for y in 0..10 {
                let pos = GridPos::new(x, y);
                let inside = (2..=6).contains(&x) && (2..=6).contains(&y);
                assert_eq!(region.contains(&pos), inside, "unexpected membership of {pos}");
            }
        }
    }

    #[test]
    fn test_open_shape_encloses_nothing() {
        let mut boundary = ring(2, 2, 6, 6);
        boundary.remove(&GridPos::new(4, 2));
        let region = enclosed_by(10, 10, &boundary);
        assert_eq!(region, boundary);
    }

    #[test]
    fn test_ring_touching_board_edge() {
        // The padding ring keeps the corner seed outside even when the
        // boundary runs along the edge of the board.
        let boundary = ring(0, 0, 3, 3);
        let region = enclosed_by(6, 6, &boundary);
        assert_eq!(region.len(), 16);
        assert!(region.contains(&GridPos::new(1, 1)));
        assert!(region.contains(&GridPos::new(2, 2)));
        assert!(!region.contains(&GridPos::new(4, 4)));
    }

    #[test]
    fn test_ring_covering_corner_seed_position() {
        // A boundary through board (0,0) must not stop the fill: the seed is
        // in the padding ring, not on the board.
        let boundary = ring(0, 0, 5, 5);
        let region = enclosed_by(6, 6, &boundary);
        assert_eq!(region.len(), 36);
    }

    #[test]
    fn test_degenerate_square_has_no_interior() {
        let boundary = ring(3, 3, 4, 4);
        let region = enclosed_by(8, 8, &boundary);
        assert_eq!(region, boundary);
    }

    #[test]
    fn test_fill_interior_in_place() {
        let mut grid = Grid::new(10, 10);
        paint(&mut grid, &ring(1, 1, 5, 5), TileOwner::Territory(0));

        let outcome = fill_interior(&mut grid, 0);

        assert_eq!(outcome.claimed, 9);
        assert_eq!(outcome.territory, 25);
        assert!(outcome.captured.is_empty());
        assert_eq!(grid.count_owner(TileOwner::Territory(0)), 25);
        assert_eq!(grid.owner(&GridPos::new(3, 3)), TileOwner::Territory(0));
        assert_eq!(grid.owner(&GridPos::new(6, 6)), TileOwner::Empty);
    }

    #[test]
    fn test_fill_captures_foreign_tiles() {
        let mut grid = Grid::new(10, 10);
        paint(&mut grid, &ring(1, 1, 5, 5), TileOwner::Territory(0));
        grid.set(&GridPos::new(3, 3), TileOwner::Territory(1));
        grid.set(&GridPos::new(4, 3), TileOwner::Trail(2));

        let outcome = fill_interior(&mut grid, 0);

        assert_eq!(outcome.claimed, 9);
        assert_eq!(outcome.captured.len(), 2);
        assert!(outcome.captured.contains(&(GridPos::new(3, 3), TileOwner::Territory(1))));
        assert!(outcome.captured.contains(&(GridPos::new(4, 3), TileOwner::Trail(2))));
        assert_eq!(grid.count_owner(TileOwner::Territory(1)), 0);
    }

    #[test]
    fn test_refill_is_idempotent() {
        let mut grid = Grid::new(12, 12);
        paint(&mut grid, &ring(2, 2, 8, 7), TileOwner::Territory(3));

        let first = fill_interior(&mut grid, 3);
        let snapshot: Vec<_> = grid.tiles().to_vec();
        let second = fill_interior(&mut grid, 3);

        assert!(first.claimed > 0);
        assert_eq!(second.claimed, 0);
        assert_eq!(second.territory, first.territory);
        assert_eq!(grid.tiles(), snapshot.as_slice());
    }

    #[test]
    fn test_other_players_border_does_not_enclose() {
        let mut grid = Grid::new(10, 10);
        paint(&mut grid, &ring(1, 1, 5, 5), TileOwner::Territory(1));

        let outcome = fill_interior(&mut grid, 0);

        assert_eq!(outcome, FillOutcome::default());
        assert_eq!(grid.owner(&GridPos::new(3, 3)), TileOwner::Empty);
    }
}
