use crate::game::traits::PlayerId;

use super::state::GridPos;

/// Who a tile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileOwner {
    #[default]
    Empty,
    Territory(PlayerId),
    Trail(PlayerId),
}

impl TileOwner {
    /// The player this tile belongs to, territory or trail.
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            TileOwner::Empty => None,
            TileOwner::Territory(id) | TileOwner::Trail(id) => Some(*id),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, TileOwner::Empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tile {
    pub owner: TileOwner,
    /// Ticks since a trail tile was written; 0 for anything else
    pub age: u32,
}

/// Fixed-size board of tiles.
///
/// Every owner change goes through [`Grid::set`] and is recorded in a change
/// log so callers can publish deltas without diffing whole boards.
/// Out-of-range coordinates panic: they are always a caller bug.
#[derive(Clone)]
pub struct Grid {
    /// Width of the grid
    cols: u32,
    /// Height of the grid
    rows: u32,
    /// Row-major tile storage
    tiles: Vec<Tile>,
    /// Owner changes since the last `take_changes`
    changes: Vec<(GridPos, TileOwner)>,
}

impl Grid {
    pub fn new(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            rows,
            tiles: vec![Tile::default(); (cols * rows) as usize],
            changes: Vec::new(),
        }
    }

    /// Rebuilds a grid from a row-major tile list. Returns `None` when the
    /// list does not match the dimensions.
    pub fn from_tiles(cols: u32, rows: u32, tiles: Vec<Tile>) -> Option<Self> {
        if tiles.len() != (cols * rows) as usize {
            return None;
        }
        Some(Self {
            cols,
            rows,
            tiles,
            changes: Vec::new(),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    pub fn total_tiles(&self) -> usize {
        self.tiles.len()
    }

    pub fn in_bounds(&self, pos: &GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.cols && (pos.y as u32) < self.rows
    }

    fn index(&self, pos: &GridPos) -> usize {
        assert!(
            self.in_bounds(pos),
            "grid position {} outside {}x{} board",
            pos,
            self.cols,
            self.rows
        );
        (pos.y as u32 * self.cols + pos.x as u32) as usize
    }

    pub fn get(&self, pos: &GridPos) -> Tile {
        self.tiles[self.index(pos)]
    }

    pub fn try_get(&self, pos: &GridPos) -> Option<Tile> {
        self.in_bounds(pos).then(|| self.get(pos))
    }

    pub fn owner(&self, pos: &GridPos) -> TileOwner {
        self.get(pos).owner
    }

    /// Writes a new owner and resets the tile's age.
    pub fn set(&mut self, pos: &GridPos, owner: TileOwner) {
        let idx = self.index(pos);
        let tile = &mut self.tiles[idx];
        tile.age = 0;
        if tile.owner != owner {
            tile.owner = owner;
            self.changes.push((*pos, owner));
        }
    }

    pub fn set_age(&mut self, pos: &GridPos, age: u32) {
        let idx = self.index(pos);
        self.tiles[idx].age = age;
    }

    pub fn count_owner(&self, owner: TileOwner) -> u32 {
        self.tiles.iter().filter(|t| t.owner == owner).count() as u32
    }

    pub fn positions(&self) -> impl Iterator<Item = GridPos> + use<> {
        let (cols, rows) = (self.cols as i32, self.rows as i32);
        (0..rows).flat_map(move |y| (0..cols).map(move |x| GridPos::new(x, y)))
    }

    pub fn positions_of(&self, owner: TileOwner) -> Vec<GridPos> {
        self.positions().filter(|pos| self.owner(pos) == owner).collect()
    }

    /// Trail tiles of `player_id`, oldest first.
    ///
    /// Ages along one trail are strictly decreasing from tail to head, so the
    /// order of the trail can be recovered from the board alone.
    pub fn trail_of(&self, player_id: PlayerId) -> Vec<GridPos> {
        let mut trail: Vec<(u32, GridPos)> = self
            .positions()
            .filter_map(|pos| {
                let tile = self.get(&pos);
                (tile.owner == TileOwner::Trail(player_id)).then_some((tile.age, pos))
            })
            .collect();
        trail.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        trail.into_iter().map(|(_, pos)| pos).collect()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Drains the owner changes recorded since the previous call.
    pub fn take_changes(&mut self) -> Vec<(GridPos, TileOwner)> {
        std::mem::take(&mut self.changes)
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("cols", &self.cols)
            .field("rows", &self.rows)
            .field(
                "claimed_tiles",
                &self.tiles.iter().filter(|t| !t.owner.is_empty()).count(),
            )
            .finish()
    }
}
