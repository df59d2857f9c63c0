use std::collections::{HashSet, VecDeque};

use crate::game::traits::PlayerId;

use super::grid::{Grid, TileOwner};
use super::state::GridPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailSegment {
    pub pos: GridPos,
    /// Ticks since the tile was written
    pub age: u32,
}

/// Ordered trail of one player, oldest tile first.
///
/// Every method that changes the trail writes the matching tiles on the grid,
/// so the tracker and the `Trail(id)` tiles of the board always agree.
#[derive(Debug, Clone)]
pub struct TrailTracker {
    owner: PlayerId,
    segments: VecDeque<TrailSegment>,
}

impl TrailTracker {
    pub fn new(owner: PlayerId) -> Self {
        Self {
            owner,
            segments: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn contains(&self, pos: &GridPos) -> bool {
        self.segments.iter().any(|s| s.pos == *pos)
    }

    /// Newest tile.
    pub fn last(&self) -> Option<GridPos> {
        self.segments.back().map(|s| s.pos)
    }

    /// The tile written just before the newest one.
    pub fn before_last(&self) -> Option<GridPos> {
        let len = self.segments.len();
        (len >= 2).then(|| self.segments[len - 2].pos)
    }

    pub fn segments(&self) -> impl Iterator<Item = &TrailSegment> {
        self.segments.iter()
    }

    pub fn positions(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.segments.iter().map(|s| s.pos)
    }

    /// Appends `pos` as the newest tile and marks it on the grid with age 0.
    pub fn push(&mut self, grid: &mut Grid, pos: GridPos) {
        grid.set(&pos, TileOwner::Trail(self.owner));
        self.segments.push_back(TrailSegment { pos, age: 0 });
    }

    /// Ages every tile by one tick and evicts, oldest first, the tiles whose
    /// age exceeds `max_len`. Evicted tiles become empty ground.
    pub fn age_tick(&mut self, grid: &mut Grid, max_len: u32) -> Vec<GridPos> {
        for segment in self.segments.iter_mut() {
            segment.age += 1;
            grid.set_age(&segment.pos, segment.age);
        }

        let mut evicted = Vec::new();
        while let Some(oldest) = self.segments.front() {
            if oldest.age <= max_len {
                break;
            }
            let pos = oldest.pos;
            self.segments.pop_front();
            grid.set(&pos, TileOwner::Empty);
            evicted.push(pos);
        }
        evicted
    }

    /// Resets every trail tile to empty ground and empties the trail.
    pub fn clear(&mut self, grid: &mut Grid) -> Vec<GridPos> {
        self.segments
            .drain(..)
            .map(|segment| {
                grid.set(&segment.pos, TileOwner::Empty);
                segment.pos
            })
            .collect()
    }

    /// Converts the whole trail into the owner's territory.
    pub fn drain_into_territory(&mut self, grid: &mut Grid) -> Vec<GridPos> {
        let owner = TileOwner::Territory(self.owner);
        self.segments
            .drain(..)
            .map(|segment| {
                grid.set(&segment.pos, owner);
                segment.pos
            })
            .collect()
    }

    /// Closes the trail into a loop. Tiles in `loop_tiles` become the owner's
    /// territory, every other trail tile goes back to empty ground. Returns
    /// the tiles that were claimed.
    pub fn close_into(&mut self, grid: &mut Grid, loop_tiles: &HashSet<GridPos>) -> Vec<GridPos> {
        let own = TileOwner::Territory(self.owner);
        self.segments
            .drain(..)
            .filter_map(|segment| {
                if loop_tiles.contains(&segment.pos) {
                    grid.set(&segment.pos, own);
                    Some(segment.pos)
                } else {
                    grid.set(&segment.pos, TileOwner::Empty);
                    None
                }
            })
            .collect()
    }

    /// Drops `pos` from the trail without touching the grid. Used when some
    /// other rule already rewrote the tile.
    pub fn forget(&mut self, pos: &GridPos) {
        self.segments.retain(|s| s.pos != *pos);
    }

    /// Re-derives the trail from the grid's `Trail(owner)` tiles.
    pub fn rebuild(&mut self, grid: &Grid) {
        self.segments = grid
            .trail_of(self.owner)
            .into_iter()
            .map(|pos| TrailSegment {
                pos,
                age: grid.get(&pos).age,
            })
            .collect();
    }
}
