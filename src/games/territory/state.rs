use crate::game::traits::PlayerId;

use super::powerup::PowerupKind;
use super::trail::TrailTracker;

/// A position on the game grid
///
/// (0,0) is the top-left corner,
/// x increases to the right, y increases downward.
/// Coordinates are signed so that a step off the board is representable
/// and can be rejected instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn moved(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }

    pub fn distance(&self, other: &GridPos) -> u32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u32
    }

    pub fn is_adjacent(&self, other: &GridPos) -> bool {
        self.distance(other) == 1
    }

    /// The four orthogonal neighbours, in up/down/left/right order.
    pub fn neighbors(&self) -> [GridPos; 4] {
        [
            self.offset(0, -1),
            self.offset(0, 1),
            self.offset(-1, 0),
            self.offset(1, 0),
        ]
    }
}

impl std::ops::Add for GridPos {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl std::ops::Sub for GridPos {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::None => (0, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn from_proto(value: i32) -> Direction {
        match value {
            1 => Direction::Up,
            2 => Direction::Down,
            3 => Direction::Left,
            4 => Direction::Right,
            _ => Direction::None,
        }
    }

    pub fn to_proto(self) -> i32 {
        match self {
            Direction::None => 0,
            Direction::Up => 1,
            Direction::Down => 2,
            Direction::Left => 3,
            Direction::Right => 4,
        }
    }
}

/// Per-player state owned by the territory engine.
#[derive(Debug, Clone)]
pub struct Player {
    /// Seat id
    pub id: PlayerId,
    /// Current position on the grid
    pub position: GridPos,
    /// The last two positions, most recent first
    pub previous_positions: [GridPos; 2],
    /// Tiles crossed since the player last stood on own territory
    pub trail: TrailTracker,
    /// Number of territory tiles owned
    pub area: u32,
    /// Currently held pickup
    pub powerup: Option<PowerupKind>,
}

impl Player {
    pub fn new(id: PlayerId, position: GridPos) -> Self {
        Self {
            id,
            position,
            previous_positions: [position; 2],
            trail: TrailTracker::new(id),
            area: 0,
            powerup: None,
        }
    }

    pub fn has_trail(&self) -> bool {
        !self.trail.is_empty()
    }

    /// Shifts the current position into the history before moving to `to`.
    pub(crate) fn step_to(&mut self, to: GridPos) {
        self.previous_positions[1] = self.previous_positions[0];
        self.previous_positions[0] = self.position;
        self.position = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_pos_operations() {
        let pos = GridPos::new(5, 10);
        assert_eq!(pos.offset(1, -1), GridPos::new(6, 9));
        assert_eq!(pos.moved(Direction::Up), GridPos::new(5, 9));
        assert_eq!(pos.moved(Direction::Right), GridPos::new(6, 10));
        assert_eq!(pos + GridPos::new(1, 1), GridPos::new(6, 11));
        assert_eq!(pos - GridPos::new(5, 10), GridPos::new(0, 0));
    }

    #[test]
    fn test_grid_pos_distance() {
        let a = GridPos::new(0, 0);
        let b = GridPos::new(3, 4);
        assert_eq!(a.distance(&b), 7); // Manhattan distance
        assert!(a.is_adjacent(&GridPos::new(0, 1)));
        assert!(!a.is_adjacent(&GridPos::new(1, 1)));
        assert!(!a.is_adjacent(&a));
    }

    #[test]
    fn test_neighbors() {
        let n = GridPos::new(2, 2).neighbors();
        assert!(n.contains(&GridPos::new(2, 1)));
        assert!(n.contains(&GridPos::new(2, 3)));
        assert!(n.contains(&GridPos::new(1, 2)));
        assert!(n.contains(&GridPos::new(3, 2)));
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::Up.delta(), (0, -1));
        assert_eq!(Direction::Down.delta(), (0, 1));
        assert_eq!(Direction::Left.delta(), (-1, 0));
        assert_eq!(Direction::Right.delta(), (1, 0));
        assert_eq!(Direction::None.delta(), (0, 0));
    }

    #[test]
    fn test_direction_proto_mapping() {
        assert_eq!(Direction::from_proto(0), Direction::None);
        assert_eq!(Direction::from_proto(1), Direction::Up);
        assert_eq!(Direction::from_proto(2), Direction::Down);
        assert_eq!(Direction::from_proto(3), Direction::Left);
        assert_eq!(Direction::from_proto(4), Direction::Right);
        assert_eq!(Direction::from_proto(99), Direction::None); // Invalid defaults to None

        for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            assert_eq!(Direction::from_proto(dir.to_proto()), dir);
        }
    }

    #[test]
    fn test_player_step_history() {
        let mut player = Player::new(0, GridPos::new(1, 1));
        assert_eq!(player.previous_positions, [GridPos::new(1, 1); 2]);

        player.step_to(GridPos::new(2, 1));
        player.step_to(GridPos::new(3, 1));

        assert_eq!(player.position, GridPos::new(3, 1));
        assert_eq!(player.previous_positions, [GridPos::new(2, 1), GridPos::new(1, 1)]);
        assert!(!player.has_trail());
    }
}
