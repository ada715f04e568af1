use serde::{Deserialize, Serialize};

pub mod config;
pub mod connectivity;
pub mod ghost;
pub mod level;
pub mod map;
pub mod maze;
mod movement;
pub mod search;
pub mod session;
pub mod targeting;
pub mod tile;

/// A tile coordinate on the grid (column `x`, row `y`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Pixel-space center of this tile.
    pub fn center(self, tile_size: f32) -> Vec2 {
        Vec2::new(
            self.x as f32 * tile_size + tile_size / 2.0,
            self.y as f32 * tile_size + tile_size / 2.0,
        )
    }

    /// The adjacent tile in `direction`, or `None` when it would underflow.
    /// No upper bound check is made here; grids do that.
    pub fn step(self, direction: Direction) -> Option<Position> {
        let (dx, dy) = direction.delta();
        Some(Position {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }

    pub fn manhattan_distance(self, other: Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// A continuous pixel-space point. Agents store their center here.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Moves `amount` pixels along `direction`.
    pub fn offset(self, direction: Direction, amount: f32) -> Vec2 {
        let (dx, dy) = direction.delta();
        Vec2::new(self.x + dx as f32 * amount, self.y + dy as f32 * amount)
    }

    /// The tile containing this point, or `None` left of / above the grid origin.
    pub fn to_tile(self, tile_size: f32) -> Option<Position> {
        if self.x < 0.0 || self.y < 0.0 {
            return None;
        }
        Some(Position {
            x: (self.x / tile_size).floor() as usize,
            y: (self.y / tile_size).floor() as usize,
        })
    }
}

/// One of the four compass headings.
///
/// Declaration order is the scan order used whenever directions are
/// evaluated in turn: East, West, North, South.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    East,
    West,
    North,
    South,
}

impl Direction {
    pub const SCAN_ORDER: [Direction; 4] = [
        Direction::East,
        Direction::West,
        Direction::North,
        Direction::South,
    ];

    /// Grid delta; north is towards row 0.
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::North => (0, -1),
            Direction::South => (0, 1),
        }
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
        }
    }

    pub const fn is_horizontal(self) -> bool {
        matches!(self, Direction::East | Direction::West)
    }

    /// The heading that moves from `from` to the adjacent tile `to`.
    pub fn between(from: Position, to: Position) -> Option<Direction> {
        Direction::SCAN_ORDER
            .into_iter()
            .find(|d| from.step(*d) == Some(to))
    }
}
