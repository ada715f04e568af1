use crate::{Direction, Position, map::Grid, tile::Tile};

pub const NORTH: u8 = 1;
pub const SOUTH: u8 = 2;
pub const EAST: u8 = 4;
pub const WEST: u8 = 8;
/// Marks a walkable cell, so an enclosed walkable cell differs from a wall.
pub const INSIDE: u8 = 0x10;

pub const fn direction_bit(direction: Direction) -> u8 {
    match direction {
        Direction::North => NORTH,
        Direction::South => SOUTH,
        Direction::East => EAST,
        Direction::West => WEST,
    }
}

/// Per-cell 4-bit open-edge masks derived from tile walkability.
///
/// Derived once from a [`Grid<Tile>`]; it must be rebuilt if the set of
/// walkable tiles changes. Eating pellets does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityGrid {
    masks: Grid<u8>,
}

impl ConnectivityGrid {
    pub fn from_tiles(tiles: &Grid<Tile>) -> Self {
        let open = |position: Option<Position>| {
            position.is_some_and(|p| tiles.get(p.x, p.y).is_some_and(|t| t.is_walkable()))
        };
        let masks = Grid::from_generator(tiles.width(), tiles.height(), |x, y| {
            let here = Position::new(x, y);
            if !tiles[here].is_walkable() {
                return 0;
            }
            Direction::SCAN_ORDER
                .into_iter()
                .filter(|d| open(here.step(*d)))
                .fold(INSIDE, |mask, d| mask | direction_bit(d))
        });
        ConnectivityGrid { masks }
    }

    /// Wraps precomputed masks (e.g. a carved cell maze).
    pub fn from_masks(masks: Grid<u8>) -> Self {
        ConnectivityGrid { masks }
    }

    pub fn width(&self) -> usize {
        self.masks.width()
    }

    pub fn height(&self) -> usize {
        self.masks.height()
    }

    pub fn contains(&self, position: Position) -> bool {
        self.masks.contains(position)
    }

    /// The raw mask, `0` outside the grid.
    pub fn mask(&self, position: Position) -> u8 {
        self.masks.get(position.x, position.y).copied().unwrap_or(0)
    }

    pub fn is_walkable(&self, position: Position) -> bool {
        self.mask(position) & INSIDE != 0
    }

    pub fn is_open(&self, position: Position, direction: Direction) -> bool {
        self.mask(position) & direction_bit(direction) != 0
    }

    /// Neighbours reachable from `position`, in `order`.
    pub fn open_neighbors(
        &self,
        position: Position,
        order: [Direction; 4],
    ) -> impl Iterator<Item = Position> + '_ {
        order.into_iter().filter_map(move |direction| {
            if self.is_open(position, direction) {
                self.masks.neighbor(position, direction)
            } else {
                None
            }
        })
    }

    pub fn masks(&self) -> &Grid<u8> {
        &self.masks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;

    #[test]
    fn masks_follow_walkable_neighbours() {
        let level: Level = "
#####
#S0.#
#1#2#
#3..#
#####
"
        .parse()
        .unwrap();
        let grid = level.connectivity();
        assert_eq!(grid.mask(Position::new(0, 0)), 0);
        assert_eq!(grid.mask(Position::new(1, 1)), INSIDE | EAST | SOUTH);
        assert_eq!(grid.mask(Position::new(2, 1)), INSIDE | EAST | WEST);
        assert_eq!(grid.mask(Position::new(3, 2)), INSIDE | NORTH | SOUTH);
        assert!(!grid.is_walkable(Position::new(2, 2)));
        assert_eq!(grid.mask(Position::new(40, 40)), 0);
    }

    #[test]
    fn edges_are_symmetric() {
        let level = Level::classic();
        let grid = level.connectivity();
        for (position, _) in grid.masks().enumerate() {
            for direction in Direction::SCAN_ORDER {
                if grid.is_open(position, direction) {
                    let next = position.step(direction).unwrap();
                    assert!(grid.is_open(next, direction.opposite()));
                }
            }
        }
    }

    #[test]
    fn gate_is_not_connected() {
        let level = Level::classic();
        let grid = level.connectivity();
        let gate = level.house().unwrap().gate;
        assert!(!grid.is_walkable(gate));
        assert!(!grid.is_open(Position::new(gate.x, gate.y - 1), Direction::South));
    }
}
