use serde::{Deserialize, Serialize};

/// Cosmetic sub-kind of a wall tile, picked from its wall neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallKind {
    Vertical,
    Horizontal,
    CornerTopRight,
    CornerTopLeft,
    CornerBottomLeft,
    CornerBottomRight,
}

impl WallKind {
    /// Chooses a sub-kind from which orthogonal neighbours are walls.
    ///
    /// Corners are named after the quadrant of the tile they occupy, so a
    /// wall joining its east and south neighbours is a top-left corner.
    pub fn classify(north: bool, south: bool, east: bool, west: bool) -> WallKind {
        let vertical = north || south;
        let horizontal = east || west;
        match (north, south, east, west) {
            (false, true, true, false) => WallKind::CornerTopLeft,
            (false, true, false, true) => WallKind::CornerTopRight,
            (true, false, true, false) => WallKind::CornerBottomLeft,
            (true, false, false, true) => WallKind::CornerBottomRight,
            _ if vertical && !horizontal => WallKind::Vertical,
            _ => WallKind::Horizontal,
        }
    }
}

/// One cell of the level.
///
/// Numeric codes: 0 empty, 1 pellet, 2 power pellet, 3..=8 wall sub-kinds,
/// 9 gate. Walkability is `code <= 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Tile {
    #[default]
    Empty,
    Pellet,
    PowerPellet,
    Wall(WallKind),
    Gate,
}

impl Tile {
    pub const fn code(self) -> u8 {
        match self {
            Tile::Empty => 0,
            Tile::Pellet => 1,
            Tile::PowerPellet => 2,
            Tile::Wall(WallKind::Vertical) => 3,
            Tile::Wall(WallKind::Horizontal) => 4,
            Tile::Wall(WallKind::CornerTopRight) => 5,
            Tile::Wall(WallKind::CornerTopLeft) => 6,
            Tile::Wall(WallKind::CornerBottomLeft) => 7,
            Tile::Wall(WallKind::CornerBottomRight) => 8,
            Tile::Gate => 9,
        }
    }

    /// Player-facing traversability. The gate is excluded; only ghost
    /// exit/entry manoeuvres cross it.
    #[inline]
    pub const fn is_walkable(self) -> bool {
        self.code() <= 2
    }

    #[inline]
    pub const fn is_wall(self) -> bool {
        matches!(self, Tile::Wall(_))
    }

    /// Score awarded for eating whatever lies on this tile.
    pub const fn pellet_value(self) -> u32 {
        match self {
            Tile::Pellet => 10,
            Tile::PowerPellet => 50,
            _ => 0,
        }
    }
}

impl From<Tile> for u8 {
    fn from(tile: Tile) -> Self {
        tile.code()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unknown tile code {0}")]
pub struct UnknownTileCode(pub u8);

impl TryFrom<u8> for Tile {
    type Error = UnknownTileCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Tile::Empty,
            1 => Tile::Pellet,
            2 => Tile::PowerPellet,
            3 => Tile::Wall(WallKind::Vertical),
            4 => Tile::Wall(WallKind::Horizontal),
            5 => Tile::Wall(WallKind::CornerTopRight),
            6 => Tile::Wall(WallKind::CornerTopLeft),
            7 => Tile::Wall(WallKind::CornerBottomLeft),
            8 => Tile::Wall(WallKind::CornerBottomRight),
            9 => Tile::Gate,
            other => return Err(UnknownTileCode(other)),
        })
    }
}

/// Result of eating the tile under the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreDelta {
    pub points: u32,
    /// Set when a power pellet was eaten; the driver turns this into the
    /// frightened broadcast.
    pub power: bool,
}
