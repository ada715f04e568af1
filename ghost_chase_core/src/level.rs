use std::{collections::VecDeque, str::FromStr};

use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    Direction, Position, Vec2,
    config::ConfigError,
    connectivity::ConnectivityGrid,
    map::{Grid, GridError},
    tile::{ScoreDelta, Tile, WallKind},
};

/// Number of pursuers every level provides spawns for.
pub const GHOST_COUNT: usize = 4;

/// Spawns are kept at least this far apart (in tiles) when picked at random.
const MIN_SPAWN_SEPARATION: f32 = 7.0;
const SPAWN_ATTEMPTS: usize = 50;

/// A flood from below the gate larger than this share of the grid means the
/// "house" is not enclosed.
const MAX_HOUSE_SHARE: usize = 8;

const CLASSIC_BOARD: [&str; 31] = [
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o####.#####.##.#####.####o#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.##### ## #####.######",
    "######.##### ## #####.######",
    "######.##    0     ##.######",
    "######.## ###--### ##.######",
    "######.## #      # ##.######",
    "      .   # 1 2 3#   .      ",
    "######.## #      # ##.######",
    "######.## ######## ##.######",
    "######.##          ##.######",
    "######.## ######## ##.######",
    "######.## ######## ##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#.####.#####.##.#####.####.#",
    "#o..##.......S........##..o#",
    "###.##.##.########.##.##.###",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#.##########.##.##########.#",
    "#..........................#",
    "############################",
];

/// Failures while loading a level from text or JSON.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("Level is empty")]
    Empty,
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("Unknown map symbol '{symbol}' at ({x}, {y})")]
    UnknownSymbol { symbol: char, x: usize, y: usize },
    #[error("Spawn marker '{0}' appears more than once")]
    DuplicateSpawn(char),
    #[error("Spawn marker '{0}' is missing")]
    MissingSpawn(char),
    #[error("Level has no walkable tile to spawn on")]
    NoFloor,
    #[error("Malformed level JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Start tiles for the player and each ghost (indexed by role).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spawns {
    pub player: Position,
    pub ghosts: [Position; GHOST_COUNT],
}

/// The enclosed box ghosts wait in, reached through a single gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostHouse {
    pub gate: Position,
    interior: Vec<Position>,
    min: Position,
    max: Position,
}

impl GhostHouse {
    /// Finds the first gate in row-major order and floods the walkable
    /// tiles beneath it. Returns `None` when there is no gate or the flood
    /// escapes into the maze.
    pub fn locate(tiles: &Grid<Tile>) -> Option<GhostHouse> {
        let (gate, _) = tiles.enumerate().find(|(_, tile)| **tile == Tile::Gate)?;
        let below = tiles.neighbor(gate, Direction::South)?;
        if !tiles[below].is_walkable() {
            return None;
        }

        let limit = (tiles.width() * tiles.height()) / MAX_HOUSE_SHARE;
        let mut seen = Grid::filled(tiles.width(), tiles.height(), false);
        let mut queue = VecDeque::from([below]);
        let mut interior = Vec::new();
        seen[below] = true;
        while let Some(current) = queue.pop_front() {
            interior.push(current);
            if interior.len() > limit {
                return None;
            }
            for direction in Direction::SCAN_ORDER {
                let Some(next) = tiles.neighbor(current, direction) else {
                    continue;
                };
                if !seen[next] && tiles[next].is_walkable() {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }

        let min = Position::new(
            interior.iter().map(|p| p.x).min()?,
            interior.iter().map(|p| p.y).min()?,
        );
        let max = Position::new(
            interior.iter().map(|p| p.x).max()?,
            interior.iter().map(|p| p.y).max()?,
        );
        Some(GhostHouse {
            gate,
            interior,
            min,
            max,
        })
    }

    pub fn contains(&self, tile: Position) -> bool {
        self.interior.contains(&tile)
    }

    pub fn interior(&self) -> &[Position] {
        &self.interior
    }

    /// Pixel center of the interior's bounding box.
    pub fn center(&self, tile_size: f32) -> Vec2 {
        Vec2::new(
            (self.min.x + self.max.x + 1) as f32 * tile_size / 2.0,
            (self.min.y + self.max.y + 1) as f32 * tile_size / 2.0,
        )
    }

    /// Leftmost and rightmost interior pixel x a ghost center may occupy.
    pub fn lateral_bounds(&self, tile_size: f32) -> (f32, f32) {
        (
            self.min.x as f32 * tile_size + tile_size / 2.0,
            self.max.x as f32 * tile_size + tile_size / 2.0,
        )
    }

    /// The tile directly outside the gate, where released ghosts appear.
    pub fn doorstep(&self) -> Option<Position> {
        self.gate.step(Direction::North)
    }
}

/// The tile grid of one session plus its spawn points and optional house.
#[derive(Debug, Clone)]
pub struct Level {
    tiles: Grid<Tile>,
    spawns: Spawns,
    house: Option<GhostHouse>,
}

impl Level {
    pub fn new(mut tiles: Grid<Tile>, spawns: Spawns) -> Self {
        classify_walls(&mut tiles);
        let house = GhostHouse::locate(&tiles);
        Level {
            tiles,
            spawns,
            house,
        }
    }

    /// The built-in hand-authored board.
    pub fn classic() -> Self {
        CLASSIC_BOARD
            .join("\n")
            .parse()
            .expect("built-in classic board is well formed")
    }

    /// Wraps a bare tile grid, choosing spawn points with `rng`.
    pub fn from_tiles(tiles: Grid<Tile>, rng: &mut impl Rng) -> Result<Self, LevelError> {
        let house = GhostHouse::locate(&tiles);
        let spawns = choose_spawns(&tiles, house.as_ref(), rng)?;
        Ok(Level::new(tiles, spawns))
    }

    /// Parses a JSON nested array of tile codes.
    pub fn from_json(json: &str, rng: &mut impl Rng) -> Result<Self, LevelError> {
        let rows: Vec<Vec<Tile>> = serde_json::from_str(json)?;
        if rows.is_empty() || rows[0].is_empty() {
            return Err(LevelError::Empty);
        }
        Level::from_tiles(Grid::from_rows(rows)?, rng)
    }

    /// Serializes the tiles as a JSON nested array of codes.
    pub fn to_json(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string(&self.tiles.to_rows())?)
    }

    pub fn width(&self) -> usize {
        self.tiles.width()
    }

    pub fn height(&self) -> usize {
        self.tiles.height()
    }

    pub fn tiles(&self) -> &Grid<Tile> {
        &self.tiles
    }

    pub fn spawns(&self) -> &Spawns {
        &self.spawns
    }

    pub fn house(&self) -> Option<&GhostHouse> {
        self.house.as_ref()
    }

    pub fn category(&self, x: usize, y: usize) -> Result<Tile, GridError> {
        self.tiles.try_get(x, y).copied()
    }

    pub fn is_walkable(&self, x: usize, y: usize) -> Result<bool, GridError> {
        Ok(self.category(x, y)?.is_walkable())
    }

    /// Bounds-tolerant walkability for hot paths: out of bounds is a wall.
    #[inline]
    pub fn is_open(&self, position: Position) -> bool {
        self.tiles
            .get(position.x, position.y)
            .is_some_and(|tile| tile.is_walkable())
    }

    /// Eats whatever lies on `(x, y)`, leaving the tile empty.
    pub fn consume_pellet(&mut self, x: usize, y: usize) -> Result<ScoreDelta, GridError> {
        let tile = self.category(x, y)?;
        let points = tile.pellet_value();
        if points == 0 {
            return Ok(ScoreDelta::default());
        }
        self.tiles.set(x, y, Tile::Empty)?;
        Ok(ScoreDelta {
            points,
            power: tile == Tile::PowerPellet,
        })
    }

    pub fn pellets_remaining(&self) -> usize {
        self.tiles
            .iter()
            .filter(|tile| tile.pellet_value() > 0)
            .count()
    }

    /// Neighbour of `position` including the horizontal screen wrap.
    pub fn wrapped_neighbor(&self, position: Position, direction: Direction) -> Option<Position> {
        if let Some(next) = self.tiles.neighbor(position, direction) {
            return Some(next);
        }
        let last = self.width().checked_sub(1)?;
        match direction {
            Direction::West if position.x == 0 => Some(Position::new(last, position.y)),
            Direction::East if position.x == last => Some(Position::new(0, position.y)),
            _ => None,
        }
    }

    pub fn connectivity(&self) -> ConnectivityGrid {
        ConnectivityGrid::from_tiles(&self.tiles)
    }

    pub fn pixel_width(&self, tile_size: f32) -> f32 {
        self.width() as f32 * tile_size
    }
}

impl FromStr for Level {
    type Err = LevelError;

    /// Text format: `#` wall, `.` pellet, `o` power pellet, space empty,
    /// `-` gate, `S` player start, `0`..`3` ghost starts by role index.
    fn from_str(map: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = map
            .lines()
            .skip_while(|line| line.trim().is_empty())
            .collect();
        let lines: Vec<&str> = match lines.iter().rposition(|line| !line.trim().is_empty()) {
            Some(last) => lines[..=last].to_vec(),
            None => return Err(LevelError::Empty),
        };

        let mut player = None;
        let mut ghosts: [Option<Position>; GHOST_COUNT] = [None; GHOST_COUNT];
        let mut rows = Vec::with_capacity(lines.len());
        for (y, line) in lines.iter().enumerate() {
            let mut row = Vec::with_capacity(line.len());
            for (x, symbol) in line.chars().enumerate() {
                let pos = Position::new(x, y);
                let tile = match symbol {
                    '#' => Tile::Wall(WallKind::Horizontal),
                    '.' => Tile::Pellet,
                    'o' => Tile::PowerPellet,
                    ' ' => Tile::Empty,
                    '-' => Tile::Gate,
                    'S' => {
                        if player.replace(pos).is_some() {
                            return Err(LevelError::DuplicateSpawn(symbol));
                        }
                        Tile::Empty
                    }
                    '0'..='3' => {
                        let index = symbol as usize - '0' as usize;
                        if ghosts[index].replace(pos).is_some() {
                            return Err(LevelError::DuplicateSpawn(symbol));
                        }
                        Tile::Empty
                    }
                    _ => return Err(LevelError::UnknownSymbol { symbol, x, y }),
                };
                row.push(tile);
            }
            rows.push(row);
        }

        let player = player.ok_or(LevelError::MissingSpawn('S'))?;
        let mut ghost_spawns = [player; GHOST_COUNT];
        for (index, spawn) in ghosts.iter().enumerate() {
            ghost_spawns[index] =
                spawn.ok_or(LevelError::MissingSpawn((b'0' + index as u8) as char))?;
        }

        Ok(Level::new(
            Grid::from_rows(rows)?,
            Spawns {
                player,
                ghosts: ghost_spawns,
            },
        ))
    }
}

/// Assigns every wall tile a sub-kind from its wall neighbours.
pub fn classify_walls(tiles: &mut Grid<Tile>) {
    let snapshot = tiles.clone();
    let is_wall = |position: Position, direction: Direction| {
        snapshot
            .neighbor(position, direction)
            .is_some_and(|n| snapshot[n].is_wall())
    };
    for (position, tile) in tiles.enumerate_mut() {
        if tile.is_wall() {
            *tile = Tile::Wall(WallKind::classify(
                is_wall(position, Direction::North),
                is_wall(position, Direction::South),
                is_wall(position, Direction::East),
                is_wall(position, Direction::West),
            ));
        }
    }
}

fn choose_spawns(
    tiles: &Grid<Tile>,
    house: Option<&GhostHouse>,
    rng: &mut impl Rng,
) -> Result<Spawns, LevelError> {
    let floor: Vec<Position> = tiles
        .enumerate()
        .filter(|(pos, tile)| tile.is_walkable() && !house.is_some_and(|h| h.contains(*pos)))
        .map(|(pos, _)| pos)
        .collect();
    if floor.is_empty() {
        return Err(LevelError::NoFloor);
    }

    let (mid_x, mid_y) = (tiles.width() / 2, tiles.height() / 2);
    let bottom: Vec<Position> = floor.iter().copied().filter(|p| p.y >= mid_y).collect();
    let player_pool = if bottom.is_empty() { &floor } else { &bottom };
    let player = *player_pool.choose(rng).ok_or(LevelError::NoFloor)?;

    if let Some(house) = house {
        if let Some(doorstep) = house.doorstep().filter(|p| tiles.contains(*p)) {
            let interior = house.interior();
            let row = house.center(1.0).y.floor() as usize;
            let mut in_row: Vec<Position> =
                interior.iter().copied().filter(|p| p.y == row).collect();
            if in_row.is_empty() {
                in_row = interior.to_vec();
            }
            in_row.sort_by_key(|p| (p.x, p.y));
            let pick = |fraction: usize| in_row[(in_row.len() - 1) * fraction / 2];
            return Ok(Spawns {
                player,
                ghosts: [doorstep, pick(0), pick(1), pick(2)],
            });
        }
    }

    // One ghost per quadrant: top-left, top-right, bottom-right, bottom-left.
    let quadrant = |right: bool, lower: bool| -> Vec<Position> {
        floor
            .iter()
            .copied()
            .filter(|p| (p.x >= mid_x) == right && (p.y >= mid_y) == lower)
            .collect()
    };
    let mut quadrants = [
        quadrant(false, false),
        quadrant(true, false),
        quadrant(true, true),
        quadrant(false, true),
    ];
    if quadrants.iter().any(Vec::is_empty) {
        quadrants = [floor.clone(), floor.clone(), floor.clone(), floor.clone()];
    }

    let separation = |a: Position, b: Position| {
        let (dx, dy) = (a.x as f32 - b.x as f32, a.y as f32 - b.y as f32);
        (dx * dx + dy * dy).sqrt()
    };
    let mut placed = vec![player];
    let mut ghosts = [player; GHOST_COUNT];
    for (index, pool) in quadrants.iter().enumerate() {
        let mut chosen = None;
        for _ in 0..SPAWN_ATTEMPTS {
            let candidate = *pool.choose(rng).ok_or(LevelError::NoFloor)?;
            if placed
                .iter()
                .all(|other| separation(candidate, *other) > MIN_SPAWN_SEPARATION)
            {
                chosen = Some(candidate);
                break;
            }
        }
        let spawn = match chosen {
            Some(spawn) => spawn,
            None => *pool.choose(rng).ok_or(LevelError::NoFloor)?,
        };
        ghosts[index] = spawn;
        placed.push(spawn);
    }

    Ok(Spawns { player, ghosts })
}
