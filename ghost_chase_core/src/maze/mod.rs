//! Randomized spanning-tree mazes.
//!
//! A maze is carved over a grid of logical cells with randomized Kruskal
//! (shuffled walls + union-find), then rasterized into tiles. The result is
//! a perfect maze: `cells - 1` open edges, connected and acyclic.

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    Direction, Position,
    config::ConfigError,
    connectivity::{self, ConnectivityGrid},
    level::{Level, LevelError},
    map::Grid,
    tile::Tile,
};

mod carver;
mod disjoint_set;
mod raster;

pub use carver::{CarveStep, MazeCarver};
pub use disjoint_set::DisjointSet;
pub use raster::rasterize;

pub const DEFAULT_ROWS: usize = 10;
pub const DEFAULT_COLS: usize = 10;
pub const DEFAULT_SCALE: usize = 3;
/// Smallest block that still leaves a wall tile between neighbouring cells.
pub const MIN_SCALE: usize = 2;

pub(crate) const IN: u8 = connectivity::INSIDE;

/// A wall between `cell` and its neighbour in `direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MazeEdge {
    pub cell: Position,
    pub direction: Direction,
}

impl MazeEdge {
    /// The cell on the other side. Only south and east edges are produced,
    /// so this never underflows.
    pub fn far_cell(self) -> Position {
        let (dx, dy) = self.direction.delta();
        Position::new(
            self.cell.x.wrapping_add_signed(dx),
            self.cell.y.wrapping_add_signed(dy),
        )
    }
}

/// Rejects rasterization scales that cannot draw walls between cells.
pub fn check_scale(scale: usize) -> Result<(), ConfigError> {
    match scale {
        0 => Err(ConfigError::ZeroScale),
        s if s < MIN_SCALE => Err(ConfigError::InvalidValue {
            field: "scale",
            reason: format!("must be at least {MIN_SCALE}, got {s}"),
        }),
        _ => Ok(()),
    }
}

/// Logical cells with N/S/E/W open-edge masks (same bits as
/// [`ConnectivityGrid`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellMaze {
    cells: Grid<u8>,
    open_edges: Vec<MazeEdge>,
}

impl CellMaze {
    fn closed(cells: Grid<u8>) -> Self {
        CellMaze {
            cells,
            open_edges: Vec::new(),
        }
    }

    fn open(&mut self, edge: MazeEdge) {
        let far = edge.far_cell();
        self.cells[edge.cell] |= connectivity::direction_bit(edge.direction);
        self.cells[far] |= connectivity::direction_bit(edge.direction.opposite());
        self.open_edges.push(edge);
    }

    pub fn rows(&self) -> usize {
        self.cells.height()
    }

    pub fn cols(&self) -> usize {
        self.cells.width()
    }

    pub fn cell_count(&self) -> usize {
        self.rows() * self.cols()
    }

    pub fn mask(&self, cell: Position) -> u8 {
        self.cells.get(cell.x, cell.y).copied().unwrap_or(0)
    }

    pub fn is_open(&self, cell: Position, direction: Direction) -> bool {
        self.mask(cell) & connectivity::direction_bit(direction) != 0
    }

    /// Removed walls, in carving order.
    pub fn open_edges(&self) -> &[MazeEdge] {
        &self.open_edges
    }

    /// The cell graph as a searchable grid.
    pub fn connectivity(&self) -> ConnectivityGrid {
        ConnectivityGrid::from_masks(self.cells.clone())
    }
}

/// Carves a `rows x cols` maze. The same seed always yields the same maze.
pub fn generate(rows: usize, cols: usize, seed: u64) -> Result<CellMaze, ConfigError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let maze = MazeCarver::new(rows, cols, &mut rng)?.finish();
    debug!(rows, cols, seed, edges = maze.open_edges().len(), "maze carved");
    Ok(maze)
}

/// Carves, rasterizes and decorates a playable level.
///
/// The corner-most cell centers become power pellets and spawns are drawn
/// from the same seeded source, so one seed fixes the whole level.
pub fn generate_level(
    rows: usize,
    cols: usize,
    scale: usize,
    seed: u64,
) -> Result<Level, LevelError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let maze = MazeCarver::new(rows, cols, &mut rng)?.finish();
    let mut tiles = rasterize(&maze, scale)?;

    let center = scale / 2;
    for (x, y) in [(0, 0), (cols - 1, 0), (0, rows - 1), (cols - 1, rows - 1)] {
        tiles.set(x * scale + center, y * scale + center, Tile::PowerPellet)?;
    }

    let level = Level::from_tiles(tiles, &mut rng)?;
    info!(rows, cols, scale, seed, "generated level");
    Ok(level)
}
