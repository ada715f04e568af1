use crate::{
    Direction,
    config::ConfigError,
    level::classify_walls,
    map::Grid,
    tile::{Tile, WallKind},
};

use super::CellMaze;

/// Scales every cell to a `scale x scale` block of tiles, `scale >= 2`.
///
/// The block center becomes a pellet, and each open side extends a run of
/// pellets from the center to the block edge. Everything else is wall.
pub fn rasterize(maze: &CellMaze, scale: usize) -> Result<Grid<Tile>, ConfigError> {
    super::check_scale(scale)?;

    let mut tiles = Grid::filled(
        maze.cols() * scale,
        maze.rows() * scale,
        Tile::Wall(WallKind::Horizontal),
    );
    let center = scale / 2;
    for y in 0..maze.rows() {
        for x in 0..maze.cols() {
            let cell = crate::Position::new(x, y);
            let (left, top) = (x * scale, y * scale);
            let (cx, cy) = (left + center, top + center);
            tiles[(cx, cy)] = Tile::Pellet;

            for direction in Direction::SCAN_ORDER {
                if !maze.is_open(cell, direction) {
                    continue;
                }
                match direction {
                    Direction::North => (top..cy).for_each(|ty| tiles[(cx, ty)] = Tile::Pellet),
                    Direction::South => {
                        (cy + 1..top + scale).for_each(|ty| tiles[(cx, ty)] = Tile::Pellet)
                    }
                    Direction::West => (left..cx).for_each(|tx| tiles[(tx, cy)] = Tile::Pellet),
                    Direction::East => {
                        (cx + 1..left + scale).for_each(|tx| tiles[(tx, cy)] = Tile::Pellet)
                    }
                }
            }
        }
    }

    classify_walls(&mut tiles);
    Ok(tiles)
}
