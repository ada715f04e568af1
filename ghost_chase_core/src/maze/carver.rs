use rand::{Rng, seq::SliceRandom};

use crate::{Direction, Position, config::ConfigError, map::Grid};

use super::{CellMaze, MazeEdge, disjoint_set::DisjointSet};

/// Outcome of one carving step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarveStep {
    /// The wall joined two components and was removed.
    Opened(MazeEdge),
    /// Both sides were already connected; the wall stays.
    Skipped(MazeEdge),
    Done,
}

/// Resumable randomized-Kruskal carving.
///
/// Each [`MazeCarver::step`] examines one candidate wall, so a renderer can
/// show the maze between calls via [`MazeCarver::maze`].
#[derive(Debug, Clone)]
pub struct MazeCarver {
    maze: CellMaze,
    sets: DisjointSet,
    candidates: Vec<MazeEdge>,
    cursor: usize,
}

impl MazeCarver {
    /// Sets up a `rows x cols` grid of closed cells and shuffles every
    /// interior wall (south and east sides only) with `rng`.
    pub fn new(rows: usize, cols: usize, rng: &mut impl Rng) -> Result<Self, ConfigError> {
        if rows == 0 || cols == 0 {
            return Err(ConfigError::EmptyMaze { rows, cols });
        }

        let mut candidates = Vec::with_capacity(2 * rows * cols);
        for y in 0..rows {
            for x in 0..cols {
                if y + 1 < rows {
                    candidates.push(MazeEdge {
                        cell: Position::new(x, y),
                        direction: Direction::South,
                    });
                }
            }
        }
        for y in 0..rows {
            for x in 0..cols {
                if x + 1 < cols {
                    candidates.push(MazeEdge {
                        cell: Position::new(x, y),
                        direction: Direction::East,
                    });
                }
            }
        }
        candidates.shuffle(rng);

        Ok(MazeCarver {
            maze: CellMaze::closed(Grid::filled(cols, rows, super::IN)),
            sets: DisjointSet::new(rows * cols),
            candidates,
            cursor: 0,
        })
    }

    pub fn step(&mut self) -> CarveStep {
        let Some(edge) = self.candidates.get(self.cursor).copied() else {
            return CarveStep::Done;
        };
        self.cursor += 1;

        let cols = self.maze.cols();
        let here = edge.cell;
        let there = edge.far_cell();
        if self.sets.union(here.y * cols + here.x, there.y * cols + there.x) {
            self.maze.open(edge);
            CarveStep::Opened(edge)
        } else {
            CarveStep::Skipped(edge)
        }
    }

    /// Walls examined so far and the total.
    pub fn progress(&self) -> (usize, usize) {
        (self.cursor, self.candidates.len())
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.candidates.len()
    }

    pub fn maze(&self) -> &CellMaze {
        &self.maze
    }

    /// Runs any remaining steps and hands over the finished maze.
    pub fn finish(mut self) -> CellMaze {
        while self.step() != CarveStep::Done {}
        self.maze
    }
}
