use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::{Direction, Position};

/// Errors raised by checked grid access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Coordinates ({x}, {y}) are out of bounds for grid size ({width}, {height})")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// A rectangular grid of `T` stored row-major in a flat vector.
///
/// Dimensions are fixed at construction; every in-bounds coordinate maps
/// to exactly one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a grid filled with `value`.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn filled(width: usize, height: usize, value: T) -> Self
    where
        T: Clone,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        Grid {
            width,
            height,
            cells: vec![value; size],
        }
    }

    /// Creates a grid whose cells are produced by `f(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn from_generator<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        let mut cells = Vec::with_capacity(size);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Grid {
            width,
            height,
            cells,
        }
    }

    /// Builds a grid from nested rows. All rows must share the first row's length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, GridError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(width * height);
        for (row, cells_in_row) in rows.into_iter().enumerate() {
            if cells_in_row.len() != width {
                return Err(GridError::RaggedRow {
                    row,
                    expected: width,
                    found: cells_in_row.len(),
                });
            }
            cells.extend(cells_in_row);
        }
        Ok(Grid {
            width,
            height,
            cells,
        })
    }

    /// Copies the grid out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<T>>
    where
        T: Clone,
    {
        if self.width == 0 {
            return vec![Vec::new(); self.height];
        }
        self.cells.chunks(self.width).map(<[T]>::to_vec).collect()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn coords_to_index(&self, x: usize, y: usize) -> Option<usize> {
        self.is_valid(x, y).then(|| y * self.width + x)
    }

    #[inline]
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    pub fn contains(&self, position: Position) -> bool {
        self.is_valid(position.x, position.y)
    }

    /// Returns `None` if the coordinates are out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        let index = self.coords_to_index(x, y)?;
        self.cells.get(index)
    }

    /// Checked access that reports the offending coordinate.
    pub fn try_get(&self, x: usize, y: usize) -> Result<&T, GridError> {
        let index = self.coords_to_index(x, y).ok_or(self.out_of_bounds(x, y))?;
        Ok(&self.cells[index])
    }

    /// Sets the value of the cell at the given coordinates.
    pub fn set(&mut self, x: usize, y: usize, value: T) -> Result<(), GridError> {
        let index = self.coords_to_index(x, y).ok_or(self.out_of_bounds(x, y))?;
        self.cells[index] = value;
        Ok(())
    }

    /// The in-bounds neighbour of `position` in `direction`.
    pub fn neighbor(&self, position: Position, direction: Direction) -> Option<Position> {
        position.step(direction).filter(|p| self.contains(*p))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    /// Yields `(Position, &T)` for each cell in row-major order.
    pub fn enumerate(&self) -> impl Iterator<Item = (Position, &T)> {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (Position::new(index % width, index / width), cell))
    }

    /// Yields `(Position, &mut T)` for each cell in row-major order.
    pub fn enumerate_mut(&mut self) -> impl Iterator<Item = (Position, &mut T)> {
        let width = self.width;
        self.cells
            .iter_mut()
            .enumerate()
            .map(move |(index, cell)| (Position::new(index % width, index / width), cell))
    }

    fn out_of_bounds(&self, x: usize, y: usize) -> GridError {
        GridError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        }
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        match self.coords_to_index(x, y) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                x, y, self.width, self.height
            ),
        }
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        let (width, height) = (self.width, self.height);
        match self.coords_to_index(x, y) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                x, y, width, height
            ),
        }
    }
}

impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Position) -> &Self::Output {
        &self[(index.x, index.y)]
    }
}

impl<T> IndexMut<Position> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, index: Position) -> &mut Self::Output {
        &mut self[(index.x, index.y)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_round_trip_preserves_layout() {
        let grid = Grid::from_generator(3, 2, |x, y| x + 10 * y);
        assert_eq!(grid.to_rows(), vec![vec![0, 1, 2], vec![10, 11, 12]]);
        assert_eq!(Grid::from_rows(grid.to_rows()).unwrap(), grid);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Grid::from_rows(vec![vec![1, 2], vec![3]]).unwrap_err();
        assert_eq!(
            err,
            GridError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn checked_access_reports_bounds() {
        let mut grid = Grid::filled(2, 2, 0u8);
        assert!(grid.get(2, 0).is_none());
        assert_eq!(
            grid.set(0, 5, 1),
            Err(GridError::OutOfBounds {
                x: 0,
                y: 5,
                width: 2,
                height: 2
            })
        );
        grid.set(1, 1, 7).unwrap();
        assert_eq!(grid[Position::new(1, 1)], 7);
    }

    #[test]
    fn neighbor_stays_inside() {
        let grid = Grid::filled(3, 3, ());
        let corner = Position::new(0, 0);
        assert_eq!(grid.neighbor(corner, Direction::West), None);
        assert_eq!(grid.neighbor(corner, Direction::North), None);
        assert_eq!(
            grid.neighbor(corner, Direction::East),
            Some(Position::new(1, 0))
        );
        assert_eq!(grid.neighbor(Position::new(2, 2), Direction::South), None);
    }

    #[test]
    #[should_panic]
    fn indexing_out_of_bounds_panics() {
        let grid = Grid::filled(2, 2, 0u8);
        let _ = grid[(2, 2)];
    }
}
