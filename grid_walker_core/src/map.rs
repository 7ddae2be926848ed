use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::{Direction, Position};

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Position ({row}, {col}) is out of bounds for grid size {rows}x{cols}")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("Row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// A fixed-shape 2D grid.
///
/// Stores elements of type `T` in a flat vector using row-major order. The
/// shape is set at construction and never changes; only individual cells can
/// be overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled by a generator function.
    ///
    /// The generator function `f` is called once per cell, in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize`.
    pub fn from_generator<F>(rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(Position) -> T,
    {
        let size = rows.checked_mul(cols).expect("Grid size overflow");
        let mut cells = Vec::with_capacity(size);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(f(Position { row, col }));
            }
        }
        Grid { rows, cols, cells }
    }

    /// Builds a grid from a list of rows, all of which must have the same length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, GridError> {
        let cols = rows.first().map_or(0, Vec::len);
        let height = rows.len();
        let mut cells = Vec::with_capacity(height * cols);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != cols {
                return Err(GridError::Ragged {
                    row,
                    expected: cols,
                    found: values.len(),
                });
            }
            cells.extend(values);
        }
        Ok(Grid {
            rows: height,
            cols,
            cells,
        })
    }

    /// Number of rows (L).
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (C).
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn contains(&self, position: Position) -> bool {
        position.row < self.rows && position.col < self.cols
    }

    #[inline]
    fn index_of(&self, position: Position) -> Result<usize, GridError> {
        if self.contains(position) {
            Ok(position.row * self.cols + position.col)
        } else {
            Err(GridError::OutOfBounds {
                row: position.row,
                col: position.col,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    /// Gets the cell at `position`, or `OutOfBounds`.
    pub fn get(&self, position: Position) -> Result<&T, GridError> {
        let index = self.index_of(position)?;
        Ok(&self.cells[index])
    }

    /// Overwrites the cell at `position`. This is the only mutation a grid allows.
    pub fn set(&mut self, position: Position, value: T) -> Result<(), GridError> {
        let index = self.index_of(position)?;
        self.cells[index] = value;
        Ok(())
    }

    /// Returns the neighbor of `position` in `direction`, or `position` itself
    /// when that step would leave the grid.
    pub fn neighbor(&self, position: Position, direction: Direction) -> Position {
        let Position { row, col } = position;
        match direction {
            Direction::South if row + 1 < self.rows => Position::new(row + 1, col),
            Direction::East if col + 1 < self.cols => Position::new(row, col + 1),
            Direction::North if row > 0 => Position::new(row - 1, col),
            Direction::West if col > 0 => Position::new(row, col - 1),
            _ => position,
        }
    }

    /// Returns one row as a slice, if it exists.
    pub fn row(&self, row: usize) -> Option<&[T]> {
        if row < self.rows {
            let start = row * self.cols;
            Some(&self.cells[start..start + self.cols])
        } else {
            None
        }
    }

    /// Returns an iterator that yields `(Position, &T)` for each cell.
    pub fn enumerate(&self) -> impl Iterator<Item = (Position, &T)> {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (Position::new(index / cols, index % cols), cell))
    }
}

/// Indexing using Position coordinates for access.
///
/// Panics when out of bounds; use [`Grid::get`] for a checked lookup.
impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, position: Position) -> &Self::Output {
        match self.index_of(position) {
            Ok(index) => &self.cells[index],
            Err(err) => panic!("{err}"),
        }
    }
}
