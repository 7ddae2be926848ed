use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    Position,
    map::{Grid, GridError},
    rules::Cell,
};

/// Teleporter positions, in row-major order.
///
/// Teleporters are paired consecutively: the first with the second, the third
/// with the fourth, and so on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeleportSet {
    positions: Vec<Position>,
}

impl TeleportSet {
    /// Collects every teleporter cell of `grid`.
    pub fn from_grid(grid: &Grid<Cell>) -> Self {
        let positions = grid
            .enumerate()
            .filter(|(_, cell)| **cell == Cell::Teleporter)
            .map(|(position, _)| position)
            .collect();
        TeleportSet { positions }
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Where an agent entering the teleporter at `entry` comes out.
    ///
    /// Returns `None` if `entry` is not a teleporter or has no partner.
    pub fn partner(&self, entry: Position) -> Option<Position> {
        let index = self.positions.iter().position(|p| *p == entry)?;
        self.positions.get(index ^ 1).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Level text is empty.")]
    Empty,
    #[error("Invalid header '{0}': expected two positive integers 'L C'.")]
    InvalidHeader(String),
    #[error("Expected {expected} rows, found {found}.")]
    RowCount { expected: usize, found: usize },
    #[error("Row {row} has {found} cells, expected at most {expected}.")]
    RowTooLong {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("No start position ('@') found in level.")]
    MissingStart,
    #[error("Multiple start positions ('@') found: {first} and {second}.")]
    MultipleStarts { first: Position, second: Position },
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// A parsed level: the grid, where the agent starts, and the teleporters.
///
/// Only built through [`parse_level`], [`Level::from_rows`] or
/// [`Level::from_grid`], so the start always lies on a start marker inside the
/// grid.
///
/// ```compile_fail
/// use grid_walker_core::{Position, environment::{Level, TeleportSet}, map::Grid, rules::Cell};
///
/// let level = Level {
///     grid: Grid::from_generator(1, 1, |_| Cell::Blank),
///     start: Position::new(9, 9),
///     teleports: TeleportSet::default(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub(crate) grid: Grid<Cell>,
    pub(crate) start: Position,
    pub(crate) teleports: TeleportSet,
}

impl Level {
    pub fn grid(&self) -> &Grid<Cell> {
        &self.grid
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn teleports(&self) -> &TeleportSet {
        &self.teleports
    }

    /// Builds a level from plain rows, one character per cell.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Level, ParseError> {
        let cells: Vec<Vec<Cell>> = rows
            .iter()
            .map(|row| row.as_ref().chars().map(Cell::from_symbol).collect())
            .collect();
        Level::from_grid(Grid::from_rows(cells)?)
    }

    /// Locates the single start marker and the teleporters of `grid`.
    pub fn from_grid(grid: Grid<Cell>) -> Result<Level, ParseError> {
        let mut start: Option<Position> = None;
        for (position, cell) in grid.enumerate() {
            if *cell == Cell::Start {
                if let Some(first) = start {
                    return Err(ParseError::MultipleStarts {
                        first,
                        second: position,
                    });
                }
                start = Some(position);
            }
        }
        let start = start.ok_or(ParseError::MissingStart)?;

        let teleports = TeleportSet::from_grid(&grid);
        if teleports.len() % 2 == 1 {
            warn!(
                teleporters = teleports.len(),
                "level has an unpaired teleporter"
            );
        }

        Ok(Level {
            grid,
            start,
            teleports,
        })
    }
}

/// Parses a level from its text form.
///
/// The first non-empty line holds the row and column counts `L C`. The next
/// `L` lines are the rows, where only every other character is read (columns
/// 0, 2, 4, ...). Short rows are padded with blanks.
pub fn parse_level(text: &str) -> Result<Level, ParseError> {
    let mut lines = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .skip_while(|line| line.trim().is_empty());
    let header = lines.next().ok_or(ParseError::Empty)?;
    let (rows, cols) = parse_header(header)?;

    let mut cells: Vec<Vec<Cell>> = Vec::with_capacity(rows);
    for line in lines.by_ref().take(rows) {
        let mut row: Vec<Cell> = line.chars().step_by(2).map(Cell::from_symbol).collect();
        if row.len() > cols {
            return Err(ParseError::RowTooLong {
                row: cells.len(),
                expected: cols,
                found: row.len(),
            });
        }
        row.resize(cols, Cell::Blank);
        cells.push(row);
    }

    let extra = lines.filter(|line| !line.trim().is_empty()).count();
    if cells.len() != rows || extra > 0 {
        return Err(ParseError::RowCount {
            expected: rows,
            found: cells.len() + extra,
        });
    }

    Level::from_grid(Grid::from_rows(cells)?)
}

fn parse_header(header: &str) -> Result<(usize, usize), ParseError> {
    let invalid = || ParseError::InvalidHeader(header.trim().to_string());
    let numbers = header
        .split_whitespace()
        .map(|token| token.parse::<usize>().map_err(|_| invalid()))
        .collect::<Result<Vec<usize>, _>>()?;
    match numbers.as_slice() {
        [rows, cols] if *rows > 0 && *cols > 0 => Ok((*rows, *cols)),
        _ => Err(invalid()),
    }
}
