//! The rule table: what happens when the agent tries to step from one cell onto another.

use serde::{Deserialize, Serialize};

use crate::Direction;

/// Content of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Blank,
    /// Never passable.
    Wall,
    /// Passable only while boosted, and destroyed on passage.
    Blocker,
    Start,
    Target,
    Teleporter,
    /// Turns the agent to face the given direction.
    Redirect(Direction),
    /// Reverses the look-around priorities.
    Inverter,
    BoostToggle,
    /// A symbol no rule knows about.
    Unknown(char),
}

impl Cell {
    pub fn from_symbol(symbol: char) -> Self {
        match symbol {
            ' ' => Cell::Blank,
            '#' => Cell::Wall,
            'X' => Cell::Blocker,
            '@' => Cell::Start,
            '$' => Cell::Target,
            'T' => Cell::Teleporter,
            'I' => Cell::Inverter,
            'B' => Cell::BoostToggle,
            other => match Direction::from_symbol(other) {
                Some(direction) => Cell::Redirect(direction),
                None => Cell::Unknown(other),
            },
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Cell::Blank => ' ',
            Cell::Wall => '#',
            Cell::Blocker => 'X',
            Cell::Start => '@',
            Cell::Target => '$',
            Cell::Teleporter => 'T',
            Cell::Redirect(direction) => direction.symbol(),
            Cell::Inverter => 'I',
            Cell::BoostToggle => 'B',
            Cell::Unknown(symbol) => symbol,
        }
    }

    /// Whether look-around may pick this cell as a destination.
    pub fn is_passable(self, is_boost: bool) -> bool {
        match self {
            Cell::Blank
            | Cell::Start
            | Cell::Target
            | Cell::Teleporter
            | Cell::Redirect(_)
            | Cell::Inverter
            | Cell::BoostToggle => true,
            Cell::Blocker => is_boost,
            Cell::Wall | Cell::Unknown(_) => false,
        }
    }
}

/// An effect emitted by [`decide`], executed by the step engine in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Record the current direction and occupy the candidate cell.
    Move,
    /// Blank the candidate cell.
    DeleteBlocker,
    /// Record the current direction and jump to the partner of the candidate teleporter.
    Teleport,
    ChangeDirection(Direction),
    /// Reverse the priority order.
    Reverse,
    /// Flip the boost flag.
    Boost,
    /// The candidate cannot be entered; fall back to look-around.
    Impossible,
    /// The agent faces the grid edge; look around.
    LookAround,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no rule for stepping from {current:?} onto {next:?} (boost: {is_boost})")]
pub struct UnknownTransition {
    pub current: Cell,
    /// `None` when the agent faces the grid edge.
    pub next: Option<Cell>,
    pub is_boost: bool,
}

/// Decides the commands for stepping from `current` onto `next`.
///
/// `next` is `None` when the candidate position equals the current one, i.e.
/// the agent faces the edge of the grid. Only the two symbols and the boost
/// flag are consulted.
pub fn decide(
    current: Cell,
    next: Option<Cell>,
    is_boost: bool,
) -> Result<Vec<Command>, UnknownTransition> {
    let commands = match (current, next, is_boost) {
        (Cell::Unknown(_), _, _) | (_, Some(Cell::Unknown(_)), _) => {
            return Err(UnknownTransition {
                current,
                next,
                is_boost,
            });
        }
        (_, None, _) => vec![Command::LookAround],
        (_, Some(Cell::Blank | Cell::Target | Cell::Start), _) => vec![Command::Move],
        (_, Some(Cell::Blocker), false) | (_, Some(Cell::Wall), _) => vec![Command::Impossible],
        (_, Some(Cell::Blocker), true) => vec![Command::DeleteBlocker, Command::Move],
        (_, Some(Cell::Teleporter), _) => vec![Command::Teleport],
        (_, Some(Cell::Redirect(direction)), _) => vec![Command::ChangeDirection(direction)],
        (_, Some(Cell::Inverter), _) => vec![Command::Reverse],
        (_, Some(Cell::BoostToggle), _) => vec![Command::Boost],
    };
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_map_to_cells() {
        let row = " #X@$TNSEWIB?";
        let cells: Vec<Cell> = row.chars().map(Cell::from_symbol).collect();
        assert_eq!(
            cells,
            [
                Cell::Blank,
                Cell::Wall,
                Cell::Blocker,
                Cell::Start,
                Cell::Target,
                Cell::Teleporter,
                Cell::Redirect(Direction::North),
                Cell::Redirect(Direction::South),
                Cell::Redirect(Direction::East),
                Cell::Redirect(Direction::West),
                Cell::Inverter,
                Cell::BoostToggle,
                Cell::Unknown('?'),
            ]
        );
        let back: String = cells.iter().map(|c| c.symbol()).collect();
        assert_eq!(back, row);
    }

    #[test]
    fn open_cells_are_plain_moves() {
        for next in [Cell::Blank, Cell::Target, Cell::Start] {
            for is_boost in [false, true] {
                assert_eq!(decide(Cell::Blank, Some(next), is_boost), Ok(vec![Command::Move]));
            }
        }
    }

    #[test]
    fn blocker_depends_on_boost() {
        assert_eq!(
            decide(Cell::Start, Some(Cell::Blocker), false),
            Ok(vec![Command::Impossible])
        );
        assert_eq!(
            decide(Cell::Start, Some(Cell::Blocker), true),
            Ok(vec![Command::DeleteBlocker, Command::Move])
        );
    }

    #[test]
    fn wall_is_impossible_even_boosted() {
        assert_eq!(decide(Cell::Blank, Some(Cell::Wall), true), Ok(vec![Command::Impossible]));
    }

    #[test]
    fn markers_emit_their_single_effect() {
        assert_eq!(decide(Cell::Blank, Some(Cell::Teleporter), false), Ok(vec![Command::Teleport]));
        assert_eq!(
            decide(Cell::Blank, Some(Cell::Redirect(Direction::West)), false),
            Ok(vec![Command::ChangeDirection(Direction::West)])
        );
        assert_eq!(decide(Cell::Blank, Some(Cell::Inverter), true), Ok(vec![Command::Reverse]));
        assert_eq!(decide(Cell::Blank, Some(Cell::BoostToggle), true), Ok(vec![Command::Boost]));
    }

    #[test]
    fn edge_means_look_around() {
        for current in [Cell::Start, Cell::Blank, Cell::Teleporter] {
            assert_eq!(decide(current, None, false), Ok(vec![Command::LookAround]));
        }
    }

    #[test]
    fn unknown_symbols_have_no_rule() {
        let err = decide(Cell::Blank, Some(Cell::Unknown('?')), false).unwrap_err();
        assert_eq!(err.next, Some(Cell::Unknown('?')));
        assert!(decide(Cell::Unknown('*'), None, true).is_err());
    }

    #[test]
    fn passability() {
        assert!(Cell::Blank.is_passable(false));
        assert!(Cell::Teleporter.is_passable(false));
        assert!(!Cell::Blocker.is_passable(false));
        assert!(Cell::Blocker.is_passable(true));
        assert!(!Cell::Wall.is_passable(true));
        assert!(!Cell::Unknown('?').is_passable(true));
    }
}
