use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Direction, ParseDirectionError, Position};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrioritiesError {
    #[error("priorities must list all four directions exactly once, got {0:?}")]
    NotAPermutation(Vec<Direction>),
    #[error(transparent)]
    Direction(#[from] ParseDirectionError),
}

/// The order in which look-around tries directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Direction>", into = "Vec<Direction>")]
pub struct Priorities([Direction; 4]);

impl Priorities {
    pub fn new(order: [Direction; 4]) -> Result<Self, PrioritiesError> {
        let distinct: HashSet<Direction> = order.iter().copied().collect();
        if distinct.len() == order.len() {
            Ok(Priorities(order))
        } else {
            Err(PrioritiesError::NotAPermutation(order.to_vec()))
        }
    }

    /// The same directions, last first.
    pub fn reversed(&self) -> Self {
        let mut order = self.0;
        order.reverse();
        Priorities(order)
    }

    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[Direction] {
        &self.0
    }
}

impl Default for Priorities {
    fn default() -> Self {
        Priorities([
            Direction::South,
            Direction::East,
            Direction::North,
            Direction::West,
        ])
    }
}

impl TryFrom<Vec<Direction>> for Priorities {
    type Error = PrioritiesError;

    fn try_from(order: Vec<Direction>) -> Result<Self, Self::Error> {
        let array: [Direction; 4] = order
            .clone()
            .try_into()
            .map_err(|_| PrioritiesError::NotAPermutation(order))?;
        Priorities::new(array)
    }
}

impl From<Priorities> for Vec<Direction> {
    fn from(priorities: Priorities) -> Self {
        priorities.0.to_vec()
    }
}

/// Parses `"SOUTH,EAST,NORTH,WEST"` or the compact `"SENW"`.
impl FromStr for Priorities {
    type Err = PrioritiesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let order = if s.contains(',') {
            s.split(',')
                .map(str::parse::<Direction>)
                .collect::<Result<Vec<Direction>, _>>()?
        } else {
            s.chars()
                .map(|c| c.to_string().parse::<Direction>())
                .collect::<Result<Vec<Direction>, _>>()?
        };
        Priorities::try_from(order)
    }
}

impl fmt::Display for Priorities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Direction::name).collect();
        f.write_str(&names.join(","))
    }
}

/// Holds the state of the walking agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    pub position: Position,
    pub direction: Direction,
    pub is_boost: bool,
    pub priorities: Priorities,
    /// Cells the agent has moved out of.
    pub visited: HashSet<Position>,
    /// One entry per move, the direction the agent was facing when it moved.
    pub instructions: Vec<Direction>,
}

impl AgentState {
    pub fn new(position: Position, direction: Direction, priorities: Priorities) -> Self {
        AgentState {
            position,
            direction,
            is_boost: false,
            priorities,
            visited: HashSet::new(),
            instructions: Vec::new(),
        }
    }

    /// Records a move in the current direction and relocates to `destination`.
    ///
    /// `destination` is the neighbor for a plain move, or the partner
    /// teleporter when teleporting.
    pub fn advance_to(&mut self, destination: Position) {
        self.instructions.push(self.direction);
        self.visited.insert(self.position);
        self.position = destination;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use Direction::*;

    #[test]
    fn priorities_must_be_a_permutation() {
        assert!(Priorities::new([North, South, East, West]).is_ok());
        assert_eq!(
            Priorities::new([North, North, East, West]),
            Err(PrioritiesError::NotAPermutation(vec![North, North, East, West]))
        );
        assert!(Priorities::try_from(vec![North, South, East]).is_err());
    }

    #[test]
    fn reversing_twice_is_identity() {
        let priorities = Priorities::default();
        assert_eq!(priorities.reversed().as_slice(), &[West, North, East, South]);
        assert_eq!(priorities.reversed().reversed(), priorities);
    }

    #[test]
    fn priorities_parse_from_names_or_letters() {
        assert_eq!("SENW".parse::<Priorities>(), Ok(Priorities::default()));
        assert_eq!(
            "south, east, north, west".parse::<Priorities>(),
            Ok(Priorities::default())
        );
        assert!("SENX".parse::<Priorities>().is_err());
        assert!("SSNW".parse::<Priorities>().is_err());
        assert_eq!(Priorities::default().to_string(), "SOUTH,EAST,NORTH,WEST");
    }

    #[test]
    fn advance_records_direction_and_visit() {
        let mut agent = AgentState::new(Position::new(0, 0), East, Priorities::default());
        agent.advance_to(Position::new(0, 1));
        agent.direction = South;
        agent.advance_to(Position::new(4, 4));

        assert_eq!(agent.position, Position::new(4, 4));
        assert_eq!(agent.instructions, [East, South]);
        assert!(agent.visited.contains(&Position::new(0, 0)));
        assert!(agent.visited.contains(&Position::new(0, 1)));
        assert!(!agent.visited.contains(&Position::new(4, 4)));
    }
}
