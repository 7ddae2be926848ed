//! The step engine: turns rule-table verdicts into agent and grid updates,
//! keeps the history, and detects when the run is over.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::{
    Direction, Position,
    agent::{AgentState, Priorities},
    config::SimConfig,
    environment::{Level, TeleportSet},
    map::{Grid, GridError},
    rules::{self, Cell, Command, UnknownTransition},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    OutOfBounds(#[from] GridError),
    #[error("Teleporter at {entry} has no partner ({teleports} teleporters in the level)")]
    UnresolvedTeleport { entry: Position, teleports: usize },
    #[error(transparent)]
    UnknownTransition(#[from] UnknownTransition),
    #[error("No snapshot {index} in a history of {len}")]
    NoSuchSnapshot { index: usize, len: usize },
}

/// How a step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    Advanced,
    /// The agent is stuck; nothing more will happen.
    Looped,
    /// The agent stands on the target.
    Arrived,
}

impl StepOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, StepOutcome::Advanced)
    }
}

/// A staged step, not yet applied to the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Advanced {
        agent: AgentState,
        /// Blocker cells the step destroys.
        destroyed: Vec<Position>,
    },
    Looped,
}

/// One history entry: the agent after a step and the blockers that step destroyed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub agent: AgentState,
    pub destroyed: Vec<Position>,
}

/// Finds a way out when the agent cannot continue straight ahead.
///
/// Tries each direction of `priorities` in order and returns the first whose
/// neighbor is inside the grid, not yet visited, and passable.
pub fn look_around(
    priorities: &Priorities,
    position: Position,
    grid: &Grid<Cell>,
    is_boost: bool,
    visited: &HashSet<Position>,
) -> Option<(Direction, Position)> {
    priorities.iter().find_map(|direction| {
        let neighbor = grid.neighbor(position, direction);
        let usable = neighbor != position
            && !visited.contains(&neighbor)
            && grid.get(neighbor).is_ok_and(|cell| cell.is_passable(is_boost));
        trace!(%direction, %neighbor, usable, "look around");
        usable.then_some((direction, neighbor))
    })
}

/// Computes the effect of one step without touching `agent` or `grid`.
pub fn evaluate_step(
    agent: &AgentState,
    grid: &Grid<Cell>,
    teleports: &TeleportSet,
) -> Result<Transition, SimError> {
    let current = *grid.get(agent.position)?;
    let candidate = grid.neighbor(agent.position, agent.direction);
    let next = if candidate == agent.position {
        None
    } else {
        Some(*grid.get(candidate)?)
    };
    let commands = rules::decide(current, next, agent.is_boost)?;
    debug!(
        position = %agent.position,
        direction = %agent.direction,
        %candidate,
        ?commands,
        "step"
    );

    let mut staged = agent.clone();
    let mut destroyed = Vec::new();
    for command in commands {
        match command {
            Command::Move => staged.advance_to(candidate),
            Command::DeleteBlocker => destroyed.push(candidate),
            Command::Teleport => {
                let exit = teleports
                    .partner(candidate)
                    .ok_or(SimError::UnresolvedTeleport {
                        entry: candidate,
                        teleports: teleports.len(),
                    })?;
                staged.advance_to(exit);
            }
            Command::ChangeDirection(direction) => staged.direction = direction,
            Command::Reverse => staged.priorities = staged.priorities.reversed(),
            Command::Boost => staged.is_boost = !staged.is_boost,
            Command::Impossible | Command::LookAround => {
                let Some((direction, target)) = look_around(
                    &staged.priorities,
                    staged.position,
                    grid,
                    staged.is_boost,
                    &staged.visited,
                ) else {
                    return Ok(Transition::Looped);
                };
                // Only reachable while boosted.
                if grid[target] == Cell::Blocker {
                    destroyed.push(target);
                }
                staged.direction = direction;
                staged.advance_to(target);
            }
        }
    }

    Ok(Transition::Advanced {
        agent: staged,
        destroyed,
    })
}

/// Everything that determines the rest of a run.
///
/// `visited` and the destroyed blockers only ever grow, so their sizes stand
/// in for their contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Fingerprint {
    position: Position,
    direction: Direction,
    is_boost: bool,
    priorities: Priorities,
    visited: usize,
    destroyed: usize,
}

impl Fingerprint {
    fn of(agent: &AgentState, destroyed: usize) -> Self {
        Fingerprint {
            position: agent.position,
            direction: agent.direction,
            is_boost: agent.is_boost,
            priorities: agent.priorities,
            visited: agent.visited.len(),
            destroyed,
        }
    }
}

/// A single run over one level.
///
/// Owns the grid, the agent and the history; [`Simulation::step`] advances by
/// one step and [`Simulation::jump_to`] rewinds.
#[derive(Debug, Clone)]
pub struct Simulation {
    grid: Grid<Cell>,
    teleports: TeleportSet,
    agent: AgentState,
    history: Vec<Snapshot>,
    seen: HashSet<Fingerprint>,
    destroyed_total: usize,
    detect_repeated_states: bool,
    finished: Option<StepOutcome>,
}

impl Simulation {
    pub fn new(level: Level, config: &SimConfig) -> Self {
        let mut agent = AgentState::new(level.start(), config.initial_direction, config.priorities);
        agent.is_boost = config.start_boosted;

        let mut simulation = Simulation {
            grid: level.grid,
            teleports: level.teleports,
            agent: agent.clone(),
            history: vec![Snapshot {
                agent,
                destroyed: Vec::new(),
            }],
            seen: HashSet::new(),
            destroyed_total: 0,
            detect_repeated_states: config.detect_repeated_states,
            finished: None,
        };
        simulation.rebuild_index();
        simulation
    }

    pub fn agent(&self) -> &AgentState {
        &self.agent
    }

    pub fn grid(&self) -> &Grid<Cell> {
        &self.grid
    }

    /// Snapshots of every committed step, starting with the initial state.
    pub fn history(&self) -> &[Snapshot] {
        &self.history
    }

    /// The terminal outcome, once the run is over.
    pub fn outcome(&self) -> Option<StepOutcome> {
        self.finished
    }

    /// Advances the run by one step.
    ///
    /// On error the simulation is left exactly as it was. Once the run is over
    /// every further call returns the same terminal outcome.
    pub fn step(&mut self) -> Result<StepOutcome, SimError> {
        if let Some(outcome) = self.finished {
            return Ok(outcome);
        }

        let (agent, destroyed) = match evaluate_step(&self.agent, &self.grid, &self.teleports)? {
            Transition::Looped => return Ok(self.finish(StepOutcome::Looped)),
            Transition::Advanced { agent, destroyed } => (agent, destroyed),
        };

        let destroyed_total = self.destroyed_total + destroyed.len();
        if self.detect_repeated_states
            && !self.seen.insert(Fingerprint::of(&agent, destroyed_total))
        {
            debug!(position = %agent.position, "state repeats");
            return Ok(self.finish(StepOutcome::Looped));
        }

        for position in &destroyed {
            self.grid.set(*position, Cell::Blank)?;
        }
        self.destroyed_total = destroyed_total;
        self.agent = agent;
        self.history.push(Snapshot {
            agent: self.agent.clone(),
            destroyed,
        });

        if self.grid[self.agent.position] == Cell::Target {
            return Ok(self.finish(StepOutcome::Arrived));
        }
        Ok(StepOutcome::Advanced)
    }

    /// Steps until the run is over or `max_steps` steps were taken, returning
    /// the last outcome.
    pub fn run(&mut self, max_steps: usize) -> Result<StepOutcome, SimError> {
        if let Some(outcome) = self.finished {
            return Ok(outcome);
        }
        let mut outcome = StepOutcome::Advanced;
        for _ in 0..max_steps {
            outcome = self.step()?;
            if outcome.is_terminal() {
                break;
            }
        }
        Ok(outcome)
    }

    /// Makes `history[index]` the current state and drops everything after it,
    /// including the blockers those later steps destroyed.
    pub fn jump_to(&mut self, index: usize) -> Result<(), SimError> {
        let len = self.history.len();
        if index >= len {
            return Err(SimError::NoSuchSnapshot { index, len });
        }

        let dropped = self.history.split_off(index + 1);
        for snapshot in dropped.iter().rev() {
            for position in &snapshot.destroyed {
                self.grid.set(*position, Cell::Blocker)?;
            }
        }
        self.agent = self.history[index].agent.clone();
        self.rebuild_index();
        info!(index, position = %self.agent.position, "jumped to snapshot");
        Ok(())
    }

    fn finish(&mut self, outcome: StepOutcome) -> StepOutcome {
        info!(
            ?outcome,
            position = %self.agent.position,
            instructions = self.agent.instructions.len(),
            "run finished"
        );
        self.finished = Some(outcome);
        outcome
    }

    /// Recomputes the fingerprint set and finished flag from the history.
    fn rebuild_index(&mut self) {
        self.seen.clear();
        self.destroyed_total = 0;
        for snapshot in &self.history {
            self.destroyed_total += snapshot.destroyed.len();
            self.seen
                .insert(Fingerprint::of(&snapshot.agent, self.destroyed_total));
        }
        self.finished =
            (self.grid[self.agent.position] == Cell::Target).then_some(StepOutcome::Arrived);
    }
}
