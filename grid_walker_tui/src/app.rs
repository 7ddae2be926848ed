use grid_walker_core::simulation::{SimError, Simulation, StepOutcome};
use ratatui::crossterm::event::KeyCode;
use tracing::warn;

/// Front-end state wrapped around a simulation.
pub struct App {
    /// The core simulation.
    pub simulation: Simulation,
    /// Step cap; stepping stops once the history is this long.
    pub max_steps: usize,
    /// Whether ticks advance the simulation on their own.
    pub autoplay: bool,
    /// Highlighted history entry.
    pub selected: usize,
    /// Last message shown in the status panel.
    pub status: String,
    /// Flag to control the main loop.
    pub should_quit: bool,
}

impl App {
    pub fn new(simulation: Simulation, max_steps: usize) -> Self {
        App {
            simulation,
            max_steps,
            autoplay: false,
            selected: 0,
            status: "Ready.".to_string(),
            should_quit: false,
        }
    }

    /// Handles one step of the simulation.
    pub fn step(&mut self) {
        let taken = self.simulation.history().len() - 1;
        if taken >= self.max_steps && self.simulation.outcome().is_none() {
            self.autoplay = false;
            self.status = format!("Step cap of {} reached.", self.max_steps);
            return;
        }
        match self.simulation.step() {
            Ok(StepOutcome::Advanced) => self.status = format!("Step {}.", taken + 1),
            Ok(StepOutcome::Arrived) => {
                self.autoplay = false;
                self.status = "Target reached.".to_string();
            }
            Ok(StepOutcome::Looped) => {
                self.autoplay = false;
                self.status = "LOOP: the agent is stuck.".to_string();
            }
            Err(err) => {
                self.autoplay = false;
                self.status = format!("Error: {err}");
            }
        }
        self.selected = self.simulation.history().len() - 1;
    }

    /// Called on every timer tick.
    pub fn tick(&mut self) {
        if self.autoplay {
            self.step();
        }
    }

    /// Rewinds by one step.
    pub fn step_back(&mut self) {
        let len = self.simulation.history().len();
        if len > 1 {
            self.jump_to(len - 2);
        }
    }

    pub fn jump_to(&mut self, index: usize) {
        match self.simulation.jump_to(index) {
            Ok(()) if index == 0 => self.status = "Back at game start.".to_string(),
            Ok(()) => self.status = format!("Back at move #{index}."),
            Err(err) => self.status = format!("Error: {err}"),
        }
        self.selected = self.simulation.history().len() - 1;
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        let last = self.simulation.history().len() - 1;
        self.selected = (self.selected + 1).min(last);
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            KeyCode::Char('n') | KeyCode::Char(' ') | KeyCode::Right => self.step(),
            KeyCode::Char('p') => {
                self.autoplay = !self.autoplay && self.simulation.outcome().is_none();
            }
            KeyCode::Left => self.step_back(),
            KeyCode::Up => self.select_previous(),
            KeyCode::Down => self.select_next(),
            KeyCode::Enter => self.jump_to(self.selected),
            _ => {}
        }
    }

    /// Sets the quit flag.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

/// Runs `simulation` to completion and renders the result: one instruction
/// per line, or `LOOP` if the agent got stuck.
pub fn trajectory_report(
    simulation: &mut Simulation,
    max_steps: usize,
) -> Result<String, SimError> {
    let outcome = simulation.run(max_steps)?;
    if outcome == StepOutcome::Looped {
        return Ok("LOOP\n".to_string());
    }
    if outcome == StepOutcome::Advanced {
        warn!(max_steps, "step cap reached before the run finished");
    }
    Ok(simulation
        .agent()
        .instructions
        .iter()
        .map(|direction| format!("{direction}\n"))
        .collect())
}
