mod app;
mod logging;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use grid_walker_core::{
    Direction as Heading,
    agent::Priorities,
    config::SimConfig,
    environment::parse_level,
    rules::Cell,
    simulation::{Simulation, StepOutcome},
};
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    io::{self, Stdout},
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Level file to load
    #[arg(short, long, value_name = "LEVEL_FILE")]
    level: Option<PathBuf>,
    /// TOML file with simulation parameters
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,
    /// Initial facing direction, overrides the config file
    #[arg(short, long)]
    direction: Option<Heading>,
    /// Look-around priorities, e.g. SENW or SOUTH,EAST,NORTH,WEST
    #[arg(short, long)]
    priorities: Option<Priorities>,
    /// Start with boost active
    #[arg(short, long)]
    boost: bool,
    /// Maximum number of steps to take
    #[arg(long)]
    max_steps: Option<usize>,
    /// Auto-play interval in milliseconds
    #[arg(long, default_value_t = 250)]
    tick_ms: u64,
    /// Print the instructions and exit instead of opening the UI
    #[arg(long)]
    headless: bool,
}

impl Args {
    /// Loads the config file, if any, and applies command line overrides.
    fn sim_config(&self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::default(),
        };
        if let Some(direction) = self.direction {
            config.initial_direction = direction;
        }
        if let Some(priorities) = self.priorities {
            config.priorities = priorities;
        }
        if self.boost {
            config.start_boosted = true;
        }
        if let Some(max_steps) = self.max_steps {
            config.max_steps = max_steps;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    logging::init(if args.headless { "warn" } else { "off" });

    // If no level file is provided, use the default level
    let level_file = args
        .level
        .clone()
        .unwrap_or(PathBuf::from("levels/level01.txt"));
    if !level_file.exists() {
        return Err(anyhow::anyhow!(
            "Level file does not exist: {}",
            level_file.display()
        ));
    }

    let config = args.sim_config()?;
    let text = std::fs::read_to_string(&level_file)
        .with_context(|| format!("Failed to read level file {}", level_file.display()))?;
    let level = parse_level(&text)
        .with_context(|| format!("Failed to parse level file {}", level_file.display()))?;
    info!(
        level = %level_file.display(),
        rows = level.grid().rows(),
        cols = level.grid().cols(),
        teleporters = level.teleports().len(),
        "level loaded"
    );
    let mut simulation = Simulation::new(level, &config);

    if args.headless {
        let report = app::trajectory_report(&mut simulation, config.max_steps)?;
        print!("{report}");
        return Ok(());
    }

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    // Create the application state
    let mut app = App::new(simulation, config.max_steps);

    // Run the main application loop, restoring the terminal even if it fails
    let result = run_app(&mut terminal, &mut app, Duration::from_millis(args.tick_ms));
    restore_terminal(&mut terminal)?;

    result
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?; // Put terminal in raw mode
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?; // Use alternate screen and enable mouse capture
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into) // Map io::Error to anyhow::Error
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        // Draw the UI
        terminal.draw(|f| ui(f, app))?;

        // Calculate timeout for event polling
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        // Poll for events (keyboard, mouse, etc.)
        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        // Advance auto-play if enough time has passed
        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        // Exit loop if requested
        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(65), // Area for the board and history
            Constraint::Percentage(25), // Area for agent status
            Constraint::Percentage(10), // Area for help
        ])
        .split(frame.area());
    let top_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(main_layout[0]);

    render_board(frame, top_layout[0], &app.simulation);
    render_history(frame, top_layout[1], app);
    render_status(frame, main_layout[1], app);

    let help_text = Paragraph::new(
        "n/space/→ step   p auto-play   ← back   ↑/↓ select   Enter jump   q/Esc quit",
    )
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

/// Renders the grid with the agent on it.
fn render_board(frame: &mut Frame, area: Rect, simulation: &Simulation) {
    let grid = simulation.grid();
    let agent_position = simulation.agent().position;

    let mut lines: Vec<Line> = Vec::with_capacity(grid.rows());
    for row in 0..grid.rows() {
        let Some(cells) = grid.row(row) else {
            continue;
        };
        let spans: Vec<Span> = cells
            .iter()
            .enumerate()
            .map(|(col, cell)| {
                if agent_position.row == row && agent_position.col == col {
                    agent_span(*cell)
                } else {
                    Span::styled(cell.symbol().to_string(), cell_style(*cell))
                }
            })
            .collect();
        lines.push(Line::from(spans));
    }

    let board = Paragraph::new(lines)
        .block(Block::default().title("Board").borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(board, area);
}

fn agent_span(cell: Cell) -> Span<'static> {
    if cell == Cell::Target {
        Span::styled("$", Style::default().fg(Color::Black).bg(Color::Green).bold())
    } else {
        Span::styled("@", Style::default().fg(Color::Red).bold())
    }
}

fn cell_style(cell: Cell) -> Style {
    match cell {
        Cell::Wall => Style::default().fg(Color::DarkGray),
        Cell::Blocker => Style::default().fg(Color::Yellow),
        Cell::Target => Style::default().fg(Color::Green).bold(),
        Cell::Teleporter => Style::default().fg(Color::Magenta),
        Cell::Redirect(_) => Style::default().fg(Color::Cyan),
        Cell::Inverter => Style::default().fg(Color::Blue),
        Cell::BoostToggle => Style::default().fg(Color::LightRed),
        Cell::Unknown(_) => Style::default().fg(Color::Red).underlined(),
        Cell::Blank | Cell::Start => Style::default(),
    }
}

/// Renders the list of snapshots the user can jump back to.
fn render_history(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = (0..app.simulation.history().len())
        .map(|index| {
            let description = if index > 0 {
                format!("Go to move #{index}")
            } else {
                "Go to game start".to_string()
            };
            ListItem::new(description)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("History"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Renders direction, boost, priorities, outcome and instructions.
fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let agent = app.simulation.agent();
    let outcome = match app.simulation.outcome() {
        None if app.autoplay => "running",
        None => "paused",
        Some(StepOutcome::Arrived) => "arrived",
        Some(StepOutcome::Looped) => "LOOP",
        Some(StepOutcome::Advanced) => "advanced",
    };
    let instructions: Vec<&str> = agent.instructions.iter().map(|d| d.name()).collect();

    let text = vec![
        Line::from(format!(
            "Direction: {}   Boost: {}   Priorities: {}   Position: {}   State: {}",
            agent.direction, agent.is_boost, agent.priorities, agent.position, outcome
        )),
        Line::from(app.status.as_str()),
        Line::from(format!(
            "Instructions ({}): {}",
            instructions.len(),
            instructions.join(" ")
        )),
    ];
    let status = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Agent"));
    frame.render_widget(status, area);
}
