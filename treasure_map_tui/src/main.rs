use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::info;
use ratatui::{
    crossterm::{
        self,
        event::{self, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    ffi::OsString,
    fs,
    io::{self, Stdout},
    path::{Path, PathBuf},
    process::ExitCode,
    time::{Duration, Instant},
};
use treasure_map_core::{
    Orientation, Position, Terrain, parse,
    terrain::{BlockReason, CellType, MoveOutcome, RoundReport},
};

#[derive(Parser, Debug)]
#[command(version, about = "Runs treasure map simulations", long_about = None)]
struct Args {
    /// Terrain files to simulate
    #[arg(required = true, value_name = "MAP_FILE")]
    maps: Vec<PathBuf>,

    /// Extension appended to each map file name to build its result file
    #[arg(short, long, default_value = "result")]
    suffix: String,

    /// Print results on stdout instead of writing result files
    #[arg(long)]
    stdout: bool,

    /// Format of the results
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Animate the rounds in the terminal before saving the result
    #[arg(short, long)]
    watch: bool,

    /// Delay between two rounds in watch mode
    #[arg(long, value_name = "MILLISECONDS", default_value_t = 250)]
    tick_rate: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// The line format of the input files
    Text,
    /// A JSON snapshot of the final terrain
    Json,
}

struct App {
    /// The simulated terrain.
    terrain: Terrain,
    /// Name of the map, shown as the title.
    title: String,
    /// What happened during the last round played.
    last_round: Option<RoundReport>,
    /// Flag to control the main loop.
    should_quit: bool,
    /// Stops the rounds without leaving the viewer.
    paused: bool,
}

impl App {
    fn new(terrain: Terrain, title: String) -> Self {
        App {
            terrain,
            title,
            last_round: None,
            should_quit: false,
            paused: false,
        }
    }

    fn finished(&self) -> bool {
        !self.terrain.has_adventurers_to_move()
    }

    /// Plays one round of the simulation.
    fn tick(&mut self) -> Result<()> {
        if self.paused || self.finished() {
            return Ok(());
        }
        let report = self.terrain.play_round()?;
        self.last_round = Some(report);
        Ok(())
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let mut failures = 0;
    for map_file in &args.maps {
        if let Err(err) = process(map_file, &args) {
            eprintln!("{}: {err:#}", map_file.display());
            failures += 1;
        }
    }

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Simulates one map file and saves its result.
fn process(map_file: &Path, args: &Args) -> Result<()> {
    if !map_file.exists() {
        bail!("Map file does not exist: {}", map_file.display());
    }
    info!("Parsing file {}", map_file.display());

    let input = fs::read_to_string(map_file)
        .with_context(|| format!("while reading {}", map_file.display()))?;
    let mut terrain = parse(&input).context("while parsing terrain")?;

    if args.watch {
        terrain = watch(terrain, map_file, Duration::from_millis(args.tick_rate))?;
    }
    // Rounds left over by an early quit are played here.
    terrain.run().context("while running simulation")?;

    let output = render(&terrain, args.format)?;
    if args.stdout {
        print!("{output}");
    } else {
        let result_file = result_path(map_file, &args.suffix);
        fs::write(&result_file, output)
            .with_context(|| format!("while writing {}", result_file.display()))?;
        info!("Result written to {}", result_file.display());
    }
    Ok(())
}

fn render(terrain: &Terrain, format: Format) -> Result<String> {
    match format {
        Format::Text => Ok(terrain.to_result_string()),
        Format::Json => {
            let mut json = serde_json::to_string_pretty(&terrain.snapshot())
                .context("while serializing snapshot")?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// `maps/lara.txt` with suffix `result` gives `maps/lara.txt.result`.
fn result_path(map_file: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(map_file.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Shows the simulation round by round until it ends or the user quits.
fn watch(terrain: Terrain, map_file: &Path, tick_rate: Duration) -> Result<Terrain> {
    let title = map_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Treasure Map".to_string());
    let mut app = App::new(terrain, title);

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    // Restore the terminal before reporting any error from the loop
    let outcome = run_app(&mut terminal, &mut app, tick_rate);
    restore_terminal(&mut terminal)?;
    outcome?;

    Ok(app.terrain)
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the viewer.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        let mut drawn = Ok(());
        terminal.draw(|f| drawn = ui(f, app))?;
        drawn?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    KeyCode::Char(' ') | KeyCode::Char('p') => app.toggle_pause(),
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick()?;
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) -> Result<()> {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(60), // Area for the map
            Constraint::Percentage(30), // Adventurers and last round
            Constraint::Percentage(10), // Area for status/help
        ])
        .split(frame.area());
    let details_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_layout[1]);

    render_map(frame, main_layout[0], app)?;
    render_adventurers(frame, details_layout[0], &app.terrain);
    render_last_round(frame, details_layout[1], app);

    let status = if app.finished() {
        "Simulation over."
    } else if app.paused {
        "Paused."
    } else {
        "Running."
    };
    let help_text = Paragraph::new(format!(
        "Round {} - {status} Press 'p' to pause, 'q' or 'Esc' to quit and save.",
        app.terrain.rounds_played()
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
    Ok(())
}

fn orientation_arrow(orientation: Orientation) -> &'static str {
    match orientation {
        Orientation::North => "^",
        Orientation::South => "v",
        Orientation::East => ">",
        Orientation::West => "<",
    }
}

/// Picks the top-left tile of a `width` x `height` view, centred on the first
/// adventurer still moving (or the first one at all).
fn view_origin(terrain: &Terrain, width: usize, height: usize) -> Position {
    let adventurers = terrain.adventurers();
    let Some(focus) = adventurers
        .iter()
        .find(|a| a.has_pending_actions())
        .or_else(|| adventurers.first())
    else {
        return Position::new(0, 0);
    };
    let focus = focus.position();
    let x = focus
        .x
        .saturating_sub(width / 2)
        .min(terrain.width().saturating_sub(width));
    let y = focus
        .y
        .saturating_sub(height / 2)
        .min(terrain.height().saturating_sub(height));
    Position::new(x, y)
}

/// Renders the visible part of the terrain onto the frame.
fn render_map(frame: &mut Frame, area: Rect, app: &App) -> Result<()> {
    let terrain = &app.terrain;
    let block = Block::default().title(app.title.as_str()).borders(Borders::ALL);
    let inner = block.inner(area);
    let (width, height) = (usize::from(inner.width), usize::from(inner.height));
    let origin = view_origin(terrain, width, height);
    let relief = terrain.relief(origin, width, height)?;

    let mut lines: Vec<Line> = Vec::with_capacity(relief.height());
    for (y, row) in relief.rows().enumerate() {
        let mut spans: Vec<Span> = Vec::with_capacity(row.len());
        for (x, cell) in row.iter().enumerate() {
            let position = Position::new(origin.x + x, origin.y + y);
            let span = if let Some(adventurer) = terrain.adventurer_at(position) {
                Span::styled(
                    orientation_arrow(adventurer.orientation()),
                    Style::default().fg(Color::Red).bold(),
                )
            } else {
                match (cell, terrain.treasure_count_at(position)) {
                    (CellType::Mountain, _) => {
                        Span::styled("#", Style::default().fg(Color::DarkGray))
                    }
                    (CellType::Plain, 0) => Span::raw("."),
                    (CellType::Plain, count) => Span::styled(
                        count.min(9).to_string(),
                        Style::default().fg(Color::Yellow),
                    ),
                }
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let map_paragraph = Paragraph::new(lines).block(block).alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
    Ok(())
}

/// Lists each adventurer with its state.
fn render_adventurers(frame: &mut Frame, area: Rect, terrain: &Terrain) {
    let items: Vec<ListItem> = terrain
        .adventurers()
        .iter()
        .map(|adventurer| {
            let pending: String = adventurer.pending_actions().map(|a| a.code()).collect();
            ListItem::from(Line::from(vec![
                Span::styled(adventurer.name(), Style::default().bold()),
                Span::raw(format!(
                    " {} facing {} ",
                    adventurer.position(),
                    adventurer.orientation()
                )),
                Span::styled(
                    format!("treasures: {} ", adventurer.treasures()),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(pending, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Adventurers"));
    frame.render_widget(list, area);
}

/// Describes the outcome of every turn of the last round.
fn render_last_round(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .last_round
        .iter()
        .flat_map(|report| report.turns.iter())
        .map(|turn| {
            let name = app.terrain.adventurers()[turn.adventurer].name();
            let (text, color) = match &turn.outcome {
                MoveOutcome::Moved => ("moved".to_string(), Color::Reset),
                MoveOutcome::Turned => ("turned".to_string(), Color::Reset),
                MoveOutcome::Collected => ("found a treasure".to_string(), Color::Yellow),
                MoveOutcome::Blocked(BlockReason::OutOfBounds) => {
                    ("stopped at the edge".to_string(), Color::Red)
                }
                MoveOutcome::Blocked(BlockReason::Mountain) => {
                    ("blocked by a mountain".to_string(), Color::Red)
                }
                MoveOutcome::Blocked(BlockReason::Occupied { by }) => {
                    (format!("blocked by {by}"), Color::Red)
                }
            };
            ListItem::from(Line::from(vec![
                Span::raw(format!("{name} [{}] ", turn.action)),
                Span::styled(text, Style::default().fg(color)),
            ]))
        })
        .collect();

    let title = match &app.last_round {
        Some(report) => format!("Round {}", report.round),
        None => "Waiting for the first round".to_string(),
    };
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}
