use anyhow::{Context, Result};
use clap::Parser;
use ghost_chase_core::{
    Direction as Heading, Position,
    config::{LevelSource, MovementMode, SessionConfig},
    ghost::{Ghost, GhostState},
    level::Level,
    maze,
    search::Algorithm,
    session::{Session, SessionStatus},
    targeting::Role,
    tile::{Tile, WallKind},
};
use rand::{SeedableRng, rngs::StdRng};
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    collections::HashMap,
    fs,
    io::{self, Stdout},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about = "Arcade maze chase in the terminal", long_about = None)]
struct Args {
    /// Level to play: classic or generated
    #[arg(short, long, default_value = "classic")]
    level: LevelSource,

    /// Maze rows for generated levels
    #[arg(long, default_value_t = maze::DEFAULT_ROWS)]
    rows: usize,

    /// Maze columns for generated levels
    #[arg(long, default_value_t = maze::DEFAULT_COLS)]
    cols: usize,

    /// Tiles per maze cell for generated levels
    #[arg(long, default_value_t = maze::DEFAULT_SCALE)]
    scale: usize,

    /// Seed for maze generation and ghost randomness
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Ghost movement: direct or search
    #[arg(short, long, default_value = "direct")]
    movement: MovementMode,

    /// Search used by search-guided ghosts: bfs, dfs or dijkstra
    #[arg(short, long, default_value = "bfs")]
    algorithm: Algorithm,

    /// Milliseconds per simulation tick
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// Load the level from a JSON tile matrix instead
    #[arg(long, value_name = "JSON_FILE")]
    maze_file: Option<PathBuf>,

    /// Write the level to a JSON tile matrix before playing
    #[arg(long, value_name = "JSON_FILE")]
    export_maze: Option<PathBuf>,

    /// Where to write logs
    #[arg(long, default_value = "ghost_chase.log")]
    log_file: PathBuf,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        let level = match self.level {
            LevelSource::Classic => LevelSource::Classic,
            LevelSource::Generated { .. } => LevelSource::Generated {
                rows: self.rows,
                cols: self.cols,
                scale: self.scale,
            },
        };
        SessionConfig {
            level,
            movement: self.movement,
            algorithm: self.algorithm,
            seed: self.seed,
            ..SessionConfig::default()
        }
    }
}

struct App {
    /// The running game.
    session: Session,
    /// Steering pressed since the last tick.
    input: Option<Heading>,
    paused: bool,
    show_paths: bool,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let config = args.session_config();
        let session = match &args.maze_file {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read maze file {}", path.display()))?;
                let mut rng = StdRng::seed_from_u64(config.seed);
                let level = Level::from_json(&json, &mut rng)
                    .with_context(|| format!("Failed to load maze file {}", path.display()))?;
                Session::with_level(config, level)?
            }
            None => Session::new(config).context("Failed to build level")?,
        };

        if let Some(path) = &args.export_maze {
            export_level(session.level(), path)?;
        }

        Ok(App {
            session,
            input: None,
            paused: false,
            show_paths: false,
            should_quit: false,
        })
    }

    /// Handles one step of the simulation.
    fn tick(&mut self) {
        if self.paused || self.session.status() != SessionStatus::Playing {
            return;
        }
        self.session.tick(self.input.take());
    }

    fn on_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('p') => self.paused = !self.paused,
            KeyCode::Char('v') => self.show_paths = !self.show_paths,
            KeyCode::Up | KeyCode::Char('k') => self.input = Some(Heading::North),
            KeyCode::Down | KeyCode::Char('j') => self.input = Some(Heading::South),
            KeyCode::Left | KeyCode::Char('h') => self.input = Some(Heading::West),
            KeyCode::Right | KeyCode::Char('l') => self.input = Some(Heading::East),
            _ => {}
        }
    }
}

fn export_level(level: &Level, path: &Path) -> Result<()> {
    let json = level.to_json().context("Failed to encode level")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "level exported");
    Ok(())
}

/// Sends logs to a file; the terminal belongs to the UI.
fn init_logging(path: &Path) -> Result<WorkerGuard> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .with_context(|| format!("Log path has no file name: {}", path.display()))?;
    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    Ok(guard)
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    let _guard = init_logging(&args.log_file)?;

    // Build the session before touching the terminal so errors print normally
    let mut app = App::new(&args)?;
    let tick_rate = Duration::from_millis(args.tick_ms.max(1));

    let mut terminal = setup_terminal()?;
    let outcome = run_app(&mut terminal, &mut app, tick_rate);
    restore_terminal(&mut terminal)?;
    outcome?;

    let session = &app.session;
    info!(
        score = session.score(),
        ticks = session.ticks(),
        status = ?session.status(),
        "session closed"
    );
    println!(
        "{:?}: score {} after {} ticks",
        session.status(),
        session.score(),
        session.ticks()
    );
    Ok(())
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
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
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key.code);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            let before = app.session.status();
            app.tick();
            if before == SessionStatus::Playing && app.session.status() != before {
                info!(status = ?app.session.status(), "session finished");
            }
            last_tick = Instant::now();
        }

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
            Constraint::Min(10),   // Area for the map
            Constraint::Length(4), // Area for the scoreboard
            Constraint::Length(2), // Area for status/help
        ])
        .split(frame.area());

    render_map(frame, main_layout[0], app);
    render_hud(frame, main_layout[1], app);

    let help = match (app.paused, app.session.status()) {
        (_, SessionStatus::Won) => "Level cleared! Press 'q' to quit.",
        (_, SessionStatus::GameOver) => "Game over. Press 'q' to quit.",
        (true, _) => "Paused. 'p' resume, 'q'/'Esc' quit.",
        (false, _) => "Arrows/hjkl steer, 'p' pause, 'v' ghost paths, 'q'/'Esc' quit.",
    };
    let help_text = Paragraph::new(help)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

fn role_color(role: Role) -> Color {
    match role {
        Role::Blinky => Color::Red,
        Role::Inky => Color::Cyan,
        Role::Pinky => Color::Magenta,
        Role::Clyde => Color::LightYellow,
    }
}

fn ghost_span(ghost: &Ghost) -> Span<'static> {
    match ghost.state() {
        GhostState::ReturningToBox => Span::styled("\"\"", Style::default().fg(Color::White)),
        GhostState::Frightened => Span::styled("ᗣᗣ", Style::default().fg(Color::Blue).bold()),
        _ => Span::styled("ᗣᗣ", Style::default().fg(role_color(ghost.role())).bold()),
    }
}

fn tile_span(tile: Tile) -> Span<'static> {
    let wall = Style::default().fg(Color::Blue);
    match tile {
        Tile::Empty => Span::raw("  "),
        Tile::Pellet => Span::styled(" ·", Style::default().fg(Color::Gray)),
        Tile::PowerPellet => Span::styled(" ●", Style::default().fg(Color::LightYellow)),
        Tile::Gate => Span::styled("──", Style::default().fg(Color::LightMagenta)),
        Tile::Wall(kind) => {
            let glyph = match kind {
                WallKind::Vertical => "║ ",
                WallKind::Horizontal => "══",
                WallKind::CornerTopLeft => "╔═",
                WallKind::CornerTopRight => "╗ ",
                WallKind::CornerBottomLeft => "╚═",
                WallKind::CornerBottomRight => "╝ ",
            };
            Span::styled(glyph, wall)
        }
    }
}

/// Renders the level, two terminal columns per tile.
fn render_map(frame: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let level = session.level();
    let tile_size = session.config().tile_size;

    let ghosts: HashMap<Position, &Ghost> = session
        .ghosts()
        .iter()
        .filter_map(|ghost| ghost.position().to_tile(tile_size).map(|tile| (tile, ghost)))
        .collect();
    let paths: HashMap<Position, Role> = if app.show_paths {
        session
            .ghosts()
            .iter()
            .flat_map(|ghost| ghost.path().iter().map(|tile| (*tile, ghost.role())))
            .collect()
    } else {
        HashMap::new()
    };
    let player = session.player().position.to_tile(tile_size);

    let mut lines: Vec<Line> = Vec::with_capacity(level.height());
    for (y, row) in level.tiles().to_rows().into_iter().enumerate() {
        let spans: Vec<Span> = row
            .into_iter()
            .enumerate()
            .map(|(x, tile)| {
                let here = Position::new(x, y);
                if player == Some(here) {
                    Span::styled("ᗧ ", Style::default().fg(Color::Yellow).bold())
                } else if let Some(ghost) = ghosts.get(&here) {
                    ghost_span(ghost)
                } else if let Some(role) = paths.get(&here) {
                    Span::styled(" ∙", Style::default().fg(role_color(*role)))
                } else {
                    tile_span(tile)
                }
            })
            .collect();
        lines.push(Line::from(spans));
    }

    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Ghost Chase").borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(map_paragraph, area);
}

/// Score, lives and session settings.
fn render_hud(frame: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let config = session.config();
    let fright = if session.is_frightened() {
        Span::styled(
            format!("FRIGHT {}", session.fright_remaining()),
            Style::default().fg(Color::Blue).bold(),
        )
    } else {
        Span::raw("")
    };
    let search = match config.movement {
        MovementMode::SearchGuided => format!(" ({})", config.algorithm),
        MovementMode::Direct => String::new(),
    };

    let rows = vec![
        Line::from(vec![
            Span::styled(
                format!("Score: {}  ", session.score()),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(format!(
                "Lives: {}  Pellets: {}  ",
                session.lives(),
                session.pellets_remaining()
            )),
            fright,
        ]),
        Line::from(Span::raw(format!(
            "Level: {}  Ghosts: {}{}  Tick: {}",
            config.level,
            config.movement,
            search,
            session.ticks()
        ))),
    ];

    let hud = Paragraph::new(rows).block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(hud, area);
}
