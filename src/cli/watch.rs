//! Watch command implementation - Interactive TUI viewer.
//!
//! The simulation runs on its own thread and draws into a shared
//! [`Screen`]; this thread only reads the buffer and handles keys.

use super::output::league_marker;
use super::{load_config, CliError};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use deathgame::display::{Screen, ScreenBuffer, SpriteId, SpriteSheet};
use deathgame::game::{Coord, LeagueId};
use deathgame::loader::FsLoader;
use deathgame::sim::{self, build_world, Shutdown, SimConfig};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io::{stdout, Stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// How often the viewer redraws and polls for keys.
const TICK: Duration = Duration::from_millis(30);

/// Execute the watch command.
///
/// # Errors
///
/// Returns an error if setup or the TUI fails.
pub(crate) fn execute(
    config_path: &Path,
    overrides: &[PathBuf],
    delay: Option<u64>,
) -> Result<(), CliError> {
    let config = load_config(config_path, overrides)?;

    let screen = Screen::new(config.columns, config.rows);
    let mut sprites = SpriteSheet::new();
    let world = build_world(
        &config,
        &FsLoader::new(),
        &mut sprites,
        Box::new(screen.clone()),
    )?;

    let league_sprites: Vec<(LeagueId, SpriteId)> = world
        .leagues()
        .iter()
        .filter_map(|l| l.kind(l.start_kind()).map(|k| (l.id(), k.sprite)))
        .collect();

    let mut sim_config = SimConfig::from(&config);
    if let Some(ms) = delay {
        sim_config.move_delay = Duration::from_millis(ms);
    }

    let shutdown = Shutdown::new();
    let handle = sim::spawn(world, sim_config, Arc::clone(&shutdown))?;

    let app = App {
        screen,
        sprites,
        league_sprites,
        shutdown: Arc::clone(&shutdown),
        max_moves: sim_config.max_moves,
    };
    let tui_result = run_tui(&app);

    // The simulation may still be running if the TUI failed.
    shutdown.request_stop();
    let (_, result) = handle
        .join()
        .map_err(|_| CliError::new("simulation thread panicked"))?;
    tui_result?;

    println!("{} after {} moves", result.outcome, result.moves);
    if let Some(winner) = &result.winner {
        println!("Winner: {winner}");
    }
    Ok(())
}

/// App state for the TUI.
struct App {
    screen: Screen,
    sprites: SpriteSheet,
    league_sprites: Vec<(LeagueId, SpriteId)>,
    shutdown: Arc<Shutdown>,
    max_moves: u64,
}

impl App {
    fn sprite_color(&self, id: SpriteId) -> Color {
        self.sprites.get(id).map_or(Color::White, |sprite| {
            let rgb = sprite.swatch();
            Color::Rgb(rgb.r, rgb.g, rgb.b)
        })
    }

    fn league_color(&self, league: LeagueId) -> Color {
        self.league_sprites
            .iter()
            .find(|(id, _)| *id == league)
            .map_or(Color::White, |&(_, sprite)| self.sprite_color(sprite))
    }
}

fn run_tui(app: &App) -> Result<(), CliError> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| CliError::new(e.to_string()))?;

    let result = event_loop(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &App,
) -> Result<(), CliError> {
    loop {
        let buffer = app.screen.snapshot();
        terminal
            .draw(|f| ui(f, app, &buffer))
            .map_err(|e| CliError::new(e.to_string()))?;

        let key = if event::poll(TICK)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            Some(key.code)
        } else {
            None
        };

        if should_exit(&app.shutdown, key) {
            app.shutdown.request_stop();
            return Ok(());
        }
    }
}

/// The viewer leaves on `q`/`Esc` or once the simulation has finished.
/// The frame drawn before this check already shows the final board.
fn should_exit(shutdown: &Shutdown, key: Option<KeyCode>) -> bool {
    shutdown.is_finished() || matches!(key, Some(KeyCode::Char('q') | KeyCode::Esc))
}

fn ui(f: &mut Frame, app: &App, buffer: &ScreenBuffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Main content
            Constraint::Length(3), // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0], app, buffer);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(chunks[1]);

    render_board(f, main_chunks[0], app, buffer);
    render_leagues(f, main_chunks[1], app, buffer);

    render_footer(f, chunks[2]);
}

fn render_header(f: &mut Frame, area: Rect, app: &App, buffer: &ScreenBuffer) {
    let state = if app.shutdown.is_finished() {
        "GAME OVER"
    } else {
        "RUNNING"
    };
    let title = format!(
        " Deathgame | Move {}/{} | {} ",
        buffer.status().moves,
        app.max_moves,
        state
    );

    let header = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(header, area);
}

fn render_board(f: &mut Frame, area: Rect, app: &App, buffer: &ScreenBuffer) {
    // Show the portion of the board that fits, two columns per cell
    let visible_width = (area.width.saturating_sub(2) / 2).min(buffer.width());
    let visible_height = area.height.saturating_sub(2).min(buffer.height());

    let lines: Vec<Line> = (0..visible_height)
        .map(|y| {
            let spans: Vec<Span> = (0..visible_width)
                .map(|x| {
                    let sprite = buffer.get(Coord::new(x, y));
                    if sprite.is_background() {
                        Span::styled(" .", Style::default().fg(Color::DarkGray))
                    } else {
                        Span::styled("██", Style::default().fg(app.sprite_color(sprite)))
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let board = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Board "));
    f.render_widget(board, area);
}

fn render_leagues(f: &mut Frame, area: Rect, app: &App, buffer: &ScreenBuffer) {
    let mut lines = vec![Line::from("")];

    for league in &buffer.status().leagues {
        let status = if league.retired { " [RETIRED]" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} {}", league_marker(league.id), league.name),
                Style::default()
                    .fg(app.league_color(league.id))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(status),
        ]));
        lines.push(Line::from(format!("  Units: {}", league.population)));
        lines.push(Line::from(format!("  Biomass: {}", league.biomass)));
        lines.push(Line::from(""));
    }

    let leagues = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Leagues "))
        .wrap(Wrap { trim: false });

    f.render_widget(leagues, area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let footer = Paragraph::new(" [q/Esc] Stop and quit ")
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(footer, area);
}
