mod display;

use std::fs::File;
use std::io::{self, stdout, BufWriter, Stdout};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crusader_arcade::config::{GameConfig, MazeConfig};
use crusader_arcade::driver::{Driver, Phase};
use crusader_arcade::error::SurfaceError;
use crusader_arcade::input::Direction;
use crusader_arcade::memory_maze::{MazePhase, MemoryMaze, PointerKind};
use crusader_arcade::render::Surface;
use crusader_arcade::telemetry::{SharePlatform, Telemetry, TracingTelemetry};

use display::{TerminalGuard, TerminalSurface};

const FRAME: Duration = Duration::from_micros(16_667);

/// Without key-release events a key counts as held while its presses or
/// OS repeats keep arriving within this window.
const HOLD_WINDOW_MS: f64 = 135.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum GameKind {
    Invaders,
    Maze,
}

enum Session {
    Invaders(GameConfig),
    Maze(MazeConfig),
}

#[derive(Debug, Parser)]
#[command(name = "crusader_arcade", version, about = "Retro arcade games in the terminal")]
struct Args {
    /// Which game to play.
    #[arg(long, value_enum, default_value_t = GameKind::Invaders)]
    game: GameKind,

    /// JSON file overriding the game's default constants.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for a reproducible session.
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs here; without it logs are discarded.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ── Input ─────────────────────────────────────────────────────────────────────

/// Dedicated thread for blocking event reads so the frame loop never waits
/// on the terminal.
fn spawn_input_thread() -> mpsc::Receiver<Event> {
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "input thread stopped");
                break;
            }
        }
    });
    rx
}

/// Last time each continuous control was seen, in session milliseconds.
#[derive(Default)]
struct HeldKeys {
    left: Option<f64>,
    right: Option<f64>,
    fire: Option<f64>,
}

impl HeldKeys {
    fn slot(&mut self, code: KeyCode) -> Option<&mut Option<f64>> {
        match code {
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(&mut self.left),
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(&mut self.right),
            KeyCode::Char(' ') => Some(&mut self.fire),
            _ => None,
        }
    }

    fn record(&mut self, code: KeyCode, kind: KeyEventKind, now_ms: f64) {
        if let Some(slot) = self.slot(code) {
            *slot = match kind {
                KeyEventKind::Press | KeyEventKind::Repeat => Some(now_ms),
                KeyEventKind::Release => None,
            };
        }
    }

    fn is_held(seen: Option<f64>, now_ms: f64) -> bool {
        seen.map_or(false, |last| now_ms - last <= HOLD_WINDOW_MS)
    }

    fn left(&self, now_ms: f64) -> bool {
        Self::is_held(self.left, now_ms)
    }

    fn right(&self, now_ms: f64) -> bool {
        Self::is_held(self.right, now_ms)
    }

    fn fire(&self, now_ms: f64) -> bool {
        Self::is_held(self.fire, now_ms)
    }
}

fn is_quit(code: KeyCode, modifiers: KeyModifiers) -> bool {
    matches!(code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
        || (code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL))
}

fn share_hotkey(code: KeyCode) -> Option<SharePlatform> {
    match code {
        KeyCode::Char(c) => SharePlatform::from_hotkey(c),
        _ => None,
    }
}

/// Hand a share link to the desktop's URL opener.  Failure only gets logged.
fn open_url(url: &str) {
    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", "", url]).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };
    match result {
        Ok(_) => debug!(url, "opened share link"),
        Err(e) => warn!(error = %e, url, "could not open share link"),
    }
}

fn pace(frame_start: Instant) {
    let elapsed = frame_start.elapsed();
    if elapsed < FRAME {
        thread::sleep(FRAME - elapsed);
    }
}

type Screen = TerminalSurface<BufWriter<Stdout>>;

// ── Space Invaders ────────────────────────────────────────────────────────────

fn run_invaders(config: GameConfig, rng: StdRng, rx: &mpsc::Receiver<Event>) -> Result<()> {
    let mut surface: Screen = TerminalSurface::new(BufWriter::new(stdout()), config.width, config.height)
        .context("creating terminal surface")?;
    let mut driver = Driver::new(config, rng, TracingTelemetry);
    let mut buttons = TracingTelemetry;
    let mut held = HeldKeys::default();
    // Direction currently applied to the driver, so presses and releases are
    // forwarded once per change.
    let mut applied = (false, false);
    let mut was_playing = false;
    let epoch = Instant::now();

    while driver.is_running() {
        let frame_start = Instant::now();
        let now_ms = epoch.elapsed().as_secs_f64() * 1000.0;

        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent {
                    code,
                    kind,
                    modifiers,
                    ..
                }) => {
                    held.record(code, kind, now_ms);
                    if kind == KeyEventKind::Release {
                        continue;
                    }
                    if is_quit(code, modifiers) {
                        driver.stop();
                        break;
                    }
                    match code {
                        KeyCode::Enter if driver.phase() == Phase::NotStarted => {
                            buttons.emit("button_click", &[("type", "start".to_string())]);
                            driver.start();
                        }
                        KeyCode::Char('r') | KeyCode::Char('R') if driver.phase() == Phase::Ended => {
                            buttons.emit("button_click", &[("type", "play_again".to_string())]);
                            driver.start();
                        }
                        KeyCode::Char(' ') => {
                            driver.fire(now_ms);
                        }
                        code => {
                            if let Some(platform) = share_hotkey(code) {
                                if let Some(url) = driver.share(platform) {
                                    open_url(&url);
                                }
                            }
                        }
                    }
                }
                Event::Mouse(MouseEvent { kind, .. }) => match kind {
                    MouseEventKind::Down(MouseButton::Left) => {
                        driver.pointer_down(now_ms);
                    }
                    MouseEventKind::Drag(MouseButton::Left) => {
                        driver.pointer_drag(now_ms);
                    }
                    MouseEventKind::Up(MouseButton::Left) => driver.pointer_up(),
                    _ => {}
                },
                Event::Resize(cols, rows) => {
                    if let Err(e) = surface.resize(cols, rows) {
                        warn!(error = %e, "terminal resized below minimum");
                    }
                }
                _ => {}
            }
        }
        if !driver.is_running() {
            break;
        }

        // A fresh level or game drops held state inside the driver; re-send
        // whatever is still held.
        let playing = driver.phase() == Phase::Playing;
        if playing && !was_playing {
            applied = (false, false);
        }
        was_playing = playing;

        let now = (held.left(now_ms), held.right(now_ms));
        if now.0 != applied.0 {
            if now.0 {
                driver.key_down(Direction::Left);
            } else {
                driver.key_up(Direction::Left);
            }
        }
        if now.1 != applied.1 {
            if now.1 {
                driver.key_down(Direction::Right);
            } else {
                driver.key_up(Direction::Right);
            }
        }
        applied = now;
        if held.fire(now_ms) {
            driver.fire(now_ms);
        }

        match driver.frame(now_ms, &mut surface) {
            Ok(_) => {}
            Err(SurfaceError::TooSmall { .. }) => {}
            Err(e) => return Err(e).context("presenting frame"),
        }
        pace(frame_start);
    }

    info!(score = driver.state().score, level = driver.state().level, "session over");
    Ok(())
}

// ── Memory Maze ───────────────────────────────────────────────────────────────

fn run_maze(config: MazeConfig, rng: StdRng, rx: &mpsc::Receiver<Event>) -> Result<()> {
    let side = config.surface_size();
    let mut surface: Screen =
        TerminalSurface::new(BufWriter::new(stdout()), side, side).context("creating terminal surface")?;
    let mut maze = MemoryMaze::new(config, rng, TracingTelemetry);
    let mut buttons = TracingTelemetry;
    let epoch = Instant::now();

    'frames: loop {
        let frame_start = Instant::now();
        let now_ms = epoch.elapsed().as_secs_f64() * 1000.0;

        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent {
                    code,
                    kind,
                    modifiers,
                    ..
                }) if kind != KeyEventKind::Release => {
                    if is_quit(code, modifiers) {
                        maze.stop();
                        break 'frames;
                    }
                    match code {
                        KeyCode::Enter if maze.phase() == MazePhase::Idle => {
                            buttons.emit("button_click", &[("type", "start".to_string())]);
                            maze.start(now_ms);
                        }
                        KeyCode::Char('r') | KeyCode::Char('R')
                            if maze.phase() == MazePhase::GameOver =>
                        {
                            buttons.emit("button_click", &[("type", "play_again".to_string())]);
                            maze.start(now_ms);
                        }
                        code => {
                            if let Some(platform) = share_hotkey(code) {
                                if let Some(url) = maze.share(platform) {
                                    open_url(&url);
                                }
                            }
                        }
                    }
                }
                Event::Mouse(MouseEvent {
                    kind: MouseEventKind::Down(MouseButton::Left),
                    column,
                    row,
                    ..
                }) => {
                    if let Some((x, y)) = surface.to_logical(column, row) {
                        maze.press(x, y, now_ms, PointerKind::Mouse);
                    }
                }
                Event::Resize(cols, rows) => {
                    if let Err(e) = surface.resize(cols, rows) {
                        warn!(error = %e, "terminal resized below minimum");
                    }
                }
                _ => {}
            }
        }

        maze.tick(now_ms);
        maze.render(&mut surface);
        match surface.present() {
            Ok(()) | Err(SurfaceError::TooSmall { .. }) => {}
            Err(e) => return Err(e).context("presenting frame"),
        }
        pace(frame_start);
    }

    info!(score = maze.score(), "session over");
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Load config before touching the terminal so errors print normally.
    let session = match args.game {
        GameKind::Invaders => Session::Invaders(match &args.config {
            Some(path) => GameConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => GameConfig::default(),
        }),
        GameKind::Maze => Session::Maze(match &args.config {
            Some(path) => MazeConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => MazeConfig::default(),
        }),
    };

    let guard = match TerminalGuard::mount(&mut io::stdout()) {
        Ok(guard) => guard,
        Err(e @ (SurfaceError::TooSmall { .. } | SurfaceError::Unavailable(_))) => {
            warn!(error = %e, "no usable terminal, not starting");
            eprintln!("{e}");
            return Ok(());
        }
        Err(e) => return Err(e).context("preparing terminal"),
    };
    debug!(keyboard_enhanced = guard.keyboard_enhanced(), "terminal mounted");

    let rx = spawn_input_thread();
    let result = match session {
        Session::Invaders(config) => run_invaders(config, rng, &rx),
        Session::Maze(config) => run_maze(config, rng, &rx),
    };

    drop(guard);
    result
}
