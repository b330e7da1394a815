use rand::rngs::StdRng;
use rand::SeedableRng;

use crusader_arcade::config::MazeConfig;
use crusader_arcade::memory_maze::{MazePhase, MemoryMaze, PointerKind, PressResult};
use crusader_arcade::render::PixelBuffer;
use crusader_arcade::telemetry::{RecordingTelemetry, SharePlatform};

type Maze = MemoryMaze<StdRng, RecordingTelemetry>;

fn maze() -> Maze {
    MemoryMaze::new(
        MazeConfig::default(),
        StdRng::seed_from_u64(9),
        RecordingTelemetry::default(),
    )
}

fn centre_of(m: &Maze, cell: usize) -> (f32, f32) {
    m.cell_rect(cell).center()
}

/// Start and run playback to completion.
fn awaiting_input() -> Maze {
    let mut m = maze();
    m.start(0.0);
    m.tick(10_000.0);
    assert_eq!(m.phase(), MazePhase::AwaitingInput);
    m
}

fn press_cell(m: &mut Maze, cell: usize, now: f64) -> PressResult {
    let (x, y) = centre_of(m, cell);
    m.press(x, y, now, PointerKind::Mouse)
}

#[test]
fn idle_until_started() {
    let mut m = maze();
    assert_eq!(m.phase(), MazePhase::Idle);
    assert_eq!(m.press(10.0, 10.0, 0.0, PointerKind::Mouse), PressResult::Ignored);
    m.tick(5000.0);
    assert_eq!(m.phase(), MazePhase::Idle);
}

#[test]
fn start_builds_a_sequence_and_waits() {
    let mut m = maze();
    assert!(m.start(0.0));
    assert!(!m.start(10.0));
    assert_eq!(m.sequence().len(), 3);
    assert!(m.sequence().iter().all(|&c| c < 25));
    assert_eq!(m.phase(), MazePhase::Starting { show_at_ms: 1000.0 });
    assert_eq!(m.telemetry().names(), vec!["game_start"]);

    m.tick(999.0);
    assert_eq!(m.phase(), MazePhase::Starting { show_at_ms: 1000.0 });
}

#[test]
fn playback_lights_each_cell_in_turn() {
    let mut m = maze();
    m.start(0.0);
    let seq = m.sequence().to_vec();

    m.tick(1000.0);
    assert_eq!(
        m.phase(),
        MazePhase::ShowingSequence {
            index: 0,
            lit: true,
            next_at_ms: 1300.0
        }
    );
    assert_eq!(m.lit_cells(), vec![seq[0]]);

    m.tick(1300.0);
    assert!(m.lit_cells().is_empty());

    m.tick(1600.0);
    assert_eq!(m.lit_cells(), vec![seq[1]]);

    // Input opens once the last cell has gone dark: 1000 + 3 * 600.
    m.tick(2799.0);
    assert!(matches!(m.phase(), MazePhase::ShowingSequence { index: 2, .. }));
    m.tick(2800.0);
    assert_eq!(m.phase(), MazePhase::AwaitingInput);
}

#[test]
fn presses_during_playback_are_ignored() {
    let mut m = maze();
    m.start(0.0);
    m.tick(1000.0);
    let first = m.sequence()[0];
    assert_eq!(press_cell(&mut m, first, 1000.0), PressResult::Ignored);
}

#[test]
fn cell_lookup_uses_floor_division() {
    let m = maze();
    assert_eq!(m.cell_at(0.0, 0.0), Some(0));
    assert_eq!(m.cell_at(65.0, 0.0), Some(0));
    assert_eq!(m.cell_at(70.0, 0.0), Some(1));
    assert_eq!(m.cell_at(0.0, 70.0), Some(5));
    assert_eq!(m.cell_at(339.0, 339.0), Some(24));
    assert_eq!(m.cell_at(350.0, 0.0), None);
    assert_eq!(m.cell_at(-1.0, 5.0), None);
}

#[test]
fn repeating_the_sequence_scores_and_extends_it() {
    let mut m = awaiting_input();
    let seq = m.sequence().to_vec();

    assert_eq!(press_cell(&mut m, seq[0], 3000.0), PressResult::Correct);
    assert!(m.lit_cells().contains(&seq[0]));
    assert_eq!(press_cell(&mut m, seq[1], 3100.0), PressResult::Correct);
    assert_eq!(
        press_cell(&mut m, seq[2], 3200.0),
        PressResult::RoundComplete { score: 1 }
    );

    assert_eq!(m.score(), 1);
    assert_eq!(m.sequence().len(), 4);
    assert_eq!(&m.sequence()[..3], &seq[..]);
    assert_eq!(m.phase(), MazePhase::Scoring { replay_at_ms: 4200.0 });
    let event = m.telemetry().last("level_complete").expect("level_complete");
    assert_eq!(event.get("level"), Some("1"));

    m.tick(4200.0);
    assert!(matches!(m.phase(), MazePhase::ShowingSequence { index: 0, lit: true, .. }));
    m.tick(20_000.0);
    assert_eq!(m.phase(), MazePhase::AwaitingInput);
}

#[test]
fn press_flash_expires() {
    let mut m = awaiting_input();
    let first = m.sequence()[0];
    press_cell(&mut m, first, 3000.0);
    m.tick(3299.0);
    assert!(m.lit_cells().contains(&first));
    m.tick(3300.0);
    assert!(m.lit_cells().is_empty());
}

#[test]
fn wrong_cell_ends_the_game() {
    let mut m = awaiting_input();
    let wrong = (m.sequence()[0] + 1) % 25;

    assert_eq!(press_cell(&mut m, wrong, 3000.0), PressResult::Wrong);
    assert_eq!(m.phase(), MazePhase::GameOver);
    let event = m.telemetry().last("game_over").expect("game_over");
    assert_eq!(event.get("score"), Some("0"));

    let url = m.share(SharePlatform::Facebook).expect("share url");
    assert!(url.starts_with("https://www.facebook.com/sharer/sharer.php?u=https%3A%2F%2Fcodecrusaders.co.uk&quote="));
    assert!(url.contains("Memory%20Maze"));

    assert!(m.start(4000.0));
    assert_eq!(m.score(), 0);
    assert_eq!(m.sequence().len(), 3);
}

#[test]
fn share_is_unavailable_mid_game() {
    let mut m = awaiting_input();
    assert_eq!(m.share(SharePlatform::Twitter), None);
}

#[test]
fn touch_presses_have_a_cooldown() {
    let mut m = awaiting_input();
    let seq = m.sequence().to_vec();
    let (x0, y0) = centre_of(&m, seq[0]);
    let (x1, y1) = centre_of(&m, seq[1]);

    assert_eq!(m.press(x0, y0, 3000.0, PointerKind::Touch), PressResult::Correct);
    assert_eq!(m.press(x1, y1, 3100.0, PointerKind::Touch), PressResult::Ignored);
    assert_eq!(m.press(x1, y1, 3300.0, PointerKind::Touch), PressResult::Correct);
}

#[test]
fn press_outside_the_grid_is_ignored() {
    let mut m = awaiting_input();
    assert_eq!(m.press(400.0, 10.0, 3000.0, PointerKind::Mouse), PressResult::Ignored);
    assert_eq!(m.phase(), MazePhase::AwaitingInput);
}

#[test]
fn stop_drops_pending_transitions() {
    let mut m = maze();
    m.start(0.0);
    m.stop();
    m.tick(5000.0);
    assert_eq!(m.phase(), MazePhase::Idle);
    assert!(m.lit_cells().is_empty());
}

#[test]
fn renders_idle_and_game_over_panels() {
    let mut m = maze();
    let mut surface = PixelBuffer::new(340, 340);
    m.render(&mut surface);
    assert!(surface.contains_text("Ready to Play?"));

    m.start(0.0);
    m.tick(10_000.0);
    m.render(&mut surface);
    assert!(surface.contains_text("Score: 0"));
    assert!(!surface.contains_text("Ready to Play?"));

    let wrong = (m.sequence()[0] + 1) % 25;
    press_cell(&mut m, wrong, 11_000.0);
    m.render(&mut surface);
    assert!(surface.contains_text("Game Over"));
    assert!(surface.contains_text("Your score: 0"));
}

#[test]
fn lit_cells_use_the_gradient() {
    let mut m = maze();
    let mut surface = PixelBuffer::new(340, 340);
    m.start(0.0);
    m.tick(1000.0);
    let lit = m.sequence()[0];
    m.render(&mut surface);

    let (x, y) = centre_of(&m, lit);
    let unlit = (lit + 1) % 25;
    let (ux, uy) = centre_of(&m, unlit);
    assert_ne!(surface.sample(x, y), surface.sample(ux, uy));
}
