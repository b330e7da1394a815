/// Memory Maze: watch a sequence of cells light up, then repeat it.
///
/// Playback and delays are an explicit state machine advanced by `tick`,
/// so stopping the game drops every pending timed transition at once.

use rand::Rng;
use tracing::info;

use crate::config::MazeConfig;
use crate::geometry::Rect;
use crate::render::{Color, Fill, Surface, TextAlign, BLACK, WHITE};
use crate::telemetry::{share_url, SharePlatform, Telemetry};

pub const GAME_NAME: &str = "Memory Maze";

const C_CELL: Color = Color::rgb(68, 68, 68);
const C_LIT_FROM: Color = Color::rgb(255, 105, 180);
const C_LIT_TO: Color = Color::rgb(138, 43, 226);
const C_PANEL: Color = Color::rgba(0, 0, 0, 204);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MazePhase {
    Idle,
    /// Waiting out the start delay before the first playback.
    Starting { show_at_ms: f64 },
    /// Playing back `sequence[index]`, lit for the first half of its slot.
    ShowingSequence { index: usize, lit: bool, next_at_ms: f64 },
    AwaitingInput,
    /// Round won; the longer sequence plays at `replay_at_ms`.
    Scoring { replay_at_ms: f64 },
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressResult {
    Ignored,
    Correct,
    RoundComplete { score: u32 },
    Wrong,
}

pub struct MemoryMaze<R: Rng, T: Telemetry> {
    config: MazeConfig,
    phase: MazePhase,
    sequence: Vec<usize>,
    entered: Vec<usize>,
    score: u32,
    /// Cell briefly lit after a press, and when it goes dark.
    flash: Option<(usize, f64)>,
    last_touch_ms: Option<f64>,
    rng: R,
    telemetry: T,
}

impl<R: Rng, T: Telemetry> MemoryMaze<R, T> {
    pub fn new(config: MazeConfig, rng: R, telemetry: T) -> Self {
        MemoryMaze {
            config,
            phase: MazePhase::Idle,
            sequence: Vec::new(),
            entered: Vec::new(),
            score: 0,
            flash: None,
            last_touch_ms: None,
            rng,
            telemetry,
        }
    }

    pub fn phase(&self) -> MazePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    pub fn config(&self) -> &MazeConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    fn half_interval(&self) -> f64 {
        self.config.show_interval_ms / 2.0
    }

    fn random_cells(&mut self, count: usize) -> Vec<usize> {
        let cells = self.config.cell_count();
        (0..count).map(|_| self.rng.gen_range(0..cells)).collect()
    }

    // ── Commands ─────────────────────────────────────────────────────────────

    /// Begin a new game; allowed from `Idle` or `GameOver`.
    pub fn start(&mut self, now_ms: f64) -> bool {
        if !matches!(self.phase, MazePhase::Idle | MazePhase::GameOver) {
            return false;
        }
        self.sequence = self.random_cells(self.config.initial_sequence_length);
        self.entered.clear();
        self.score = 0;
        self.flash = None;
        self.phase = MazePhase::Starting {
            show_at_ms: now_ms + self.config.start_delay_ms,
        };
        self.telemetry.emit("game_start", &[]);
        info!(length = self.sequence.len(), "memory maze started");
        true
    }

    /// Cancel everything pending and go back to `Idle`.
    pub fn stop(&mut self) {
        self.phase = MazePhase::Idle;
        self.flash = None;
        self.entered.clear();
    }

    /// Advance timed transitions up to `now_ms`.  Deadlines chain from the
    /// scheduled times, so a late tick catches up without drift.
    pub fn tick(&mut self, now_ms: f64) {
        if let Some((_, until)) = self.flash {
            if now_ms >= until {
                self.flash = None;
            }
        }

        let half = self.half_interval();
        loop {
            let next = match self.phase {
                MazePhase::Starting { show_at_ms } if now_ms >= show_at_ms => {
                    self.playback_from(show_at_ms)
                }
                MazePhase::Scoring { replay_at_ms } if now_ms >= replay_at_ms => {
                    self.playback_from(replay_at_ms)
                }
                MazePhase::ShowingSequence {
                    index,
                    lit: true,
                    next_at_ms,
                } if now_ms >= next_at_ms => MazePhase::ShowingSequence {
                    index,
                    lit: false,
                    next_at_ms: next_at_ms + half,
                },
                MazePhase::ShowingSequence {
                    index,
                    lit: false,
                    next_at_ms,
                } if now_ms >= next_at_ms => {
                    if index + 1 < self.sequence.len() {
                        MazePhase::ShowingSequence {
                            index: index + 1,
                            lit: true,
                            next_at_ms: next_at_ms + half,
                        }
                    } else {
                        MazePhase::AwaitingInput
                    }
                }
                _ => break,
            };
            self.phase = next;
        }
    }

    fn playback_from(&self, at_ms: f64) -> MazePhase {
        if self.sequence.is_empty() {
            return MazePhase::AwaitingInput;
        }
        MazePhase::ShowingSequence {
            index: 0,
            lit: true,
            next_at_ms: at_ms + self.half_interval(),
        }
    }

    /// Map a surface point to a cell index.  Points left of or above the
    /// grid, or past its last row/column, map to nothing.
    pub fn cell_at(&self, x: f32, y: f32) -> Option<usize> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let pitch = self.config.cell_size + self.config.cell_gap;
        let col = (x / pitch).floor() as usize;
        let row = (y / pitch).floor() as usize;
        let size = self.config.grid_size;
        (col < size && row < size).then_some(row * size + col)
    }

    /// Handle a press at surface coordinates.
    pub fn press(&mut self, x: f32, y: f32, now_ms: f64, pointer: PointerKind) -> PressResult {
        if self.phase != MazePhase::AwaitingInput {
            return PressResult::Ignored;
        }
        if pointer == PointerKind::Touch {
            if let Some(last) = self.last_touch_ms {
                if now_ms - last < self.config.touch_cooldown_ms {
                    return PressResult::Ignored;
                }
            }
            self.last_touch_ms = Some(now_ms);
        }
        let Some(cell) = self.cell_at(x, y) else {
            return PressResult::Ignored;
        };

        self.entered.push(cell);
        self.flash = Some((cell, now_ms + self.config.input_flash_ms));

        let position = self.entered.len() - 1;
        if self.sequence.get(position) != Some(&cell) {
            self.phase = MazePhase::GameOver;
            self.telemetry
                .emit("game_over", &[("score", self.score.to_string())]);
            info!(score = self.score, "memory maze over");
            return PressResult::Wrong;
        }

        if self.entered.len() == self.sequence.len() {
            self.score += 1;
            self.telemetry
                .emit("level_complete", &[("level", self.score.to_string())]);
            let extra = self.random_cells(self.config.sequence_increase);
            self.sequence.extend(extra);
            self.entered.clear();
            self.phase = MazePhase::Scoring {
                replay_at_ms: now_ms + self.config.next_round_delay_ms,
            };
            return PressResult::RoundComplete { score: self.score };
        }

        PressResult::Correct
    }

    pub fn share(&mut self, platform: SharePlatform) -> Option<String> {
        if self.phase != MazePhase::GameOver {
            return None;
        }
        self.telemetry
            .emit("share_click", &[("platform", platform.name().to_string())]);
        Some(share_url(platform, GAME_NAME, self.score))
    }

    // ── Rendering ────────────────────────────────────────────────────────────

    /// Cells currently drawn lit: the playback cell and/or the press flash.
    pub fn lit_cells(&self) -> Vec<usize> {
        let mut lit = Vec::with_capacity(2);
        if let MazePhase::ShowingSequence {
            index, lit: true, ..
        } = self.phase
        {
            if let Some(&cell) = self.sequence.get(index) {
                lit.push(cell);
            }
        }
        if let Some((cell, _)) = self.flash {
            if !lit.contains(&cell) {
                lit.push(cell);
            }
        }
        lit
    }

    pub fn cell_rect(&self, index: usize) -> Rect {
        let size = self.config.grid_size;
        let pitch = self.config.cell_size + self.config.cell_gap;
        Rect::new(
            (index % size) as f32 * pitch,
            (index / size) as f32 * pitch,
            self.config.cell_size,
            self.config.cell_size,
        )
    }

    pub fn render(&self, surface: &mut impl Surface) {
        surface.clear(BLACK);
        let lit = self.lit_cells();
        for index in 0..self.config.cell_count() {
            let fill = if lit.contains(&index) {
                Fill::Diagonal {
                    from: C_LIT_FROM,
                    to: C_LIT_TO,
                }
            } else {
                Fill::Solid(C_CELL)
            };
            surface.fill_rect(self.cell_rect(index), fill);
        }

        let w = surface.width();
        let h = surface.height();
        let cx = w / 2.0;
        let cy = h / 2.0;
        match self.phase {
            MazePhase::Idle => {
                surface.fill_rect(Rect::new(0.0, 0.0, w, h), Fill::Solid(C_PANEL));
                surface.fill_text("Ready to Play?", cx, cy - 20.0, TextAlign::Center, WHITE);
                surface.fill_text("Press ENTER", cx, cy + 20.0, TextAlign::Center, C_LIT_FROM);
            }
            MazePhase::GameOver => {
                surface.fill_rect(Rect::new(0.0, 0.0, w, h), Fill::Solid(C_PANEL));
                surface.fill_text("Game Over", cx, cy - 60.0, TextAlign::Center, WHITE);
                surface.fill_text(
                    &format!("Your score: {}", self.score),
                    cx,
                    cy - 25.0,
                    TextAlign::Center,
                    WHITE,
                );
                surface.fill_text("[1] [2] [3] : Share", cx, cy + 15.0, TextAlign::Center, C_LIT_FROM);
                surface.fill_text("R : Play Again", cx, cy + 50.0, TextAlign::Center, WHITE);
            }
            _ => {
                surface.fill_text(
                    &format!("Score: {}", self.score),
                    4.0,
                    14.0,
                    TextAlign::Left,
                    WHITE,
                );
            }
        }
    }
}
