/// Game loop driver: fixed-timestep scheduling and the phase state machine.
///
/// The host calls `frame(now_ms, surface)` from its display refresh
/// callback.  Real elapsed time is clamped, accumulated and drained in
/// fixed simulation steps, then exactly one render follows, so a render
/// never sees a half-updated state.

use std::mem;

use rand::Rng;
use tracing::{debug, info};

use crate::compute::{advance_level, new_game, step, StepOutcome};
use crate::config::GameConfig;
use crate::entities::GameState;
use crate::error::SurfaceError;
use crate::input::{fire, Direction, InputHandler};
use crate::render::{render, render_overlay, Overlay, Surface};
use crate::telemetry::{share_url, SharePlatform, Telemetry};

pub const GAME_NAME: &str = "Space Invaders";

// ── Fixed timestep ───────────────────────────────────────────────────────────

/// Fixed timestep accumulator.
#[derive(Clone, Debug)]
pub struct FixedTimestep {
    step_ms: f64,
    accumulator_ms: f64,
}

impl FixedTimestep {
    pub fn new(step_ms: f64) -> Self {
        Self {
            step_ms,
            accumulator_ms: 0.0,
        }
    }

    /// Add frame time to the accumulator. Returns the number of fixed steps to run.
    pub fn accumulate(&mut self, frame_ms: f64) -> u32 {
        self.accumulator_ms += frame_ms.max(0.0);
        let steps = (self.accumulator_ms / self.step_ms).floor() as u32;
        self.accumulator_ms -= steps as f64 * self.step_ms;
        steps
    }

    /// Fraction of a step left over, `0.0..1.0`.
    pub fn alpha(&self) -> f64 {
        self.accumulator_ms / self.step_ms
    }

    pub fn reset(&mut self) {
        self.accumulator_ms = 0.0;
    }
}

// ── Phases ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    NotStarted,
    Playing,
    /// Banner is up; the next level starts at `until_ms`.
    LevelTransition { until_ms: f64 },
    GameOverExploding,
    Ended,
}

// ── Driver ───────────────────────────────────────────────────────────────────

pub struct Driver<R: Rng, T: Telemetry> {
    config: GameConfig,
    state: GameState,
    phase: Phase,
    timestep: FixedTimestep,
    last_frame_ms: Option<f64>,
    running: bool,
    input: InputHandler,
    rng: R,
    telemetry: T,
    steps_run: u64,
}

impl<R: Rng, T: Telemetry> Driver<R, T> {
    pub fn new(config: GameConfig, mut rng: R, telemetry: T) -> Self {
        debug_assert!(
            config.validate().is_ok(),
            "invalid game config: {:?}",
            config.validate()
        );
        let state = new_game(&config, &mut rng);
        let timestep = FixedTimestep::new(config.sim_step_ms);
        Driver {
            config,
            state,
            phase: Phase::NotStarted,
            timestep,
            last_frame_ms: None,
            running: true,
            input: InputHandler::new(),
            rng,
            telemetry,
            steps_run: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct access for hosts and tests that stage a scenario.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Total fixed steps executed since construction.
    pub fn steps_run(&self) -> u64 {
        self.steps_run
    }

    // ── Phase changes ────────────────────────────────────────────────────────

    /// Start a fresh game from `NotStarted` or `Ended`.  Returns false in any
    /// other phase.
    pub fn start(&mut self) -> bool {
        if !matches!(self.phase, Phase::NotStarted | Phase::Ended) || !self.running {
            return false;
        }
        self.state = new_game(&self.config, &mut self.rng);
        self.phase = Phase::Playing;
        self.timestep.reset();
        self.last_frame_ms = None;
        self.input.reset();
        self.telemetry.emit("game_start", &[]);
        info!("game started");
        true
    }

    /// Stop the loop; later `frame` calls do nothing.
    pub fn stop(&mut self) {
        if self.running {
            debug!("driver stopped");
        }
        self.running = false;
    }

    // ── Per-frame entry point ────────────────────────────────────────────────

    /// Process one display refresh.  Returns `Ok(false)` when the frame was
    /// throttled or the driver is stopped.
    pub fn frame(&mut self, now_ms: f64, surface: &mut impl Surface) -> Result<bool, SurfaceError> {
        if !self.running {
            return Ok(false);
        }
        let elapsed = match self.last_frame_ms {
            Some(last) => {
                let elapsed = now_ms - last;
                if elapsed < self.config.frame_throttle_ms {
                    return Ok(false);
                }
                elapsed.min(self.config.max_frame_delta_ms)
            }
            None => 0.0,
        };
        self.last_frame_ms = Some(now_ms);

        match self.phase {
            Phase::Playing | Phase::GameOverExploding => self.drain(elapsed, now_ms),
            Phase::LevelTransition { until_ms } if now_ms >= until_ms => self.begin_next_level(),
            _ => {}
        }

        render(surface, &self.state, &self.config);
        render_overlay(surface, self.overlay());
        surface.present()?;
        Ok(true)
    }

    fn drain(&mut self, elapsed_ms: f64, now_ms: f64) {
        let steps = self.timestep.accumulate(elapsed_ms);
        let dt = self.config.sim_dt();
        for _ in 0..steps {
            let outcome = step(&mut self.state, &self.config, dt, &mut self.rng);
            self.steps_run += 1;
            if self.on_outcome(outcome, now_ms) {
                break;
            }
        }
    }

    /// Returns true when the remaining steps of this frame must be dropped.
    fn on_outcome(&mut self, outcome: StepOutcome, now_ms: f64) -> bool {
        match outcome {
            StepOutcome::Running | StepOutcome::Exploding => false,
            StepOutcome::LevelCleared => {
                self.phase = Phase::LevelTransition {
                    until_ms: now_ms + self.config.level_banner_ms,
                };
                self.timestep.reset();
                self.telemetry
                    .emit("level_complete", &[("level", self.state.level.to_string())]);
                true
            }
            StepOutcome::PlayerDestroyed => {
                self.phase = Phase::GameOverExploding;
                self.telemetry.emit(
                    "game_over",
                    &[
                        ("score", self.state.score.to_string()),
                        ("bonus", self.state.bonus_score.to_string()),
                        ("level", self.state.level.to_string()),
                    ],
                );
                false
            }
            StepOutcome::ExplosionFinished => {
                self.phase = Phase::Ended;
                info!(score = self.state.score, "end screen");
                true
            }
            StepOutcome::Frozen => {
                if self.state.game_over {
                    self.phase = Phase::Ended;
                }
                true
            }
        }
    }

    fn begin_next_level(&mut self) {
        let prev = mem::take(&mut self.state);
        self.state = advance_level(prev, &self.config, &mut self.rng);
        self.phase = Phase::Playing;
        self.timestep.reset();
        self.input.reset();
    }

    pub fn overlay(&self) -> Overlay {
        match self.phase {
            Phase::NotStarted => Overlay::Start,
            Phase::LevelTransition { .. } => Overlay::LevelBanner {
                level: self.state.level + 1,
            },
            Phase::Ended => Overlay::EndScreen {
                score: self.state.score,
                bonus: self.state.bonus_score,
                level: self.state.level,
            },
            Phase::Playing | Phase::GameOverExploding => Overlay::None,
        }
    }

    // ── Input (ignored outside `Playing`) ────────────────────────────────────

    pub fn key_down(&mut self, direction: Direction) {
        if self.phase == Phase::Playing {
            self.input.key_down(&mut self.state, direction, &self.config);
        }
    }

    pub fn key_up(&mut self, direction: Direction) {
        self.input.key_up(&mut self.state, direction, &self.config);
    }

    pub fn fire(&mut self, now_ms: f64) -> usize {
        if self.phase != Phase::Playing {
            return 0;
        }
        fire(&mut self.state, &self.config, now_ms)
    }

    pub fn pointer_down(&mut self, now_ms: f64) -> usize {
        if self.phase != Phase::Playing {
            return 0;
        }
        self.input.pointer_down(&mut self.state, &self.config, now_ms)
    }

    pub fn pointer_drag(&mut self, now_ms: f64) -> usize {
        if self.phase != Phase::Playing {
            return 0;
        }
        self.input.pointer_drag(&mut self.state, &self.config, now_ms)
    }

    pub fn pointer_up(&mut self) {
        self.input.pointer_up();
    }

    /// Share link for the end screen; `None` before the game has ended.
    pub fn share(&mut self, platform: SharePlatform) -> Option<String> {
        if self.phase != Phase::Ended {
            return None;
        }
        self.telemetry
            .emit("share_click", &[("platform", platform.name().to_string())]);
        Some(share_url(platform, GAME_NAME, self.state.score + self.state.bonus_score))
    }
}
