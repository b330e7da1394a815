/// Input-driven state changes: steering and firing.
///
/// Input only ever touches the player's velocity and appends bullets; the
/// next `step` picks the changes up.

use crate::config::GameConfig;
use crate::entities::GameState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// Fire a shot (two with double bullets) if the cooldown has elapsed.
/// Returns the number of bullets created.
pub fn fire(state: &mut GameState, config: &GameConfig, now_ms: f64) -> usize {
    if state.game_over || state.level_transition {
        return 0;
    }
    if let Some(last) = state.last_fire_ms {
        if now_ms - last < config.fire_cooldown_ms {
            return 0;
        }
    }
    state.last_fire_ms = Some(now_ms);
    state.total_shots += 1;

    let player = &state.player;
    let x = player.x + player.width / 2.0 - config.bullet_width / 2.0;
    let y = player.y - config.bullet_height;
    if player.has_double_bullets() {
        let offset = config.double_bullet_offset;
        state.bullets.create(x - offset, y);
        state.bullets.create(x + offset, y);
        2
    } else {
        state.bullets.create(x, y);
        1
    }
}

/// Tracks which controls are held so releases resolve correctly.
#[derive(Clone, Debug, Default)]
pub struct InputHandler {
    left_held: bool,
    right_held: bool,
    pointer_held: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, state: &mut GameState, direction: Direction, config: &GameConfig) {
        match direction {
            Direction::Left => self.left_held = true,
            Direction::Right => self.right_held = true,
        }
        if state.game_over {
            return;
        }
        // The most recent press wins while both are held.
        state.player.dx = match direction {
            Direction::Left => -config.player_speed,
            Direction::Right => config.player_speed,
        };
    }

    pub fn key_up(&mut self, state: &mut GameState, direction: Direction, config: &GameConfig) {
        match direction {
            Direction::Left => self.left_held = false,
            Direction::Right => self.right_held = false,
        }
        state.player.dx = match (self.left_held, self.right_held) {
            (true, false) if !state.game_over => -config.player_speed,
            (false, true) if !state.game_over => config.player_speed,
            _ => 0.0,
        };
    }

    pub fn pointer_down(&mut self, state: &mut GameState, config: &GameConfig, now_ms: f64) -> usize {
        self.pointer_held = true;
        fire(state, config, now_ms)
    }

    /// Dragging with the button held keeps firing, cooldown permitting.
    pub fn pointer_drag(&mut self, state: &mut GameState, config: &GameConfig, now_ms: f64) -> usize {
        if !self.pointer_held {
            return 0;
        }
        fire(state, config, now_ms)
    }

    pub fn pointer_up(&mut self) {
        self.pointer_held = false;
    }

    pub fn is_pointer_held(&self) -> bool {
        self.pointer_held
    }

    /// Forget every held control, e.g. when a new state replaces the old one.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
