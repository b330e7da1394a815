/// Immutable configuration records for both demo games.
///
/// Every tunable number lives here instead of being scattered as free
/// constants.  Records are built once (defaults or JSON file) and handed to
/// the driver at construction.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

// ── Space Invaders ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // Surface
    pub width: f32,
    pub height: f32,
    /// Height of the HUD strip; bombers and power-ups never go above it.
    pub top_bar_height: f32,

    // Player
    pub player_width: f32,
    pub player_height: f32,
    /// Distance from the bottom edge to the top of the ship.
    pub player_bottom_margin: f32,
    /// Horizontal speed in px/s while a direction is held.
    pub player_speed: f32,

    // Player bullets
    pub bullet_width: f32,
    pub bullet_height: f32,
    pub bullet_speed: f32,
    /// Horizontal offset of each shot when double bullets are active.
    pub double_bullet_offset: f32,
    pub fire_cooldown_ms: f64,

    // Enemy grid
    pub grid_columns: usize,
    pub base_grid_rows: usize,
    pub cell_pitch_x: f32,
    pub cell_pitch_y: f32,
    pub grid_top: f32,
    pub enemy_width: f32,
    pub enemy_height: f32,
    /// Horizontal step (px) per block move at level 1.
    pub initial_enemy_speed: f32,
    pub max_enemy_speed: f32,
    pub enemy_speed_increment: f32,
    pub enemy_move_interval_ms: f64,
    pub enemy_drop: f32,
    pub regular_points: u32,
    pub shield_points: u32,
    pub shield_base_chance: f64,
    pub shield_chance_per_level: f64,

    // Enemy fire
    pub enemy_fire_base_interval_ms: f64,
    pub enemy_bullet_width: f32,
    pub enemy_bullet_height: f32,
    pub enemy_bullet_speed: f32,

    // Bombers
    pub bomber_width: f32,
    pub bomber_height: f32,
    pub bomber_speed: f32,
    pub bomber_max_count: usize,
    pub bomber_fire_interval_ms: f64,
    pub bomber_points: u32,
    pub bomb_width: f32,
    pub bomb_height: f32,
    pub bomb_speed: f32,

    // Power-ups
    pub power_up_interval_ms: f64,
    pub power_up_size: f32,
    pub power_up_speed: f32,
    /// Seconds the double-bullet power-up lasts once collected.
    pub power_up_duration: f32,

    // Shield pulse
    pub shield_pulse_min_level: u32,
    /// Per-tick probability, multiplied by the current level.
    pub shield_pulse_chance_per_level: f64,
    pub shield_pulse_radius: f32,
    pub shield_pulse_duration: f32,

    // Explosion
    pub explosion_max_radius: f32,
    /// Seconds for the explosion to grow and fade out.
    pub explosion_duration: f32,

    // Loop timing
    pub level_banner_ms: f64,
    pub sim_step_ms: f64,
    pub frame_throttle_ms: f64,
    pub max_frame_delta_ms: f64,

    pub position_store_capacity: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            width: 900.0,
            height: 640.0,
            top_bar_height: 40.0,

            player_width: 50.0,
            player_height: 20.0,
            player_bottom_margin: 40.0,
            player_speed: 300.0,

            bullet_width: 4.0,
            bullet_height: 12.0,
            bullet_speed: 480.0,
            double_bullet_offset: 12.0,
            fire_cooldown_ms: 250.0,

            grid_columns: 8,
            base_grid_rows: 3,
            cell_pitch_x: 60.0,
            cell_pitch_y: 45.0,
            grid_top: 80.0,
            enemy_width: 40.0,
            enemy_height: 30.0,
            initial_enemy_speed: 10.0,
            max_enemy_speed: 30.0,
            enemy_speed_increment: 2.0,
            enemy_move_interval_ms: 500.0,
            enemy_drop: 20.0,
            regular_points: 10,
            shield_points: 20,
            shield_base_chance: 0.3,
            shield_chance_per_level: 0.05,

            enemy_fire_base_interval_ms: 1000.0,
            enemy_bullet_width: 4.0,
            enemy_bullet_height: 12.0,
            enemy_bullet_speed: 240.0,

            bomber_width: 50.0,
            bomber_height: 25.0,
            bomber_speed: 120.0,
            bomber_max_count: 3,
            bomber_fire_interval_ms: 2000.0,
            bomber_points: 50,
            bomb_width: 6.0,
            bomb_height: 12.0,
            bomb_speed: 240.0,

            power_up_interval_ms: 15_000.0,
            power_up_size: 20.0,
            power_up_speed: 120.0,
            power_up_duration: 10.0,

            shield_pulse_min_level: 5,
            shield_pulse_chance_per_level: 0.0005,
            shield_pulse_radius: 80.0,
            shield_pulse_duration: 3.0,

            explosion_max_radius: 80.0,
            explosion_duration: 1.0,

            level_banner_ms: 2000.0,
            sim_step_ms: 1000.0 / 60.0,
            frame_throttle_ms: 1000.0 / 60.0,
            max_frame_delta_ms: 250.0,

            position_store_capacity: 256,
        }
    }
}

impl GameConfig {
    /// Load a JSON config file; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: GameConfig = read_json(path)?;
        config.validate()?;
        info!(path = %path.display(), "loaded game config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("width", self.width as f64)?;
        positive("height", self.height as f64)?;
        positive("player_width", self.player_width as f64)?;
        positive("player_height", self.player_height as f64)?;
        positive("bullet_height", self.bullet_height as f64)?;
        positive("bullet_speed", self.bullet_speed as f64)?;
        positive("enemy_width", self.enemy_width as f64)?;
        positive("enemy_height", self.enemy_height as f64)?;
        positive("initial_enemy_speed", self.initial_enemy_speed as f64)?;
        positive("enemy_move_interval_ms", self.enemy_move_interval_ms)?;
        positive("enemy_fire_base_interval_ms", self.enemy_fire_base_interval_ms)?;
        positive("bomber_fire_interval_ms", self.bomber_fire_interval_ms)?;
        positive("power_up_interval_ms", self.power_up_interval_ms)?;
        positive("explosion_duration", self.explosion_duration as f64)?;
        positive("sim_step_ms", self.sim_step_ms)?;
        positive("max_frame_delta_ms", self.max_frame_delta_ms)?;
        non_negative("frame_throttle_ms", self.frame_throttle_ms)?;
        probability("shield_base_chance", self.shield_base_chance)?;
        probability("shield_chance_per_level", self.shield_chance_per_level)?;
        probability("shield_pulse_chance_per_level", self.shield_pulse_chance_per_level)?;
        if self.grid_columns == 0 {
            return Err(invalid("grid_columns", "must be at least 1"));
        }
        if self.max_enemy_speed < self.initial_enemy_speed {
            return Err(invalid(
                "max_enemy_speed",
                format!(
                    "{} is below initial_enemy_speed {}",
                    self.max_enemy_speed, self.initial_enemy_speed
                ),
            ));
        }
        if self.player_width >= self.width {
            return Err(invalid("player_width", "must be narrower than the surface"));
        }
        Ok(())
    }

    /// Top edge of the player ship.
    pub fn player_y(&self) -> f32 {
        self.height - self.player_bottom_margin
    }

    /// Simulation step in seconds.
    pub fn sim_dt(&self) -> f32 {
        (self.sim_step_ms / 1000.0) as f32
    }
}

// ── Memory Maze ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeConfig {
    pub grid_size: usize,
    pub cell_size: f32,
    pub cell_gap: f32,
    pub initial_sequence_length: usize,
    pub sequence_increase: usize,
    /// Full on+off period for one highlighted cell during playback.
    pub show_interval_ms: f64,
    pub start_delay_ms: f64,
    pub next_round_delay_ms: f64,
    pub input_flash_ms: f64,
    pub touch_cooldown_ms: f64,
}

impl Default for MazeConfig {
    fn default() -> Self {
        MazeConfig {
            grid_size: 5,
            cell_size: 60.0,
            cell_gap: 10.0,
            initial_sequence_length: 3,
            sequence_increase: 1,
            show_interval_ms: 600.0,
            start_delay_ms: 1000.0,
            next_round_delay_ms: 1000.0,
            input_flash_ms: 300.0,
            touch_cooldown_ms: 300.0,
        }
    }
}

impl MazeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: MazeConfig = read_json(path)?;
        config.validate()?;
        info!(path = %path.display(), "loaded maze config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(invalid("grid_size", "must be at least 1"));
        }
        if self.initial_sequence_length == 0 {
            return Err(invalid("initial_sequence_length", "must be at least 1"));
        }
        positive("cell_size", self.cell_size as f64)?;
        positive("show_interval_ms", self.show_interval_ms)?;
        if self.cell_gap < 0.0 {
            return Err(invalid("cell_gap", "must not be negative"));
        }
        Ok(())
    }

    /// Side length of the square surface: 5 × 60 + 4 × 10 = 340 by default.
    pub fn surface_size(&self) -> f32 {
        self.grid_size as f32 * self.cell_size + (self.grid_size as f32 - 1.0) * self.cell_gap
    }

    pub fn cell_count(&self) -> usize {
        self.grid_size * self.grid_size
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("must be zero or more, got {value}")))
    }
}

fn probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("must be within 0..=1, got {value}")))
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
