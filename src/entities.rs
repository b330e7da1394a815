/// All game entity types: plain data plus bounding boxes, no game logic.

use crate::geometry::{Bounded, Rect};
use crate::pool::BulletPool;
use crate::positions::PositionStore;
use crate::spawn::IdGenerator;

// ── Base shape ───────────────────────────────────────────────────────────────

/// An axis-aligned rectangle with identity.  Every simulated thing
/// (bullet, enemy, bomb, power-up) is built on one.
#[derive(Clone, Debug, PartialEq)]
pub struct GameObject {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub active: bool,
}

impl GameObject {
    pub fn new(id: u64, x: f32, y: f32, width: f32, height: f32) -> Self {
        GameObject {
            id,
            x,
            y,
            width,
            height,
            active: true,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

impl Bounded for GameObject {
    fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

// ── Player ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerUpKind {
    DoubleBullets,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Horizontal velocity in px/s, set by input.
    pub dx: f32,
    pub power_up: Option<PowerUpKind>,
    /// Seconds left on the active power-up.
    pub power_up_remaining: f32,
}

impl Player {
    pub fn has_double_bullets(&self) -> bool {
        self.power_up == Some(PowerUpKind::DoubleBullets)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

impl Bounded for Player {
    fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

// ── Enemies ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnemyKind {
    Regular,
    Shield,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub body: GameObject,
    pub kind: EnemyKind,
    pub health: u8,
    pub shield_active: bool,
    /// Seconds left on a shield borrowed from a nearby shield enemy.
    pub pulse_remaining: Option<f32>,
}

impl Enemy {
    pub fn regular(body: GameObject) -> Self {
        Enemy {
            body,
            kind: EnemyKind::Regular,
            health: 1,
            shield_active: false,
            pulse_remaining: None,
        }
    }

    pub fn shielded(body: GameObject) -> Self {
        Enemy {
            body,
            kind: EnemyKind::Shield,
            health: 2,
            shield_active: true,
            pulse_remaining: None,
        }
    }
}

impl Bounded for Enemy {
    fn bounds(&self) -> Rect {
        self.body.bounds()
    }
}

/// Patrols horizontally near the top and drops bombs.  One hit kills it.
#[derive(Clone, Debug, PartialEq)]
pub struct Bomber {
    pub body: GameObject,
    /// Horizontal velocity in px/s; the sign flips at the screen edges.
    pub dx: f32,
}

impl Bounded for Bomber {
    fn bounds(&self) -> Rect {
        self.body.bounds()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PowerUp {
    pub body: GameObject,
    pub kind: PowerUpKind,
}

impl Bounded for PowerUp {
    fn bounds(&self) -> Rect {
        self.body.bounds()
    }
}

// ── Effects ──────────────────────────────────────────────────────────────────

/// The player's death animation.  Created once when the game ends and
/// dropped when it has fully faded.
#[derive(Clone, Debug, PartialEq)]
pub struct Explosion {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub max_radius: f32,
    pub alpha: f32,
    /// Seconds since the explosion started.
    pub elapsed: f32,
}

impl Explosion {
    pub fn new(x: f32, y: f32, max_radius: f32) -> Self {
        Explosion {
            x,
            y,
            radius: 0.0,
            max_radius,
            alpha: 1.0,
            elapsed: 0.0,
        }
    }
}

// ── Timers ───────────────────────────────────────────────────────────────────

/// Interval timers, all measured against the simulation clock.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timers {
    /// Milliseconds of simulated play in the current level.
    pub clock_ms: f64,
    pub last_enemy_move_ms: f64,
    pub last_bomber_fire_ms: f64,
    pub last_enemy_fire_ms: f64,
    pub last_power_up_ms: f64,
}

// ── Master game state ────────────────────────────────────────────────────────

/// The aggregate root.  Exactly one exists per session; starting a new game
/// or a new level replaces it wholesale.
#[derive(Clone, Debug, Default)]
pub struct GameState {
    pub player: Player,
    pub bullets: BulletPool,
    pub enemy_bullets: Vec<GameObject>,
    pub enemies: Vec<Enemy>,
    pub bombers: Vec<Bomber>,
    pub bomber_bombs: Vec<GameObject>,
    pub power_ups: Vec<PowerUp>,
    pub score: u32,
    pub bonus_score: u32,
    pub game_over: bool,
    /// Set when the last enemy falls; the simulation is frozen until the
    /// next level replaces this state.
    pub level_transition: bool,
    pub total_shots: u32,
    pub hit_shots: u32,
    pub level: u32,
    /// +1.0 marching right, -1.0 marching left.
    pub enemy_direction: f32,
    pub enemy_speed: f32,
    pub explosion: Option<Explosion>,
    /// Monotonic timestamp of the last accepted shot.
    pub last_fire_ms: Option<f64>,
    pub timers: Timers,
    /// Session-wide id source, carried across levels.
    pub ids: IdGenerator,
    pub positions: PositionStore,
}
