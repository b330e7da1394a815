/// Entity factories: the enemy grid and bomber wave for a level.

use rand::Rng;

use crate::config::GameConfig;
use crate::entities::{Bomber, Enemy, GameObject};

/// Monotonic id source shared by every enemy and bomber in a session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        IdGenerator { next: 1 }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn peek(&self) -> u64 {
        self.next
    }
}

// ── Level tables ─────────────────────────────────────────────────────────────

/// 3 rows, plus one more at levels 3, 5 and 7.
pub fn enemy_rows(level: u32) -> usize {
    3 + (level >= 3) as usize + (level >= 5) as usize + (level >= 7) as usize
}

pub fn enemy_count(level: u32, columns: usize) -> usize {
    enemy_rows(level) * columns
}

/// No bombers on level 1, then one more every three levels up to `cap`.
pub fn bomber_count(level: u32, cap: usize) -> usize {
    if level < 2 {
        return 0;
    }
    (((level - 1) / 3) as usize + 1).min(cap)
}

/// Chance that a grid slot becomes a shield enemy (only above level 3).
pub fn shield_chance(level: u32, config: &GameConfig) -> f64 {
    if level <= 3 {
        return 0.0;
    }
    (config.shield_base_chance + (level - 4) as f64 * config.shield_chance_per_level).min(1.0)
}

// ── Factory ──────────────────────────────────────────────────────────────────

pub fn create_enemies(
    level: u32,
    config: &GameConfig,
    ids: &mut IdGenerator,
    rng: &mut impl Rng,
) -> (Vec<Enemy>, Vec<Bomber>) {
    let rows = enemy_rows(level);
    let columns = config.grid_columns;
    let grid_width = (columns as f32 - 1.0) * config.cell_pitch_x + config.enemy_width;
    let left = ((config.width - grid_width) / 2.0).max(0.0);
    let chance = shield_chance(level, config);

    let mut enemies = Vec::with_capacity(rows * columns);
    for row in 0..rows {
        for col in 0..columns {
            let body = GameObject::new(
                ids.next_id(),
                left + col as f32 * config.cell_pitch_x,
                config.grid_top + row as f32 * config.cell_pitch_y,
                config.enemy_width,
                config.enemy_height,
            );
            let enemy = if chance > 0.0 && rng.gen_bool(chance) {
                Enemy::shielded(body)
            } else {
                Enemy::regular(body)
            };
            enemies.push(enemy);
        }
    }

    let count = bomber_count(level, config.bomber_max_count);
    let bomber_y = config.top_bar_height + 5.0;
    let bombers = (0..count)
        .map(|i| {
            let slot = config.width * (i as f32 + 1.0) / (count as f32 + 1.0);
            let direction = if i % 2 == 0 { 1.0 } else { -1.0 };
            Bomber {
                body: GameObject::new(
                    ids.next_id(),
                    slot - config.bomber_width / 2.0,
                    bomber_y,
                    config.bomber_width,
                    config.bomber_height,
                ),
                dx: config.bomber_speed * direction,
            }
        })
        .collect();

    (enemies, bombers)
}
