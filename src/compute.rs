/// Game-logic functions for the shooter.
///
/// `new_game` and `advance_level` build a brand-new `GameState`; `step`
/// advances an existing one by a fixed `dt`.  All randomness comes through
/// the injected RNG so a seeded run is fully reproducible.

use std::cmp::Ordering;

use rand::Rng;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::entities::{
    EnemyKind, Explosion, GameObject, GameState, Player, PowerUp, PowerUpKind, Timers,
};
use crate::geometry::{center_distance_sq, collides, Bounded, Rect};
use crate::pool::BulletPool;
use crate::positions::PositionStore;
use crate::spawn::{create_enemies, IdGenerator};

/// What a single `step` call did, for the driver's state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Normal gameplay tick.
    Running,
    /// Nothing changed: level transition pending, or game over with no
    /// explosion left to animate.
    Frozen,
    /// Every enemy and bomber is gone.
    LevelCleared,
    /// The player was hit or the enemy block reached them.
    PlayerDestroyed,
    /// The death explosion is still animating.
    Exploding,
    /// The death explosion just finished; the end screen may be shown.
    ExplosionFinished,
}

// ── Scoring ──────────────────────────────────────────────────────────────────

/// Accuracy bonus: `floor(hits / shots * 1000)`, zero when nothing was fired.
///
/// A double shot can land two kills for one fire action, so accuracy is
/// capped at 1 and the bonus never exceeds 1000.
pub fn bonus_score(hit_shots: u32, total_shots: u32) -> u32 {
    if total_shots == 0 {
        return 0;
    }
    let accuracy = hit_shots as f64 / total_shots as f64;
    if !accuracy.is_finite() {
        return 0;
    }
    (accuracy.min(1.0) * 1000.0).floor() as u32
}

fn points_for(kind: EnemyKind, config: &GameConfig) -> u32 {
    match kind {
        EnemyKind::Regular => config.regular_points,
        EnemyKind::Shield => config.shield_points,
    }
}

/// Enemy fire gets faster with level: `base / sqrt(level)`.
pub fn enemy_fire_interval(level: u32, config: &GameConfig) -> f64 {
    config.enemy_fire_base_interval_ms / (level.max(1) as f64).sqrt()
}

// ── Constructors ─────────────────────────────────────────────────────────────

/// What survives from one level into the next.
struct Carry {
    level: u32,
    score: u32,
    total_shots: u32,
    hit_shots: u32,
    enemy_speed: f32,
    ids: IdGenerator,
    bullets: BulletPool,
    positions: PositionStore,
}

/// Fresh level-1 state.
pub fn new_game(config: &GameConfig, rng: &mut impl Rng) -> GameState {
    build_level(
        Carry {
            level: 1,
            score: 0,
            total_shots: 0,
            hit_shots: 0,
            enemy_speed: config.initial_enemy_speed,
            ids: IdGenerator::new(),
            bullets: BulletPool::new(config.bullet_width, config.bullet_height),
            positions: PositionStore::with_capacity(config.position_store_capacity),
        },
        config,
        rng,
    )
}

/// Replace `prev` with the next level.  Score, shot counters and the id
/// sequence carry over; the enemy block speeds up, capped at the maximum.
pub fn advance_level(prev: GameState, config: &GameConfig, rng: &mut impl Rng) -> GameState {
    let GameState {
        level,
        score,
        total_shots,
        hit_shots,
        enemy_speed,
        ids,
        mut bullets,
        mut positions,
        ..
    } = prev;
    bullets.reset();
    positions.clear();

    // Not `clamp`, which panics when max < initial.
    let enemy_speed = (enemy_speed + config.enemy_speed_increment)
        .min(config.max_enemy_speed)
        .max(config.initial_enemy_speed);
    info!(level = level + 1, enemy_speed, "advancing level");

    build_level(
        Carry {
            level: level + 1,
            score,
            total_shots,
            hit_shots,
            enemy_speed,
            ids,
            bullets,
            positions,
        },
        config,
        rng,
    )
}

fn build_level(carry: Carry, config: &GameConfig, rng: &mut impl Rng) -> GameState {
    let Carry {
        level,
        score,
        total_shots,
        hit_shots,
        enemy_speed,
        mut ids,
        bullets,
        mut positions,
    } = carry;

    let (enemies, bombers) = create_enemies(level, config, &mut ids, rng);
    positions.sync(&enemies, &bombers);

    GameState {
        player: Player {
            x: (config.width - config.player_width) / 2.0,
            y: config.player_y(),
            width: config.player_width,
            height: config.player_height,
            dx: 0.0,
            power_up: None,
            power_up_remaining: 0.0,
        },
        bullets,
        enemy_bullets: Vec::new(),
        enemies,
        bombers,
        bomber_bombs: Vec::new(),
        power_ups: Vec::new(),
        score,
        bonus_score: bonus_score(hit_shots, total_shots),
        game_over: false,
        level_transition: false,
        total_shots,
        hit_shots,
        level,
        enemy_direction: 1.0,
        enemy_speed,
        explosion: None,
        last_fire_ms: None,
        timers: Timers::default(),
        ids,
        positions,
    }
}

/// End the game: freeze play, settle the bonus and start the explosion.
/// Calling it again is a no-op.
pub fn trigger_game_over(state: &mut GameState, config: &GameConfig) {
    if state.game_over {
        return;
    }
    state.game_over = true;
    state.player.dx = 0.0;
    state.bonus_score = bonus_score(state.hit_shots, state.total_shots);
    let (cx, cy) = state.player.center();
    state.explosion = Some(Explosion::new(cx, cy, config.explosion_max_radius));
    info!(
        score = state.score,
        bonus = state.bonus_score,
        level = state.level,
        "game over"
    );
}

// ── Per-tick simulation ──────────────────────────────────────────────────────

/// Advance the simulation by one fixed `dt` (seconds).
///
/// The order below matters: collisions see this tick's movement, and a
/// cleared level ends the tick before enemy fire is considered.
pub fn step(
    state: &mut GameState,
    config: &GameConfig,
    dt: f32,
    rng: &mut impl Rng,
) -> StepOutcome {
    // ── 1. Game over: only the explosion moves ──────────────────────────────
    if state.game_over {
        return advance_explosion(state, config, dt);
    }

    // ── 2. Frozen between levels ────────────────────────────────────────────
    if state.level_transition {
        return StepOutcome::Frozen;
    }

    state.timers.clock_ms += dt as f64 * 1000.0;

    // ── 3. Player ───────────────────────────────────────────────────────────
    update_player(&mut state.player, config, dt);

    // ── 4. Player bullets ───────────────────────────────────────────────────
    advance_player_bullets(&mut state.bullets, config, dt);

    // ── 5. Enemy block march ────────────────────────────────────────────────
    if march_enemies(state, config) {
        trigger_game_over(state, config);
        return StepOutcome::PlayerDestroyed;
    }

    // ── 6. Bombers ──────────────────────────────────────────────────────────
    update_bombers(state, config, dt, rng);

    // ── 7. Falling bombs and power-ups ──────────────────────────────────────
    advance_falling(state, config, dt);

    // ── 8. Bullet hits ──────────────────────────────────────────────────────
    resolve_bullet_hits(state, config);

    // ── 9. Power-up pickup ──────────────────────────────────────────────────
    collect_power_ups(state, config);

    // ── 10. Level cleared ───────────────────────────────────────────────────
    if state.enemies.is_empty() && state.bombers.is_empty() {
        state.level_transition = true;
        info!(level = state.level, score = state.score, "level cleared");
        return StepOutcome::LevelCleared;
    }

    // ── 11. Enemy bullets ───────────────────────────────────────────────────
    let speed = config.enemy_bullet_speed * dt;
    for bullet in &mut state.enemy_bullets {
        bullet.y += speed;
    }
    state.enemy_bullets.retain(|b| b.y < config.height);

    // ── 12. Player hit ──────────────────────────────────────────────────────
    let hit = state
        .enemy_bullets
        .iter()
        .chain(state.bomber_bombs.iter())
        .any(|p| collides(p, &state.player));
    if hit {
        trigger_game_over(state, config);
        return StepOutcome::PlayerDestroyed;
    }

    // ── 13. Enemy fire ──────────────────────────────────────────────────────
    enemy_fire(state, config, rng);

    // ── 14. Power-up spawn ──────────────────────────────────────────────────
    spawn_power_up(state, config, rng);

    // ── 15. Shield pulse ────────────────────────────────────────────────────
    shield_pulse(state, config, dt, rng);

    StepOutcome::Running
}

fn advance_explosion(state: &mut GameState, config: &GameConfig, dt: f32) -> StepOutcome {
    let Some(explosion) = state.explosion.as_mut() else {
        return StepOutcome::Frozen;
    };
    explosion.elapsed += dt;
    let t = (explosion.elapsed / config.explosion_duration).min(1.0);
    explosion.radius = explosion.max_radius * t;
    explosion.alpha = 1.0 - t;
    if t >= 1.0 {
        state.explosion = None;
        return StepOutcome::ExplosionFinished;
    }
    StepOutcome::Exploding
}

fn update_player(player: &mut Player, config: &GameConfig, dt: f32) {
    let max_x = config.width - player.width;
    player.x = (player.x + player.dx * dt).clamp(0.0, max_x);

    if player.power_up.is_some() {
        player.power_up_remaining -= dt;
        if player.power_up_remaining <= 0.0 {
            player.power_up = None;
            player.power_up_remaining = 0.0;
        }
    }
}

fn advance_player_bullets(bullets: &mut BulletPool, config: &GameConfig, dt: f32) {
    let distance = config.bullet_speed * dt;
    // Walk backwards: a swap-remove only pulls in slots already visited.
    let mut i = bullets.active_count();
    while i > 0 {
        i -= 1;
        let bullet = &mut bullets.active_bullets_mut()[i];
        bullet.y -= distance;
        if bullet.y + bullet.height <= 0.0 {
            bullets.deactivate(i);
        }
    }
}

/// Returns true when the block has reached the player's row.
fn march_enemies(state: &mut GameState, config: &GameConfig) -> bool {
    let timers = &mut state.timers;
    if state.enemies.is_empty()
        || timers.clock_ms - timers.last_enemy_move_ms < config.enemy_move_interval_ms
    {
        return false;
    }
    timers.last_enemy_move_ms = timers.clock_ms;

    let (min_x, max_x) = state
        .enemies
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), e| {
            (lo.min(e.body.x), hi.max(e.body.x + e.body.width))
        });
    let step = state.enemy_speed * state.enemy_direction;
    let move_down = max_x + step > config.width || min_x + step < 0.0;
    if move_down {
        state.enemy_direction = -state.enemy_direction;
    }

    let dx = state.enemy_speed * state.enemy_direction;
    let dy = if move_down { config.enemy_drop } else { 0.0 };
    for (i, enemy) in state.enemies.iter_mut().enumerate() {
        enemy.body.x += dx;
        enemy.body.y += dy;
        state.positions.update_position(i, enemy.body.x, enemy.body.y);
    }

    let player_y = state.player.y;
    state
        .enemies
        .iter()
        .any(|e| e.body.y + e.body.height >= player_y)
}

fn update_bombers(state: &mut GameState, config: &GameConfig, dt: f32, rng: &mut impl Rng) {
    let offset = state.enemies.len();
    for (i, bomber) in state.bombers.iter_mut().enumerate() {
        let body = &mut bomber.body;
        body.x += bomber.dx * dt;
        if body.x < 0.0 {
            body.x = 0.0;
            bomber.dx = bomber.dx.abs();
        } else if body.x + body.width > config.width {
            body.x = config.width - body.width;
            bomber.dx = -bomber.dx.abs();
        }
        if body.y < config.top_bar_height {
            body.y = config.top_bar_height;
        }
        state.positions.update_position(offset + i, body.x, body.y);
    }

    let timers = &mut state.timers;
    if state.bombers.is_empty()
        || timers.clock_ms - timers.last_bomber_fire_ms < config.bomber_fire_interval_ms
    {
        return;
    }
    timers.last_bomber_fire_ms = timers.clock_ms;

    let shooter = &state.bombers[rng.gen_range(0..state.bombers.len())].body;
    let bomb = GameObject::new(
        state.ids.next_id(),
        shooter.center_x() - config.bomb_width / 2.0,
        shooter.y + shooter.height,
        config.bomb_width,
        config.bomb_height,
    );
    state.bomber_bombs.push(bomb);
}

fn advance_falling(state: &mut GameState, config: &GameConfig, dt: f32) {
    let bomb_step = config.bomb_speed * dt;
    for bomb in &mut state.bomber_bombs {
        bomb.y += bomb_step;
    }
    state.bomber_bombs.retain(|b| b.y < config.height);

    let power_up_step = config.power_up_speed * dt;
    for power_up in &mut state.power_ups {
        power_up.body.y += power_up_step;
    }
    state.power_ups.retain(|p| p.body.y < config.height);
}

/// Index of the overlapping target nearest to `rect`; ties go to the
/// earliest target.
fn nearest_hit<T: Bounded>(rect: &Rect, targets: &[T]) -> Option<usize> {
    targets
        .iter()
        .enumerate()
        .filter(|(_, t)| t.bounds().overlaps(rect))
        .min_by(|(_, a), (_, b)| {
            center_distance_sq(*a, rect)
                .partial_cmp(&center_distance_sq(*b, rect))
                .unwrap_or(Ordering::Equal)
        })
        .map(|(i, _)| i)
}

/// Each bullet lands at most one hit.  Enemies are checked before bombers.
fn resolve_bullet_hits(state: &mut GameState, config: &GameConfig) {
    let mut roster_changed = false;

    let mut i = state.bullets.active_count();
    while i > 0 {
        i -= 1;
        let rect = state.bullets.active_bullets()[i].bounds();

        if let Some(ei) = nearest_hit(&rect, &state.enemies) {
            state.bullets.deactivate(i);
            let enemy = &mut state.enemies[ei];
            enemy.health = enemy.health.saturating_sub(1);
            if enemy.health == 0 {
                state.score += points_for(enemy.kind, config);
                state.hit_shots += 1;
                debug!(id = enemy.body.id, score = state.score, "enemy destroyed");
                state.enemies.remove(ei);
                roster_changed = true;
            } else {
                enemy.shield_active = false;
                enemy.pulse_remaining = None;
            }
            continue;
        }

        if let Some(bi) = nearest_hit(&rect, &state.bombers) {
            state.bullets.deactivate(i);
            state.score += config.bomber_points;
            state.hit_shots += 1;
            debug!(id = state.bombers[bi].body.id, score = state.score, "bomber destroyed");
            state.bombers.remove(bi);
            roster_changed = true;
        }
    }

    if roster_changed {
        state.positions.sync(&state.enemies, &state.bombers);
    }
}

fn collect_power_ups(state: &mut GameState, config: &GameConfig) {
    let player = &state.player;
    let mut picked = None;
    state.power_ups.retain(|p| {
        if collides(p, player) {
            picked = Some(p.kind);
            false
        } else {
            true
        }
    });
    if let Some(kind) = picked {
        state.player.power_up = Some(kind);
        state.player.power_up_remaining = config.power_up_duration;
    }
}

fn enemy_fire(state: &mut GameState, config: &GameConfig, rng: &mut impl Rng) {
    let timers = &mut state.timers;
    if state.enemies.is_empty()
        || timers.clock_ms - timers.last_enemy_fire_ms < enemy_fire_interval(state.level, config)
    {
        return;
    }
    timers.last_enemy_fire_ms = timers.clock_ms;

    let shooter = &state.enemies[rng.gen_range(0..state.enemies.len())].body;
    let bullet = GameObject::new(
        state.ids.next_id(),
        shooter.center_x() - config.enemy_bullet_width / 2.0,
        shooter.y + shooter.height,
        config.enemy_bullet_width,
        config.enemy_bullet_height,
    );
    state.enemy_bullets.push(bullet);
}

fn spawn_power_up(state: &mut GameState, config: &GameConfig, rng: &mut impl Rng) {
    let timers = &mut state.timers;
    if timers.clock_ms - timers.last_power_up_ms < config.power_up_interval_ms {
        return;
    }
    timers.last_power_up_ms = timers.clock_ms;

    let max_x = (config.width - config.power_up_size).max(0.0);
    let x = rng.gen_range(0.0..=max_x);
    state.power_ups.push(PowerUp {
        body: GameObject::new(
            state.ids.next_id(),
            x,
            config.top_bar_height,
            config.power_up_size,
            config.power_up_size,
        ),
        kind: PowerUpKind::DoubleBullets,
    });
}

/// Borrowed shields wear off; at higher levels a shield enemy may lend its
/// shield to regular neighbours.
fn shield_pulse(state: &mut GameState, config: &GameConfig, dt: f32, rng: &mut impl Rng) {
    for enemy in &mut state.enemies {
        if let Some(left) = enemy.pulse_remaining.as_mut() {
            *left -= dt;
            if *left <= 0.0 {
                enemy.pulse_remaining = None;
                if enemy.kind == EnemyKind::Regular {
                    enemy.health = enemy.health.min(1);
                    enemy.shield_active = false;
                }
            }
        }
    }

    if state.level < config.shield_pulse_min_level {
        return;
    }
    let chance = config.shield_pulse_chance_per_level * state.level as f64;
    if !chance.is_finite() || !rng.gen_bool(chance.clamp(0.0, 1.0)) {
        return;
    }

    let sources: Vec<Rect> = state
        .enemies
        .iter()
        .filter(|e| e.kind == EnemyKind::Shield && e.shield_active)
        .map(|e| e.bounds())
        .collect();
    if sources.is_empty() {
        return;
    }
    let origin = sources[rng.gen_range(0..sources.len())];
    let radius_sq = config.shield_pulse_radius * config.shield_pulse_radius;

    let mut lent = 0;
    for enemy in &mut state.enemies {
        if enemy.kind == EnemyKind::Regular
            && !enemy.shield_active
            && center_distance_sq(&enemy.body, &origin) <= radius_sq
        {
            enemy.health = 2;
            enemy.shield_active = true;
            enemy.pulse_remaining = Some(config.shield_pulse_duration);
            lent += 1;
        }
    }
    debug!(lent, "shield pulse");
}
