use rand::rngs::StdRng;
use rand::SeedableRng;

use crusader_arcade::config::GameConfig;
use crusader_arcade::entities::*;
use crusader_arcade::geometry::{collides, Bounded, Rect};
use crusader_arcade::pool::BulletPool;
use crusader_arcade::positions::PositionStore;
use crusader_arcade::spawn::*;

// ── Geometry ──────────────────────────────────────────────────────────────────

#[test]
fn overlapping_rects_collide() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(5.0, 5.0, 10.0, 10.0);
    assert!(a.overlaps(&b));
    assert!(b.overlaps(&a));
    assert!(collides(&a, &b));
}

#[test]
fn shared_edges_and_corners_do_not_collide() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(!a.overlaps(&Rect::new(10.0, 0.0, 10.0, 10.0)));
    assert!(!a.overlaps(&Rect::new(0.0, 10.0, 10.0, 10.0)));
    assert!(!a.overlaps(&Rect::new(10.0, 10.0, 5.0, 5.0)));
}

#[test]
fn game_object_bounds_match_fields() {
    let o = GameObject::new(3, 1.0, 2.0, 3.0, 4.0);
    assert!(o.active);
    assert_eq!(o.bounds(), Rect::new(1.0, 2.0, 3.0, 4.0));
    assert_eq!(o.center_x(), 2.5);
}

// ── Enemies ───────────────────────────────────────────────────────────────────

#[test]
fn enemy_constructors_set_health_and_shield() {
    let body = GameObject::new(1, 0.0, 0.0, 40.0, 30.0);
    let regular = Enemy::regular(body.clone());
    assert_eq!(regular.kind, EnemyKind::Regular);
    assert_eq!(regular.health, 1);
    assert!(!regular.shield_active);

    let shield = Enemy::shielded(body);
    assert_eq!(shield.kind, EnemyKind::Shield);
    assert_eq!(shield.health, 2);
    assert!(shield.shield_active);
}

// ── BulletPool ────────────────────────────────────────────────────────────────

#[test]
fn pool_reuses_parked_slots() {
    let mut pool = BulletPool::new(4.0, 12.0);
    pool.create(1.0, 1.0);
    pool.deactivate(0);
    pool.create(2.0, 2.0);

    assert_eq!(pool.active_count(), 1);
    assert_eq!(pool.capacity(), 1);
    let bullet = &pool.active_bullets()[0];
    assert_eq!((bullet.x, bullet.y), (2.0, 2.0));
    assert!(bullet.active);
}

#[test]
fn pool_grows_on_demand_and_swap_removes() {
    let mut pool = BulletPool::new(4.0, 12.0);
    for i in 0..5 {
        pool.create(i as f32, 0.0);
    }
    assert_eq!(pool.capacity(), 5);

    pool.deactivate(1);
    assert_eq!(pool.active_count(), 4);
    // The last active bullet moved into the freed slot.
    assert_eq!(pool.active_bullets()[1].x, 4.0);
    let xs: Vec<f32> = pool.active_bullets().iter().map(|b| b.x).collect();
    assert!(!xs.contains(&1.0));
}

#[test]
fn pool_ignores_out_of_range_deactivate() {
    let mut pool = BulletPool::new(4.0, 12.0);
    pool.create(0.0, 0.0);
    pool.deactivate(5);
    assert_eq!(pool.active_count(), 1);
}

#[test]
fn pool_reset_parks_everything() {
    let mut pool = BulletPool::new(4.0, 12.0);
    pool.create(0.0, 0.0);
    pool.create(0.0, 0.0);
    pool.reset();
    assert_eq!(pool.active_count(), 0);
    assert!(pool.active_bullets().is_empty());
    assert_eq!(pool.capacity(), 2);
}

// ── PositionStore ─────────────────────────────────────────────────────────────

#[test]
fn position_store_add_and_update() {
    let mut store = PositionStore::with_capacity(2);
    assert_eq!(store.add_entity(1.0, 2.0), Some(0));
    assert_eq!(store.add_entity(3.0, 4.0), Some(1));
    assert_eq!(store.add_entity(5.0, 6.0), None);

    store.update_position(1, 7.0, 8.0);
    assert_eq!(store.position(1), Some((7.0, 8.0)));
    store.update_position(9, 0.0, 0.0);
    assert_eq!(store.position(9), None);

    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.capacity(), 2);
}

#[test]
fn position_store_stays_aligned_with_entities() {
    let config = GameConfig::default();
    let mut rng = StdRng::seed_from_u64(3);
    let mut ids = IdGenerator::new();
    let (enemies, bombers) = create_enemies(5, &config, &mut ids, &mut rng);

    let mut store = PositionStore::with_capacity(256);
    store.sync(&enemies, &bombers);

    assert_eq!(store.len(), enemies.len() + bombers.len());
    for (i, e) in enemies.iter().enumerate() {
        assert_eq!(store.position(i), Some((e.body.x, e.body.y)));
    }
    for (i, b) in bombers.iter().enumerate() {
        assert_eq!(store.position(enemies.len() + i), Some((b.body.x, b.body.y)));
    }
}

#[test]
fn position_store_sync_stops_when_full() {
    let config = GameConfig::default();
    let mut rng = StdRng::seed_from_u64(3);
    let mut ids = IdGenerator::new();
    let (enemies, bombers) = create_enemies(1, &config, &mut ids, &mut rng);

    let mut store = PositionStore::with_capacity(10);
    store.sync(&enemies, &bombers);
    assert_eq!(store.len(), 10);
}

// ── Spawning ──────────────────────────────────────────────────────────────────

#[test]
fn ids_are_monotonic() {
    let mut ids = IdGenerator::new();
    assert_eq!(ids.next_id(), 1);
    assert_eq!(ids.next_id(), 2);
    assert_eq!(ids.peek(), 3);
}

#[test]
fn enemy_counts_by_level() {
    assert_eq!(enemy_count(1, 8), 24);
    assert_eq!(enemy_count(2, 8), 24);
    assert_eq!(enemy_count(3, 8), 32);
    assert_eq!(enemy_count(5, 8), 40);
    assert_eq!(enemy_count(7, 8), 48);
    assert_eq!(enemy_count(20, 8), 48);
}

#[test]
fn bomber_counts_by_level() {
    let counts: Vec<usize> = [1, 2, 5, 8, 11].iter().map(|&l| bomber_count(l, 3)).collect();
    assert_eq!(counts, vec![0, 1, 2, 3, 3]);
}

#[test]
fn no_shields_before_level_four() {
    let config = GameConfig::default();
    assert_eq!(shield_chance(3, &config), 0.0);
    assert!((shield_chance(4, &config) - 0.3).abs() < 1e-9);
    assert_eq!(shield_chance(100, &config), 1.0);

    let mut rng = StdRng::seed_from_u64(11);
    let mut ids = IdGenerator::new();
    let (enemies, _) = create_enemies(3, &config, &mut ids, &mut rng);
    assert!(enemies.iter().all(|e| e.kind == EnemyKind::Regular));
}

#[test]
fn grid_is_centred_and_pitched() {
    let config = GameConfig::default();
    let mut rng = StdRng::seed_from_u64(1);
    let mut ids = IdGenerator::new();
    let (enemies, _) = create_enemies(1, &config, &mut ids, &mut rng);

    // (900 - (7 * 60 + 40)) / 2 = 220
    assert_eq!(enemies[0].body.x, 220.0);
    assert_eq!(enemies[0].body.y, 80.0);
    assert_eq!(enemies[1].body.x, 280.0);
    assert_eq!(enemies[8].body.y, 125.0);

    let ids: Vec<u64> = enemies.iter().map(|e| e.body.id).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn bombers_spread_across_the_top() {
    let config = GameConfig::default();
    let mut rng = StdRng::seed_from_u64(1);
    let mut ids = IdGenerator::new();
    let (_, bombers) = create_enemies(5, &config, &mut ids, &mut rng);

    assert_eq!(bombers.len(), 2);
    assert_eq!(bombers[0].body.x, 300.0 - 25.0);
    assert_eq!(bombers[1].body.x, 600.0 - 25.0);
    assert_eq!(bombers[0].body.y, 45.0);
    assert!(bombers[0].dx > 0.0);
    assert!(bombers[1].dx < 0.0);
}
