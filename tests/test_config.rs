use std::io::Write;

use approx::assert_relative_eq;
use tempfile::NamedTempFile;

use crusader_arcade::config::{GameConfig, MazeConfig};
use crusader_arcade::error::ConfigError;

fn json_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn defaults_match_the_classic_layout() {
    let c = GameConfig::default();
    assert_eq!((c.width, c.height), (900.0, 640.0));
    assert_eq!(c.grid_columns, 8);
    assert_eq!(c.bomber_max_count, 3);
    assert_relative_eq!(c.player_y(), 600.0);
    assert_relative_eq!(c.sim_dt(), 1.0 / 60.0);
    assert!(c.validate().is_ok());
}

#[test]
fn maze_defaults() {
    let c = MazeConfig::default();
    assert_relative_eq!(c.surface_size(), 340.0);
    assert_eq!(c.cell_count(), 25);
    assert!(c.validate().is_ok());
}

#[test]
fn partial_json_keeps_other_defaults() {
    let file = json_file(r#"{ "width": 1000, "max_enemy_speed": 50 }"#);
    let c = GameConfig::load(file.path()).unwrap();
    assert_eq!(c.width, 1000.0);
    assert_eq!(c.max_enemy_speed, 50.0);
    assert_eq!(c.height, 640.0);
    assert_eq!(c.grid_columns, 8);
}

#[test]
fn maze_json_loads() {
    let file = json_file(r#"{ "grid_size": 4, "show_interval_ms": 400 }"#);
    let c = MazeConfig::load(file.path()).unwrap();
    assert_eq!(c.grid_size, 4);
    assert_eq!(c.cell_count(), 16);
    assert_eq!(c.show_interval_ms, 400.0);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = GameConfig::load(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let file = json_file("{ width: ");
    let err = GameConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("failed to parse config file"));
}

#[test]
fn max_speed_below_initial_is_rejected() {
    let c = GameConfig {
        initial_enemy_speed: 20.0,
        max_enemy_speed: 10.0,
        ..GameConfig::default()
    };
    match c.validate() {
        Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "max_enemy_speed"),
        other => panic!("expected invalid max_enemy_speed, got {other:?}"),
    }
}

#[test]
fn non_positive_values_are_rejected() {
    let c = GameConfig {
        sim_step_ms: 0.0,
        ..GameConfig::default()
    };
    assert!(matches!(
        c.validate(),
        Err(ConfigError::Invalid { field: "sim_step_ms", .. })
    ));

    let file = json_file(r#"{ "grid_columns": 0 }"#);
    assert!(matches!(
        GameConfig::load(file.path()),
        Err(ConfigError::Invalid { field: "grid_columns", .. })
    ));
}

#[test]
fn probabilities_and_speeds_are_checked() {
    let c = GameConfig {
        shield_pulse_chance_per_level: f64::NAN,
        ..GameConfig::default()
    };
    assert!(matches!(
        c.validate(),
        Err(ConfigError::Invalid { field: "shield_pulse_chance_per_level", .. })
    ));

    let c = GameConfig {
        shield_base_chance: 1.5,
        ..GameConfig::default()
    };
    assert!(matches!(
        c.validate(),
        Err(ConfigError::Invalid { field: "shield_base_chance", .. })
    ));

    let c = GameConfig {
        bullet_speed: 0.0,
        ..GameConfig::default()
    };
    assert!(matches!(
        c.validate(),
        Err(ConfigError::Invalid { field: "bullet_speed", .. })
    ));

    let c = GameConfig {
        frame_throttle_ms: -1.0,
        ..GameConfig::default()
    };
    assert!(matches!(
        c.validate(),
        Err(ConfigError::Invalid { field: "frame_throttle_ms", .. })
    ));

    let c = GameConfig {
        frame_throttle_ms: 0.0,
        ..GameConfig::default()
    };
    assert!(c.validate().is_ok());
}

#[test]
fn maze_rejects_an_empty_grid() {
    let c = MazeConfig {
        grid_size: 0,
        ..MazeConfig::default()
    };
    assert!(matches!(
        c.validate(),
        Err(ConfigError::Invalid { field: "grid_size", .. })
    ));
}

#[test]
fn config_round_trips_through_json() {
    let c = GameConfig::default();
    let text = serde_json::to_string(&c).unwrap();
    let back: GameConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, c);
}
