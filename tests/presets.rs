//! Preset and settings files on disk.

use std::fs;

use debris::game::SimWorld;
use debris::{ConfigError, PresetError, PresetRegistry, SimConfig, Vec2};
use tempfile::TempDir;

const BASE: &str = include_str!("../data/base.ron");

#[test]
fn test_shipped_presets_are_complete() {
    let mut presets = PresetRegistry::new();
    let count = presets.load_str(BASE).unwrap();
    assert_eq!(count, presets.len());
    assert!(presets.missing_references().is_empty());
    assert_eq!(presets.modules(), ["Base".to_string()]);
}

#[test]
fn test_load_dir_orders_modules_and_skips_broken_files() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("a_base.ron"),
        r#"PresetFile(module: "Base", presets: [(class: "MOSRotating", name: "Crate", body: (mass: 5.0))])"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("b_mod.ron"),
        r#"PresetFile(module: "Mod", presets: [(class: "MOSRotating", name: "Crate", body: (mass: 50.0))])"#,
    )
    .unwrap();
    fs::write(dir.path().join("c_broken.ron"), "PresetFile(module: ").unwrap();
    fs::write(dir.path().join("notes.txt"), "not a preset").unwrap();

    let mut presets = PresetRegistry::new();
    assert_eq!(presets.load_dir(dir.path()).unwrap(), 2);
    assert_eq!(presets.modules(), ["Base".to_string(), "Mod".to_string()]);

    let newest = presets.get_entity_preset("MOSRotating", "Crate", None).unwrap();
    assert_eq!(newest.body.mass, 50.0);
    let base = presets.get_entity_preset("MOSRotating", "Crate", Some("Base")).unwrap();
    assert_eq!(base.body.mass, 5.0);
}

#[test]
fn test_load_file_reports_io_and_parse_errors() {
    let dir = TempDir::new().unwrap();
    let mut presets = PresetRegistry::new();

    let missing = dir.path().join("nope.ron");
    assert!(matches!(presets.load_file(&missing), Err(PresetError::Io { .. })));

    let broken = dir.path().join("broken.ron");
    fs::write(&broken, "PresetFile(module: 3)").unwrap();
    assert!(matches!(presets.load_file(&broken), Err(PresetError::Parse(_))));
}

#[test]
fn test_missing_mounted_device_leaves_turret_empty() {
    let mut presets = PresetRegistry::new();
    presets
        .load_str(
            r#"PresetFile(module: "Base", presets: [
                (class: "Turret", name: "Bare", turret: (mounted: Some((class: "HeldDevice", name: "Lost")))),
                (class: "Leg", name: "Stump", leg: (foot: Some((class: "Attachable", name: "Lost")))),
            ])"#,
        )
        .unwrap();
    assert_eq!(presets.missing_references().len(), 2);

    let mut world = SimWorld::with_presets(SimConfig::default(), presets);
    let turret = world.spawn("Turret", "Bare", None, Vec2::new(100.0, 50.0)).unwrap();
    let leg = world.spawn("Leg", "Stump", None, Vec2::new(140.0, 50.0)).unwrap();
    world.run(5);

    let turret = world.movables.find(turret).unwrap();
    assert!(turret.mounted().is_none());
    assert_eq!(turret.tree_size(), 1);
    let leg = world.movables.find(leg).unwrap();
    assert!(leg.leg().is_some());
    assert_eq!(leg.tree_size(), 1);
}

#[test]
fn test_spawn_places_whole_tree() {
    let mut presets = PresetRegistry::new();
    presets.load_str(BASE).unwrap();
    let mut world = SimWorld::with_presets(SimConfig::default(), presets);
    let id = world.spawn("Actor", "Crab", None, Vec2::new(200.0, 100.0)).unwrap();
    world.step();

    let crab = world.movables.find(id).unwrap();
    for part in crab.children() {
        assert!((part.pos - crab.pos).magnitude() < 24.0);
    }
}

#[test]
fn test_settings_file_round_trip_and_validation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sim.ron");

    fs::write(&path, "(delta_time: 0.02, seed: 7)").unwrap();
    let config = SimConfig::load(&path).unwrap();
    assert_eq!(config.delta_time, 0.02);
    assert_eq!(config.seed, 7);
    assert_eq!(config.scene_width, SimConfig::default().scene_width);

    fs::write(&path, config.to_ron_string()).unwrap();
    assert_eq!(SimConfig::load(&path).unwrap().seed, 7);

    fs::write(&path, "(delta_time: -1.0)").unwrap();
    assert!(matches!(
        SimConfig::load(&path),
        Err(ConfigError::Invalid { field: "delta_time", .. })
    ));
}
