//! Scenario files on disk through to a finished run.

use std::fs;

use gridwar_headless::{HeadlessRunner, Scenario, ScenarioError};

const SCENARIO: &str = r#"(
    name: "File Siege",
    ticks: 400,
    delta: 50,
    config: (
        grid_width: 12,
        grid_height: 8,
        seed: 11,
        terrain: Uniform(Grass),
    ),
    players: [
        (
            name: "user",
            units: [
                (kind: ControlTower, x: 1, y: 4, resources: 400),
                (kind: GunTower, x: 3, y: 4),
            ],
        ),
        (
            name: "mobs",
            units: [(kind: Mob, x: 10, y: 4)],
            spawns: Some((at: Some((11, 0)))),
        ),
    ],
)"#;

#[test]
fn test_load_and_run_scenario_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("siege.ron");
    fs::write(&path, SCENARIO).unwrap();

    let scenario = Scenario::load(&path).unwrap();
    assert_eq!(scenario.name, "File Siege");
    assert_eq!(scenario.config.grid_width, 12);

    let summary = HeadlessRunner::new(scenario.clone()).unwrap().run();
    assert_eq!(summary.ticks, 400);
    assert_eq!(summary.seed, 11);
    // 20000 time units at one spawn per 5000.
    assert_eq!(summary.spawned, 4);

    let again = HeadlessRunner::new(scenario).unwrap().run();
    assert_eq!(summary, again);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Scenario::load(dir.path().join("nope.ron"));
    assert!(matches!(result, Err(ScenarioError::FileNotFound(_))));
}

#[test]
fn test_bad_config_is_rejected_at_build() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.ron");
    fs::write(&path, "(config: (grid_width: 0))").unwrap();

    let scenario = Scenario::load(&path).unwrap();
    assert!(matches!(
        HeadlessRunner::new(scenario),
        Err(ScenarioError::Setup(_))
    ));
}
