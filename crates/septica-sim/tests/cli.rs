use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn write_config(dir: &Path, players: u8) -> std::path::PathBuf {
    let yaml = format!(
        r#"
run_id: "cli"
games:
  seed: 11
  count: 2
  players: {players}
agents:
  - name: "dice"
    kind: "random"
  - name: "miser"
    kind: "greedy"
outputs:
  jsonl: "{out}/{{run_id}}/games.jsonl"
  summary_md: "{out}/{{run_id}}/summary.md"
"#,
        out = dir.join("out").display(),
    );
    let path = dir.join("sim.yaml");
    fs::write(&path, yaml).expect("config written");
    path
}

#[test]
fn validate_only_skips_the_run() {
    let dir = tempdir().expect("temp dir");
    let config = write_config(dir.path(), 2);

    Command::cargo_bin("septica-sim")
        .expect("binary built")
        .arg("--config")
        .arg(&config)
        .arg("--validate-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded configuration 'cli'"))
        .stdout(predicate::str::contains("Validation-only mode"));

    assert!(!dir.path().join("out").exists());
}

#[test]
fn overrides_apply_before_the_run() {
    let dir = tempdir().expect("temp dir");
    let config = write_config(dir.path(), 2);

    Command::cargo_bin("septica-sim")
        .expect("binary built")
        .arg("--config")
        .arg(&config)
        .args(["--run-id", "override", "--games", "3", "--players", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(3 games, 4 players)"))
        .stdout(predicate::str::contains("3 games → 12 rows"));

    let jsonl = dir.path().join("out").join("override").join("games.jsonl");
    let rows = fs::read_to_string(jsonl).expect("rows written");
    assert_eq!(rows.lines().count(), 12);
}

#[test]
fn invalid_override_is_rejected() {
    let dir = tempdir().expect("temp dir");
    let config = write_config(dir.path(), 2);

    Command::cargo_bin("septica-sim")
        .expect("binary built")
        .arg("--config")
        .arg(&config)
        .args(["--players", "5", "--validate-only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("games.players"));
}

#[test]
fn missing_config_reports_the_path() {
    Command::cargo_bin("septica-sim")
        .expect("binary built")
        .args(["--config", "no/such/sim.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config"));
}
