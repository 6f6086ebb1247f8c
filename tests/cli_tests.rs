mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use support::write_config;

fn epaywatch() -> Command {
    let mut cmd = Command::cargo_bin("epaywatch").expect("binary built");
    cmd.env_remove("TELEGRAM_BOT_TOKEN").env_remove("RUST_LOG");
    cmd
}

fn database_config(dir: &tempfile::TempDir) -> String {
    format!(
        "[database]\npath = \"{}\"\n",
        dir.path().join("ledger.db").display()
    )
}

#[test]
fn missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    epaywatch()
        .current_dir(dir.path())
        .args(["subscribers", "--config", "does-not-exist.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn invalid_config_reports_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[polling]\nerror_threshold = 0\n");

    epaywatch()
        .arg("--config")
        .arg(&path)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("polling.error_threshold"));
}

#[test]
fn subscribers_on_fresh_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, &database_config(&dir));

    epaywatch()
        .arg("subscribers")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("No active subscribers"));
}

#[test]
fn subscribers_json_is_an_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, &database_config(&dir));

    epaywatch()
        .args(["subscribers", "--all", "--json", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[]"));
}

#[test]
fn prune_reports_removed_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, &database_config(&dir));

    epaywatch()
        .args(["prune", "--days", "30", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Removed 0 notification record(s) older than 30 days",
        ));
}

#[test]
fn prune_rejects_zero_days() {
    epaywatch()
        .args(["prune", "--days", "0"])
        .assert()
        .failure();
}
