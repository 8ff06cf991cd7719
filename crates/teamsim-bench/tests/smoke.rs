use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn bench_binary_reports_a_sampled_team() {
    let dir = tempdir().expect("temp dir");

    let mut cmd = Command::cargo_bin("teamsim-bench").expect("binary exists");
    cmd.args(["--particles", "8", "--seed", "42"])
        .arg("--log-dir")
        .arg(dir.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("total rank"))
        .stdout(predicate::str::contains("Sampled team"));

    assert!(dir.path().join("telemetry.jsonl").exists());
}
