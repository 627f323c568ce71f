use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("bmx").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("bmx"))
        .stdout(predicate::str::contains("data"));
}

#[test]
fn cli_requires_token() {
    let mut cmd = Command::cargo_bin("bmx").unwrap();
    cmd.env_remove("BANXICO_TOKEN")
        .args(["meta", "--series", "SF43718"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("BANXICO_TOKEN"));
}

#[test]
fn cli_rejects_too_many_series_without_network() {
    let series: Vec<String> = (0..21).map(|i| format!("SF{i}")).collect();
    let mut cmd = Command::cargo_bin("bmx").unwrap();
    cmd.env("BANXICO_TOKEN", "dummy")
        .args(["data", "--series", &series.join(",")]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("at most 20"));
}

// Live test (opt-in): BANXICO_TOKEN=... cargo test --features online
#[cfg(feature = "online")]
#[test]
fn fetch_online_latest_fix() {
    let mut cmd = Command::cargo_bin("bmx").unwrap();
    cmd.args(["data", "--series", "SF43718", "--latest", "--stats"]);
    cmd.assert().success();
}
