use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_help_lists_options() {
    let mut cmd = Command::new(cargo_bin!("dexwatch"));
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--bot-token"))
        .stdout(predicate::str::contains("--db-path"))
        .stdout(predicate::str::contains("--poll-interval-secs"));
}

#[test]
fn test_missing_bot_token_is_rejected() {
    let mut cmd = Command::new(cargo_bin!("dexwatch"));
    cmd.env_remove("TELEGRAM_BOT_TOKEN");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--bot-token"));
}

#[test]
fn test_zero_fetch_attempts_is_rejected() {
    let mut cmd = Command::new(cargo_bin!("dexwatch"));
    cmd.args(["--bot-token", "TOKEN", "--fetch-attempts", "0"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--fetch-attempts"));
}
