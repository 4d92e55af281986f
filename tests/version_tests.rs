use predicates::prelude::*;
use test_env::{abroad_cmd, setup_test_env};

#[test]
fn test_version_command() {
    let (temp_dir, _guard) = setup_test_env();

    abroad_cmd(&temp_dir)
        .args(["--version"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));

    abroad_cmd(&temp_dir)
        .args(["-V"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_commands() {
    let (temp_dir, _guard) = setup_test_env();

    abroad_cmd(&temp_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("leads"))
        .stdout(predicate::str::contains("dashboard"));
}
