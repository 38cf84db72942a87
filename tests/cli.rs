//! Command line behaviour that needs no macOS tooling.

use assert_cmd::Command;
use predicates::prelude::*;

fn bundler() -> Command {
    let mut cmd = Command::cargo_bin("kodegen_bundler_mac").unwrap();
    for var in [
        "CSC_LINK",
        "CSC_KEY_PASSWORD",
        "CSC_INSTALLER_LINK",
        "CSC_INSTALLER_KEY_PASSWORD",
        "CSA_LINK",
        "CSC_NAME",
        "CSC_INSTALLER_NAME",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn unknown_target_is_rejected_before_reading_the_manifest() {
    let dir = tempfile::tempdir().unwrap();
    bundler()
        .current_dir(dir.path())
        .args(["--app", "Missing.app", "--target", "dmg,bogus"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Unknown target: bogus"));

    assert!(!dir.path().join("dist").exists());
}

#[test]
fn missing_manifest_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    bundler()
        .current_dir(dir.path())
        .args(["--app", "Missing.app", "--target", "zip"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to load manifest Cargo.toml"));
}

#[test]
fn missing_bundle_fails_and_produces_nothing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Cargo.toml"),
        "[package]\nname = \"my-app\"\nversion = \"1.0.0\"\n",
    )
    .unwrap();

    bundler()
        .current_dir(dir.path())
        .args(["--app", "Missing.app", "--target", "zip"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("App bundle not found"));

    assert!(!dir.path().join("dist/my-app-darwin-x64/Missing.app").exists());
}

#[test]
fn help_lists_targets() {
    bundler()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("dmg").and(predicate::str::contains("mas")));
}
