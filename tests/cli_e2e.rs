//! End-to-end tests for the CLI binary.
//!
//! These run the compiled binary and only exercise paths that need no
//! network and no external tools: argument validation, configuration
//! errors, and the unsupported-platform refusal.

use assert_cmd::Command;
use predicates::prelude::*;

fn mediagrab() -> Command {
    let mut cmd = Command::cargo_bin("mediagrab").unwrap();
    cmd.arg("--quiet");
    cmd
}

#[test]
fn test_help_shows_usage() {
    Command::cargo_bin("mediagrab")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Media URL"))
        .stdout(predicate::str::contains("--kind"));
}

#[test]
fn test_missing_url_fails_with_usage() {
    Command::cargo_bin("mediagrab")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_invalid_kind_is_rejected() {
    mediagrab()
        .args(["https://youtu.be/abc", "--kind", "subtitles"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_unsupported_platform_fails_cleanly() {
    let work = tempfile::tempdir().unwrap();
    mediagrab()
        .env("MEDIA_WORK_DIR", work.path())
        .arg("https://example.com/video.mp4")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn test_malformed_url_fails_cleanly() {
    let work = tempfile::tempdir().unwrap();
    mediagrab()
        .env("MEDIA_WORK_DIR", work.path())
        .arg("not-a-url")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn test_invalid_env_configuration_is_reported() {
    mediagrab()
        .env("MAX_FILE_SIZE_MB", "fifty")
        .arg("https://youtu.be/abc")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
