// ABOUTME: Integration tests for the dockwire CLI.
// ABOUTME: Validates --help output, argument errors and unreachable-daemon reporting.

use assert_cmd::Command;
use predicates::prelude::*;

fn dockwire_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dockwire"));
    cmd.env_remove("DOCKER_HOST").env_remove("DOCKER_API_VERSION");
    cmd
}

#[test]
fn help_shows_commands() {
    dockwire_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ps"))
        .stdout(predicate::str::contains("pull"))
        .stdout(predicate::str::contains("logs"))
        .stdout(predicate::str::contains("--host"));
}

#[test]
fn rm_requires_a_container() {
    dockwire_cmd()
        .arg("rm")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<CONTAINERS>"));
}

#[test]
fn json_and_quiet_conflict() {
    dockwire_cmd()
        .args(["--json", "--quiet", "ps"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn invalid_host_is_reported() {
    dockwire_cmd()
        .args(["--host", "https://secure:2376", "ps"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --host"));
}

#[test]
fn invalid_image_reference_is_reported_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("absent.sock");

    dockwire_cmd()
        .args(["--host", &format!("unix://{}", socket.display()), "pull", "Bad Ref"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid image reference"));
}

#[test]
fn unreachable_daemon_fails_with_operation_context() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("absent.sock");

    dockwire_cmd()
        .current_dir(dir.path())
        .args(["--host", &format!("unix://{}", socket.display()), "version"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("version"))
        .stderr(predicate::str::contains("absent.sock"));
}

#[test]
fn json_errors_are_structured() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("absent.sock");

    dockwire_cmd()
        .current_dir(dir.path())
        .args(["--json", "--host", &format!("unix://{}", socket.display()), "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(r#""event":"error""#));
}
