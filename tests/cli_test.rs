//! CLI integration tests for the `fdsl` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn fdsl() -> Command {
    Command::cargo_bin("fdsl").expect("Failed to find fdsl binary")
}

fn write_script(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).expect("Failed to write script");
    path
}

#[test]
fn help_output_mentions_run_and_prepare() {
    fdsl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("prepare"));
}

#[test]
fn run_prints_script_output_and_exits_zero() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), "alpha\nbeta\ngamma\n").unwrap();
    let script = write_script(
        &dir,
        "s1.fdsl",
        "f = File(\"a.txt\")\nprint(f.contains(\"beta\"))\n",
    );

    fdsl()
        .arg("run")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::eq("true\n"));
}

#[test]
fn run_missing_script_exits_with_code_two() {
    let dir = TempDir::new().unwrap();
    fdsl()
        .arg("run")
        .arg(dir.path().join("missing.fdsl"))
        .assert()
        .code(2);
}

#[test]
fn run_sandbox_violation_exits_with_code_one() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "escape.fdsl", "d = Directory(\"/\")\n");

    fdsl()
        .arg("run")
        .arg(&script)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Access denied"));
}

#[test]
fn prepare_reports_indexed_counts() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.txt"), "alpha beta\n").unwrap();

    fdsl()
        .arg("prepare")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Prepared semantic index for"))
        .stdout(predicate::str::contains("Indexed files: 1"))
        .stdout(predicate::str::contains("Indexed pages: 1"));

    assert!(dir.path().join(".fdsl_index").join("records.json").exists());
}
