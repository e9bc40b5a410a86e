//! End-to-end runs of the `riskmap` binary.

use assert_cmd::assert::OutputAssertExt;
use indoc::indoc;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn riskmap() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_riskmap"));
    cmd.env("RISKMAP_QUIET", "1").env_remove("RUST_LOG");
    cmd
}

fn stdout_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

fn stderr_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}

#[test]
fn test_help_succeeds() {
    let assert = riskmap().arg("--help").assert().success();

    let out = stdout_of(&assert);
    assert!(out.contains("stat"));
    assert!(out.contains("report"));
    assert!(out.contains("init"));
}

#[test]
fn test_unknown_format_is_usage_error() {
    let dir = TempDir::new().unwrap();

    riskmap()
        .args(["stat", "complexity", "--format", "yaml"])
        .arg(dir.path())
        .assert()
        .code(1);
}

#[test]
fn test_missing_path_reports_error() {
    let dir = TempDir::new().unwrap();

    let assert = riskmap()
        .args(["stat", "complexity"])
        .arg(dir.path().join("nope"))
        .assert()
        .code(1);

    assert!(stderr_of(&assert).contains("error:"));
}

#[test]
fn test_init_creates_config_once() {
    let dir = TempDir::new().unwrap();

    riskmap().arg("init").arg(dir.path()).assert().success();
    assert!(dir.path().join(".riskmap.toml").is_file());

    riskmap().arg("init").arg(dir.path()).assert().code(1);
    riskmap()
        .args(["init", "--force"])
        .arg(dir.path())
        .assert()
        .success();
}

#[test]
fn test_complexity_from_csv_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("complexity.csv"),
        indoc! {"
            filename,function,line,complexity,length,packages
            a.go,A,1,3,10,main
            b.go,B1,1,10,5,main
            b.go,B2,8,8,5,main
        "},
    )
    .unwrap();

    let assert = riskmap()
        .args(["stat", "complexity", "--engine", "csv-file", "--format", "csv"])
        .arg(dir.path())
        .assert()
        .success();

    assert_eq!(
        stdout_of(&assert),
        "FILEPATH,COMPLEXITY\nb.go,9.00\na.go,3.00\n"
    );
}

#[test]
fn test_complexity_json_from_go_sources() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.go"),
        indoc! {"
            package main

            func main() {
                for i := 0; i < 3; i++ {
                    if i > 1 && i < 3 {
                        println(i)
                    }
                }
            }
        "},
    )
    .unwrap();

    let assert = riskmap()
        .args(["stat", "complexity", "-f", "json"])
        .arg(dir.path())
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_str(&stdout_of(&assert)).unwrap();
    assert_eq!(json[0]["path"], "main.go");
    assert_eq!(json[0]["average"], 4.0);
}

#[test]
fn test_coverage_never_without_profile_fails() {
    let dir = TempDir::new().unwrap();

    let assert = riskmap()
        .args(["stat", "coverage", "--run", "never"])
        .arg(dir.path())
        .assert()
        .code(1);

    let stderr = stderr_of(&assert);
    assert!(stderr.contains("error:"));
    assert!(stderr.contains("hint:"));
    assert!(stderr.contains("--run auto"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".riskmap.toml"), "[report]\nbogus = 1\n").unwrap();

    riskmap()
        .args(["stat", "complexity"])
        .arg(dir.path())
        .assert()
        .code(1);
}
