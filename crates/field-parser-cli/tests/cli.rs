//! End-to-end tests for the `fieldparse` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn fieldparse() -> Command {
    let mut cmd = Command::cargo_bin("fieldparse").unwrap();
    cmd.env_remove("FIELD_PARSER_TZDB")
        .env_remove("FIELD_PARSER_LOCALE")
        .env_remove("RUST_LOG");
    cmd
}

fn tzdb_fixture() -> String {
    format!(
        "{}/../field-parser/tests/data/tzdb.json",
        env!("CARGO_MANIFEST_DIR")
    )
}

#[test]
fn test_parse_with_alias() {
    let output = fieldparse()
        .args(["parse", "--format", "RFC1123Z", "Mon, 02 Jan 2006 15:04:05 -0700"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let line: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(line["timestamp"], "2006-01-02T22:04:05.000Z");
    assert_eq!(line["consumed"], 31);
}

#[test]
fn test_parse_without_year_uses_now() {
    fieldparse()
        .args([
            "parse",
            "-f",
            "SYSLOG",
            "--now",
            "2024-05-20T00:00:00Z",
            "Jun 14 15:16:01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-06-14T15:16:01.000Z"));
}

#[test]
fn test_parse_failure_sets_exit_code() {
    fieldparse()
        .args(["parse", "-f", "%F", "2019-12-12", "ABC2019-12-12"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("2019-12-12T00:00:00.000Z"))
        .stdout(predicate::str::contains("\"error\""));
}

#[test]
fn test_parse_with_tzdb_file() {
    fieldparse()
        .args([
            "parse",
            "-f",
            "UnixDate",
            "--tzdb",
            &tzdb_fixture(),
            "Mon Jan 2 15:04:05 PST 2006",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2006-01-02T23:04:05.000Z"));
}

#[test]
fn test_build_errors_exit_with_two() {
    fieldparse()
        .args(["parse", "-f", "%F", "-l", "wrong_locale", "2019-12-12"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid locale"));

    fieldparse()
        .args(["parse", "-f", "not_match", "x"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid format"));
}

#[test]
fn test_apply_reads_ndjson() {
    fieldparse()
        .args([
            "apply",
            "--helper",
            "event.created: parse_date($raw.time, HTTPDATE)",
        ])
        .write_stdin("{\"raw\":{\"time\":\"26/Dec/2016:16:22:14 +0000\"}}\n{\"raw\":{}}\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#""event":{"created":"2016-12-26T16:22:14.000Z"}"#,
        ))
        .stdout(predicate::str::contains(r#"{"raw":{}}"#));
}

#[test]
fn test_apply_rejects_unknown_helper() {
    fieldparse()
        .args(["apply", "--helper", "ts: to_upper($raw)"])
        .write_stdin("")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown helper"));
}

#[test]
fn test_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "default_locale = \"es_ES.UTF-8\"\n").unwrap();

    fieldparse()
        .arg("--config")
        .arg(&config)
        .args(["parse", "-f", "%d %B %Y", "14 junio 2021"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2021-06-14T00:00:00.000Z"));
}

#[test]
fn test_aliases() {
    fieldparse()
        .arg("aliases")
        .assert()
        .success()
        .stdout(predicate::str::contains("SYSLOG"))
        .stdout(predicate::str::contains("%d/%b/%Y:%T %z"));
}
