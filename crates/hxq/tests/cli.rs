//! End-to-end tests for the hxq binary.
//!
//! Each test writes a small project into a temporary directory and runs
//! one subcommand against it.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn hxq_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_hxq"))
}

fn run(args: &[&str]) -> Output {
    Command::new(hxq_bin())
        .args(args)
        .output()
        .expect("failed to run hxq")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write(root: &Path, relative: &str, text: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, text).unwrap();
    path
}

const MAIN: &str = "class Main {\n  static function main() {\n    var count = 1;\n    trace(count);\n    missing;\n    return;\n    trace(2);\n  }\n}\n";

// ── check ────────────────────────────────────────────────────────────

#[test]
fn check_reports_types_unresolved_and_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Main.hx", MAIN);

    let output = run(&["check", dir.path().to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let text = stdout(&output);
    assert!(text.contains("Main.hx"), "{text}");
    assert!(text.contains("3:9  var count : Int"), "{text}");
    assert!(text.contains("5:5  unresolved `missing`"), "{text}");
    assert!(text.contains("7:5  unreachable code"), "{text}");
}

#[test]
fn check_json_output() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Main.hx", MAIN);

    let output = run(&["check", "--json", dir.path().to_str().unwrap()]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["unresolved"], 1);
    assert_eq!(json["unreachable"], 1);
    let file = &json["files"][0];
    assert_eq!(file["unresolved"][0]["name"], "missing");
    assert_eq!(file["unresolved"][0]["line"], 5);
}

#[test]
fn check_uses_configured_source_roots() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "hxq.toml", "[project]\nsource_roots = [\"src\"]\n");
    write(dir.path(), "src/Main.hx", MAIN);
    write(dir.path(), "scratch/Broken.hx", "class Broken { function f() { nope; } }\n");

    let output = run(&["check", "--json", dir.path().to_str().unwrap()]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["files"].as_array().map(Vec::len), Some(1));
}

#[test]
fn check_of_a_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(&["check", dir.path().join("absent").to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn invalid_configuration_fails() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "hxq.toml", "[analysis]\nmax_depth = \"deep\"\n");
    write(dir.path(), "Main.hx", MAIN);
    let output = run(&["check", dir.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid configuration"));
}

// ── resolve / type ───────────────────────────────────────────────────

#[test]
fn resolve_prints_the_declaration() {
    let dir = tempfile::tempdir().unwrap();
    let main = write(dir.path(), "Main.hx", MAIN);

    let output = run(&["resolve", main.to_str().unwrap(), "4:11"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout(&output).trim(), "var count  Main.hx:3:9");
}

#[test]
fn resolve_of_an_unknown_name() {
    let dir = tempfile::tempdir().unwrap();
    let main = write(dir.path(), "Main.hx", MAIN);

    let output = run(&["resolve", main.to_str().unwrap(), "5:5"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "no declaration found");
}

#[test]
fn type_at_position() {
    let dir = tempfile::tempdir().unwrap();
    let main = write(dir.path(), "Main.hx", MAIN);

    let output = run(&["type", "--json", main.to_str().unwrap(), "4:11"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["type"], "Int");
}

#[test]
fn position_outside_the_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let main = write(dir.path(), "Main.hx", MAIN);
    let output = run(&["type", main.to_str().unwrap(), "99:1"]);
    assert_eq!(output.status.code(), Some(1));
}
