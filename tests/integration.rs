use std::path::Path;
use std::process::{Command, Output};

fn depends_cmd(fixture: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_depends"));
    cmd.current_dir(Path::new("tests/fixtures").join(fixture));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(ToString::to_string)
        .collect()
}

fn file_names(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|l| {
            Path::new(l.trim())
                .file_name()
                .unwrap()
                .to_string_lossy()
                .to_string()
        })
        .collect()
}

#[test]
fn scan_reports_resolved_and_missing_includes() {
    let output = depends_cmd("basic").args(["scan", "main.c"]).output().unwrap();
    assert!(
        output.status.success(),
        "scan failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let lines = stdout_lines(&output);
    assert_eq!(file_names(&lines), vec!["util.h"]);
    assert!(Path::new(&lines[0]).is_absolute());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.h"), "no notice in: {stderr}");
}

#[test]
fn strict_mode_fails_on_notices() {
    let output = depends_cmd("basic")
        .args(["scan", "--strict", "main.c"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let clean = depends_cmd("cycle")
        .args(["scan", "--strict", "a.c"])
        .output()
        .unwrap();
    assert_eq!(clean.status.code(), Some(0));
}

#[test]
fn cycle_is_reported_once() {
    let output = depends_cmd("cycle").args(["scan", "a.c"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(file_names(&stdout_lines(&output)), vec!["b.c"]);
}

#[test]
fn include_paths_and_discovery_order() {
    let output = depends_cmd("layered")
        .args(["scan", "-I", "include", "src/main.c"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "scan failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(
        file_names(&stdout_lines(&output)),
        vec!["app.h", "socket.h", "buffer.h"]
    );
}

#[test]
fn project_config_supplies_rules_and_paths() {
    let output = depends_cmd("custom")
        .args(["scan", "--json", "main.ext"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "scan failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let deps = json[0]["dependencies"].as_array().unwrap();
    let references: Vec<&str> = deps
        .iter()
        .map(|d| d["reference"].as_str().unwrap())
        .collect();
    assert_eq!(references, vec!["thing.ext2", "shared.ext"]);
    assert!(json[0]["notices"].as_array().unwrap().is_empty());
}

#[test]
fn json_notices_are_tagged() {
    let output = depends_cmd("basic")
        .args(["scan", "--json", "main.c"])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let notice = &json[0]["notices"][0];
    assert_eq!(notice["kind"], "unresolved");
    assert_eq!(notice["reference"], "missing.h");
}

#[test]
fn tree_scans_every_matching_file() {
    let output = depends_cmd("cycle").args(["tree", "--json"]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    for entry in entries {
        assert_eq!(entry["dependencies"].as_array().unwrap().len(), 1);
    }
}

#[test]
fn rules_lists_default_and_configured_rules() {
    let default = depends_cmd("basic").arg("rules").output().unwrap();
    assert_eq!(stdout_lines(&default)[0], "c");

    let custom = depends_cmd("custom").arg("rules").output().unwrap();
    assert_eq!(stdout_lines(&custom)[0], "ext");
}

#[test]
fn missing_explicit_config_is_an_error() {
    let output = depends_cmd("basic")
        .args(["scan", "--config", "nope.toml", "main.c"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Config Not Found"));
}
