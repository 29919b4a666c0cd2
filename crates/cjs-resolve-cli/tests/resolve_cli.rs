//! Integration tests for `cjs-resolve resolve` and `cjs-resolve categories`.

use serial_test::serial;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-q", "-p", "cjs-resolve-cli", "--bin", "cjs-resolve", "--"]);
    cmd.env_remove("CJS_RESOLVE_CATEGORY");
    cmd
}

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("stdout should be valid JSON")
}

fn resolved(json: &serde_json::Value) -> &str {
    json["resolved"].as_str().expect("missing resolved path")
}

#[test]
#[serial]
fn test_resolve_relative_file() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("lib/util.js"), "");

    let output = cargo_bin()
        .args(["--json", "resolve", "./lib/util", "--basedir"])
        .arg(dir.path())
        .output()
        .expect("failed to run resolve");

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["ok"], true);
    assert_eq!(json["schema_version"], 1);
    assert!(resolved(&json).ends_with("util.js"));
}

#[test]
#[serial]
fn test_resolve_not_found_exits_nonzero() {
    let dir = tempdir().unwrap();

    let output = cargo_bin()
        .args(["--json", "--cwd"])
        .arg(dir.path())
        .args(["resolve", "./missing"])
        .output()
        .expect("failed to run resolve");

    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["ok"], false);
    assert_eq!(json["code"], "MODULE_NOT_FOUND");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("Cannot find module './missing'"));
}

#[test]
#[serial]
fn test_resolve_core_module() {
    let output = cargo_bin()
        .args(["--json", "resolve", "node:fs"])
        .output()
        .expect("failed to run resolve");

    assert!(output.status.success());
    assert_eq!(resolved(&stdout_json(&output)), "node:fs");
}

#[test]
#[serial]
fn test_resolve_exports_by_category() {
    let dir = tempdir().unwrap();
    let pkg = dir.path().join("node_modules/pkg");
    write(
        &pkg.join("package.json"),
        r#"{"main": "main.js", "exports": {".": "./a.js", "./b": "./b.js"}}"#,
    );
    for file in ["main.js", "a.js", "b.js", "c.js"] {
        write(&pkg.join(file), "");
    }

    let run = |specifier: &str, extra: &[&str]| {
        cargo_bin()
            .args(["--json", "resolve", specifier, "--basedir"])
            .arg(dir.path())
            .args(extra)
            .output()
            .expect("failed to run resolve")
    };

    let output = run("pkg/b", &["--category", "conditions"]);
    assert!(resolved(&stdout_json(&output)).ends_with("b.js"));

    let output = run("pkg/c", &["--category", "conditions"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["code"], "ERR_PACKAGE_PATH_NOT_EXPORTED");

    // Default category predates exports.
    let output = run("pkg", &[]);
    assert!(resolved(&stdout_json(&output)).ends_with("main.js"));

    let output = run("pkg", &["--range", ">=17", "--async"]);
    assert!(resolved(&stdout_json(&output)).ends_with("a.js"));
}

#[test]
#[serial]
fn test_category_override_env() {
    let dir = tempdir().unwrap();
    let pkg = dir.path().join("node_modules/pkg");
    write(
        &pkg.join("package.json"),
        r#"{"main": "main.js", "exports": "./a.js"}"#,
    );
    write(&pkg.join("main.js"), "");
    write(&pkg.join("a.js"), "");

    let output = cargo_bin()
        .env("CJS_RESOLVE_CATEGORY", "broken")
        .args(["--json", "resolve", "pkg", "--basedir"])
        .arg(dir.path())
        .output()
        .expect("failed to run resolve");

    assert!(resolved(&stdout_json(&output)).ends_with("a.js"));
}

#[test]
#[serial]
fn test_categories_for_range() {
    let output = cargo_bin()
        .args(["--json", "categories", ">= 17"])
        .output()
        .expect("failed to run categories");

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(
        json["categories"],
        serde_json::json!(["pattern-trailers-no-dir-slash"])
    );
}

#[test]
#[serial]
fn test_categories_invalid_range() {
    let output = cargo_bin()
        .args(["--json", "categories", "not a range"])
        .output()
        .expect("failed to run categories");

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["ok"], false);
}
