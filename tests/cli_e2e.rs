//! CLI end-to-end tests.
//!
//! These tests spawn the actual `jsonr` binary and validate stdout/exit codes.
//!
//! Exit code expectations:
//! - 0: Success
//! - 2: Invalid arguments (malformed tree, bad traversal order)
//! - 3: Resolution error (missing file, rejected type in strict mode)

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use serde_json::Value;
use tempfile::TempDir;

/// Run jsonr in `dir` with given arguments and return (stdout, stderr, exit_code).
fn run_jsonr(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_jsonr"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to execute jsonr");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

/// Write `tree` to `page.json` in a fresh temp dir.
fn workspace_with(tree: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("page.json"), tree).unwrap();
    dir
}

const PAGE: &str = r##"{
    "type": "div",
    "children": [
        {"type": "Btn", "props": {"onClick": "save"}, "children": "Save"},
        {"type": "marquee", "children": "old"},
        {"type": "Portal", "props": {"container": "#modal"}, "children": "hi"}
    ]
}"##;

// ============================================================================
// transform
// ============================================================================

#[test]
fn transform_prints_tree_and_diagnostics() {
    let dir = workspace_with(PAGE);
    let (stdout, _stderr, exit_code) = run_jsonr(
        dir.path(),
        &[
            "transform",
            "page.json",
            "--rename",
            "Btn=button",
            "--allow",
            "div",
            "--allow",
            "button",
        ],
    );
    assert_eq!(exit_code, 0, "stdout: {}", stdout);

    let json: Value = serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(json["status"], "ok");
    assert_eq!(json["schema_version"], "1");
    assert_eq!(json["tree"]["children"][0]["type"], "button");
    assert!(json["tree"]["children"][1].is_null());
    assert_eq!(json["tree"]["children"][2]["type"], "Portal");
    assert_eq!(json["diagnostics"][0]["kind"], "unknown_type");
}

#[test]
fn strict_transform_exits_with_resolution_code() {
    let dir = workspace_with(PAGE);
    let (stdout, _stderr, exit_code) = run_jsonr(
        dir.path(),
        &["transform", "page.json", "--allow", "div", "--strict"],
    );
    assert_eq!(exit_code, 3);
    let json: Value = serde_json::from_str(&stdout).expect("error should be JSON");
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["code"], 3);
    assert_eq!(json["error"]["details"]["type"], "Btn");
}

#[test]
fn malformed_tree_exits_with_invalid_arguments() {
    let dir = workspace_with(r#"{"children": []}"#);
    let (stdout, _stderr, exit_code) = run_jsonr(dir.path(), &["transform", "page.json"]);
    assert_eq!(exit_code, 2);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["error"]["details"]["path"], "$");
}

#[test]
fn missing_file_exits_with_resolution_code() {
    let dir = TempDir::new().unwrap();
    let (stdout, _stderr, exit_code) = run_jsonr(dir.path(), &["transform", "nope.json"]);
    assert_eq!(exit_code, 3);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["error"]["details"]["path"], "nope.json");
}

#[test]
fn transform_reads_stdin() {
    let dir = TempDir::new().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_jsonr"))
        .args(["transform", "-"])
        .current_dir(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn jsonr");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(br#"{"type": "p", "children": "hi"}"#)
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["tree"], serde_json::json!({"type": "p", "children": "hi"}));
}

// ============================================================================
// render
// ============================================================================

#[test]
fn render_html_resolves_handlers_and_targets() {
    let dir = workspace_with(PAGE);
    let (stdout, _stderr, exit_code) = run_jsonr(
        dir.path(),
        &[
            "render",
            "page.json",
            "--rename",
            "Btn=button",
            "--handler",
            "save",
            "--target",
            "#modal",
            "--format",
            "html",
        ],
    );
    assert_eq!(exit_code, 0);
    assert_eq!(
        stdout.trim_end(),
        "<div><button data-handler-onclick=\"save\">Save</button><marquee>old</marquee>\
         <template data-portal=\"#modal\">hi</template></div>"
    );
}

#[test]
fn render_json_uses_config_file() {
    let dir = workspace_with(PAGE);
    std::fs::write(
        dir.path().join("jsonr.toml"),
        "[render]\ntargets = [\"#modal\"]\n\n[registry]\ndeny = [\"marquee\"]\n\n[registry.aliases]\nBtn = \"button\"\n",
    )
    .unwrap();
    let (stdout, _stderr, exit_code) = run_jsonr(dir.path(), &["render", "page.json"]);
    assert_eq!(exit_code, 0);

    let json: Value = serde_json::from_str(&stdout).unwrap();
    let children = json["rendered"]["children"].as_array().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0]["element"], "button");
    assert_eq!(children[1]["portal"], "#modal");

    let kinds: Vec<_> = json["diagnostics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["kind"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(kinds, vec!["unresolved_handler", "unknown_type"]);
}

// ============================================================================
// walk
// ============================================================================

#[test]
fn walk_lists_breadth_first_entries() {
    let dir = workspace_with(PAGE);
    let (stdout, _stderr, exit_code) =
        run_jsonr(dir.path(), &["walk", "page.json", "--order", "bfs"]);
    assert_eq!(exit_code, 0);

    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["order"], "breadthFirst");
    let labels: Vec<_> = json["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["label"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        labels,
        vec!["div", "Btn", "marquee", "Portal", "\"Save\"", "\"old\"", "\"hi\""]
    );
    assert!(json["entries"][0]["parent"].is_null());
    assert_eq!(json["entries"][1]["parent"]["type"], "div");
}

#[test]
fn walk_rejects_unknown_order() {
    let dir = workspace_with(PAGE);
    let (_stdout, stderr, exit_code) =
        run_jsonr(dir.path(), &["walk", "page.json", "--order", "sideways"]);
    // Rejected by argument parsing before any command runs.
    assert_eq!(exit_code, 2);
    assert!(stderr.contains("invalid traversal order"));
}
