//! End-to-end CLI integration tests for the `bd` binary.
//!
//! Each test creates its own temporary directory, initializes a beads project,
//! and exercises the `bd` binary as a subprocess via `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a `Command` targeting the cargo-built `bd` binary.
fn bd() -> Command {
    Command::cargo_bin("bd").unwrap()
}

/// Initialize a fresh beads project in a temp directory and return the handle.
fn init_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    bd().args(["init", "--prefix", "t", "--quiet"])
        .current_dir(tmp.path())
        .assert()
        .success();
    tmp
}

/// Create an issue and return its ID (parsed from `--json` output).
fn create_issue(tmp: &TempDir, title: &str, extra_args: &[&str]) -> String {
    let mut args = vec!["create", title, "--json"];
    args.extend_from_slice(extra_args);
    let output = bd().args(&args).current_dir(tmp.path()).output().unwrap();
    assert!(
        output.status.success(),
        "create failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    json["id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Flow 1: Full lifecycle
// ---------------------------------------------------------------------------

#[test]
fn flow1_full_lifecycle() {
    let tmp = init_project();

    let id1 = create_issue(
        &tmp,
        "Bug: login broken",
        &["-t", "bug", "-p", "0", "-d", "Users can't login"],
    );
    let id2 = create_issue(&tmp, "Feature: dark mode", &["-t", "feature", "-p", "2"]);
    let id3 = create_issue(&tmp, "Task: update docs", &["-t", "task", "-p", "3"]);

    assert!(id1.starts_with("t-"), "id1 should start with t-: {}", id1);
    assert!(id2.starts_with("t-"), "id2 should start with t-: {}", id2);
    assert!(id3.starts_with("t-"), "id3 should start with t-: {}", id3);

    let output = bd()
        .args(["list", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let arr = list.as_array().expect("list --json should return array");
    assert_eq!(arr.len(), 3, "should have 3 issues");

    let bug_issue = arr
        .iter()
        .find(|i| i["title"].as_str().map_or(false, |t| t.contains("login")))
        .expect("should find the login bug issue");
    assert_eq!(bug_issue["issue_type"].as_str().unwrap(), "bug");
    assert_eq!(bug_issue["priority"].as_i64().unwrap(), 0);
    assert!(bug_issue["created_at"].is_string());

    let output = bd()
        .args(["show", &id1, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let show: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let show_arr = show.as_array().expect("show --json should return array");
    assert_eq!(show_arr.len(), 1);
    assert_eq!(show_arr[0]["id"].as_str().unwrap(), id1);

    bd().args(["update", &id1, "--status", "in_progress"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["show", &id1, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let show: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(show[0]["status"].as_str().unwrap(), "in_progress");

    bd().args(["close", &id1, "--reason", "fixed"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["show", &id1, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let show: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(show[0]["status"].as_str().unwrap(), "closed");

    bd().args(["reopen", &id1])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["show", &id1, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let show: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(show[0]["status"].as_str().unwrap(), "open");

    bd().args(["delete", &id3, "--reason", "obsolete"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["list", "--status", "all", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    // Tombstones are excluded even from --status all; only id1 and id2 remain visible.
    assert_eq!(list.as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Flow 2: Dependencies and readiness
// ---------------------------------------------------------------------------

#[test]
fn flow2_dependencies_and_ready() {
    let tmp = init_project();

    let parent = create_issue(&tmp, "Parent task", &["-t", "task", "-p", "1"]);
    let child = create_issue(&tmp, "Child task", &["-t", "task", "-p", "2"]);
    let unrelated = create_issue(&tmp, "Unrelated task", &["-t", "task", "-p", "3"]);

    bd().args(["dep", "add", &child, &parent, "--type", "blocks"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["ready", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let ready: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ready_ids: Vec<&str> = ready
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert!(ready_ids.contains(&parent.as_str()));
    assert!(ready_ids.contains(&unrelated.as_str()));
    assert!(!ready_ids.contains(&child.as_str()), "child is blocked");

    // bd blockers => child lists parent as an unresolved blocker
    bd().args(["blockers", &child])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Parent task"));

    bd().args(["close", &parent])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["ready", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let ready: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ready_ids: Vec<&str> = ready
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert!(ready_ids.contains(&child.as_str()), "child now ready");

    bd().args(["dep", "list", &child])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Depends on"));

    // Adding the reverse edge would create a cycle.
    bd().args(["dep", "add", &parent, &child, "--type", "blocks"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cycle"));

    bd().args(["dep", "remove", &child, &parent, "--type", "blocks"])
        .current_dir(tmp.path())
        .assert()
        .success();
    bd().args(["cycles"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No dependency cycles"));
}

// ---------------------------------------------------------------------------
// Flow 3: Search and filter
// ---------------------------------------------------------------------------

#[test]
fn flow3_search_and_filter() {
    let tmp = init_project();

    create_issue(&tmp, "Bug: login page broken", &["-t", "bug", "-p", "0"]);
    create_issue(
        &tmp,
        "Feature: dark mode toggle",
        &["-t", "feature", "-p", "2"],
    );
    create_issue(&tmp, "Bug: signup validation", &["-t", "bug", "-p", "1"]);

    let output = bd()
        .args(["list", "--search", "login", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let arr = results.as_array().unwrap();
    assert_eq!(arr.len(), 1, "search for 'login' should return 1 result");
    assert!(arr[0]["title"].as_str().unwrap().contains("login"));

    let output = bd()
        .args(["list", "--type", "bug", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 2, "should have 2 bugs");

    let output = bd()
        .args(["list", "--status", "open", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 3, "all 3 should be open");
}

// ---------------------------------------------------------------------------
// Flow 4: Labels
// ---------------------------------------------------------------------------

#[test]
fn flow4_labels() {
    let tmp = init_project();
    let id = create_issue(&tmp, "Label test issue", &[]);

    bd().args(["label", &id, "add", "critical"])
        .current_dir(tmp.path())
        .assert()
        .success();
    bd().args(["label", &id, "add", "backend"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["show", &id, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let show: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let labels: Vec<&str> = show[0]["labels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l.as_str().unwrap())
        .collect();
    assert!(labels.contains(&"critical"));
    assert!(labels.contains(&"backend"));

    bd().args(["label", &id, "remove", "critical"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["show", &id, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let show: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let labels: Vec<&str> = show[0]["labels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l.as_str().unwrap())
        .collect();
    assert!(!labels.contains(&"critical"));
    assert!(labels.contains(&"backend"));
}

// ---------------------------------------------------------------------------
// Flow 5: Comments and history
// ---------------------------------------------------------------------------

#[test]
fn flow5_comments_and_history() {
    let tmp = init_project();
    let id = create_issue(&tmp, "Comment test issue", &[]);

    bd().args(["comment", &id, "First comment"])
        .current_dir(tmp.path())
        .assert()
        .success();
    bd().args(["comment", &id, "Second comment"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["comments", &id, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let comments: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(comments.as_array().unwrap().len(), 2);

    bd().args(["update", &id, "--priority", "0"])
        .current_dir(tmp.path())
        .assert()
        .success();

    bd().args(["history", &id])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("History for"));
}

// ---------------------------------------------------------------------------
// Flow 6: Statistics
// ---------------------------------------------------------------------------

#[test]
fn flow6_stats() {
    let tmp = init_project();
    create_issue(&tmp, "Bug one", &["-t", "bug", "-p", "0"]);
    create_issue(&tmp, "Bug two", &["-t", "bug", "-p", "1"]);
    let closed = create_issue(&tmp, "Task one", &["-t", "task", "-p", "2"]);
    bd().args(["close", &closed])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["stats", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total_issues"].as_i64().unwrap(), 3);
    assert_eq!(stats["open_issues"].as_i64().unwrap(), 2);
    assert_eq!(stats["closed_issues"].as_i64().unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Flow 7: Configuration
// ---------------------------------------------------------------------------

#[test]
fn flow7_config() {
    let tmp = init_project();

    bd().args(["config", "set", "tombstone.ttl_days", "14"])
        .current_dir(tmp.path())
        .assert()
        .success();

    bd().args(["config", "get", "tombstone.ttl_days"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("14"));

    bd().args(["config", "get", "nonexistent.key"])
        .current_dir(tmp.path())
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// Flow 8: Children (parent-child subtree)
// ---------------------------------------------------------------------------

#[test]
fn flow8_children_tree() {
    let tmp = init_project();

    let epic = create_issue(&tmp, "Epic", &["-t", "epic"]);
    let sub1 = create_issue(&tmp, "Subtask one", &["-t", "task"]);
    let sub2 = create_issue(&tmp, "Subtask two", &["-t", "task"]);

    bd().args(["dep", "add", &sub1, &epic, "--type", "parent-child"])
        .current_dir(tmp.path())
        .assert()
        .success();
    bd().args(["dep", "add", &sub2, &epic, "--type", "parent-child"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["children", &epic, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let nodes: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(nodes.as_array().unwrap().len(), 3, "root + two children");
}

// ---------------------------------------------------------------------------
// Flow 9: Duplicates and merge
// ---------------------------------------------------------------------------

#[test]
fn flow9_duplicates_and_merge() {
    let tmp = init_project();

    let id1 = create_issue(&tmp, "Same thing", &["-d", "identical body text"]);
    let id2 = create_issue(&tmp, "Same thing", &["-d", "identical body text"]);
    let other = create_issue(&tmp, "Different issue", &["-d", "unrelated body"]);

    bd().args(["dep", "add", &other, &id1, "--type", "related"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["duplicates", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let groups = result["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 1, "one duplicate group expected");

    let target = groups[0]["target"].as_str().unwrap().to_string();
    let source = groups[0]["sources"][0].as_str().unwrap().to_string();
    assert!(
        (target == id1 && source == id2) || (target == id2 && source == id1),
        "target/source should be the two near-identical issues"
    );

    bd().args(["merge", &source, &target])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["show", &source, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let show: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(show[0]["status"].as_str().unwrap(), "closed");
}

// ---------------------------------------------------------------------------
// Flow 10: Export and import round-trip
// ---------------------------------------------------------------------------

#[test]
fn flow10_export_import_roundtrip() {
    let tmp = init_project();
    create_issue(&tmp, "Exportable issue one", &["-p", "1"]);
    create_issue(&tmp, "Exportable issue two", &["-p", "2"]);

    let log_path = tmp.path().join("issues.jsonl");

    bd().args(["export", log_path.to_str().unwrap()])
        .current_dir(tmp.path())
        .assert()
        .success();
    assert!(log_path.exists());

    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(contents.lines().count(), 2);

    // A fresh project importing the same log should end up with the same issues.
    let tmp2 = init_project();
    bd().args(["import", log_path.to_str().unwrap()])
        .current_dir(tmp2.path())
        .assert()
        .success();

    let output = bd()
        .args(["list", "--json"])
        .current_dir(tmp2.path())
        .output()
        .unwrap();
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Misc: version, readonly mode, missing database
// ---------------------------------------------------------------------------

#[test]
fn version_prints_something() {
    bd().args(["version"]).assert().success();
}

#[test]
fn commands_without_init_fail_with_hint() {
    let tmp = TempDir::new().unwrap();
    bd()
        .args(["list"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("bd init"));
}

#[test]
fn readonly_mode_blocks_writes() {
    let tmp = init_project();
    let id = create_issue(&tmp, "Readonly test", &[]);

    bd().args(["--readonly", "update", &id, "--title", "changed"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("read-only"));
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let tmp = init_project();
    bd().args(["init"])
        .current_dir(tmp.path())
        .assert()
        .failure();
    bd().args(["init", "--force", "--quiet"])
        .current_dir(tmp.path())
        .assert()
        .success();
}
