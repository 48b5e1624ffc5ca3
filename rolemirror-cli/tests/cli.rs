//! Integration tests for the rolemirror binary
//!
//! Each test writes a configuration and a directory snapshot into a temp
//! directory and runs the compiled binary against them.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const SNAPSHOT: &str = r#"{
    "spaces": [
        {
            "id": "111",
            "name": "Source",
            "markers": [{ "id": "ra", "name": "Staff" }],
            "members": [
                { "user_id": "1", "username": "alice", "markers": ["ra"] },
                { "user_id": "2", "username": "bob" },
                { "user_id": "3", "username": "carol", "markers": ["ra"] }
            ]
        },
        {
            "id": "222",
            "name": "Mirror",
            "markers": [{ "id": "rb", "name": "STAFF" }],
            "members": [
                { "user_id": "1", "username": "alice" },
                { "user_id": "2", "username": "bob", "markers": ["rb"] }
            ]
        }
    ]
}"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("snapshot.json"), SNAPSHOT).unwrap();
        std::fs::write(
            dir.path().join("rolemirror.toml"),
            "[sync]\nsource_space_id = \"111\"\nmirror_space_id = \"222\"\n\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_rolemirror"))
            .arg("--config")
            .arg(self.path("rolemirror.toml"))
            .arg("--snapshot")
            .arg(self.path("snapshot.json"))
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

fn write_events(path: &Path) {
    std::fs::write(
        path,
        r#"[
            { "kind": "joined", "space_id": "222",
              "member": { "user_id": "1", "username": "alice", "space_id": "222" } },
            { "kind": "joined", "space_id": "111",
              "member": { "user_id": "1", "username": "alice", "space_id": "111" } },
            { "kind": "updated", "space_id": "111", "previous_markers": [{ "id": "ra", "name": "Staff" }],
              "member": { "user_id": "2", "username": "bob", "space_id": "111" } }
        ]"#,
    )
    .unwrap();
}

#[test]
fn test_check_config() {
    let ws = Workspace::new();
    let output = ws.run(&["check-config"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("source space:   111"));
    assert!(stdout.contains("tracked marker: Staff"));
}

#[test]
fn test_sync_single_user() {
    let ws = Workspace::new();
    let output = ws.run(&["sync", "1"]);

    assert!(output.status.success());
    let outcome = stdout_json(&output);
    assert_eq!(outcome["action"], "added");
    assert_eq!(outcome["username"], "alice");
}

#[test]
fn test_sync_missing_user_exits_non_zero() {
    let ws = Workspace::new();
    let output = ws.run(&["sync", "3"]);

    assert_eq!(output.status.code(), Some(1));
    let outcome = stdout_json(&output);
    assert_eq!(outcome["action"], "error");
    assert_eq!(outcome["success"], false);
}

#[test]
fn test_full_sweep_report() {
    let ws = Workspace::new();
    let output = ws.run(&["sweep"]);

    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["scanned"], 3);
    assert_eq!(report["added"], 1);
    assert_eq!(report["removed"], 1);
    assert_eq!(report["errors"], 1);
}

#[test]
fn test_existing_sweep_report() {
    let ws = Workspace::new();
    let output = ws.run(&["sweep", "--existing"]);

    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["scanned"], 2);
    assert_eq!(report["errors"], 0);
}

#[test]
fn test_replay_events() {
    let ws = Workspace::new();
    write_events(&ws.path("events.json"));
    let output = ws.run(&["replay", ws.path("events.json").to_str().unwrap()]);

    assert!(output.status.success());
    let stats = stdout_json(&output);
    assert_eq!(stats["received"], 3);
    assert_eq!(stats["handled"], 2);
    assert_eq!(stats["ignored"], 1);
    assert_eq!(stats["failed"], 0);
}

#[test]
fn test_missing_snapshot_fails() {
    let ws = Workspace::new();
    let output = Command::new(env!("CARGO_BIN_EXE_rolemirror"))
        .arg("--config")
        .arg(ws.path("rolemirror.toml"))
        .arg("--snapshot")
        .arg(ws.path("nope.json"))
        .args(["sync", "1"])
        .output()
        .unwrap();

    assert!(!output.status.success());
}
