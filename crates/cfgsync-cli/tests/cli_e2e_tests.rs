//! CLI end-to-end tests for the `config-sync` binary.
//!
//! These tests exercise the compiled binary using assert_cmd against
//! temporary sites built with `TestSite`.

use assert_cmd::Command;
use cfgsync_extensions::ExtensionKind;
use cfgsync_store::ConfigStore;
use cfgsync_test_utils::TestSite;
use predicates::prelude::*;
use serde_json::{Value, json};

/// Get a Command for the config-sync binary
fn config_sync() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("config-sync"));
    cmd.env_remove("CONFIG_SYNC_ROOT").env("NO_COLOR", "1");
    cmd
}

/// Run a command against `site` and return its stdout.
fn run_ok(site: &TestSite, args: &[&str]) -> String {
    let output = config_sync()
        .arg("--root")
        .arg(site.root())
        .args(args)
        .output()
        .expect("failed to run config-sync");
    assert!(
        output.status.success(),
        "config-sync {:?} failed:\n{}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn site_with_node() -> TestSite {
    let mut site = TestSite::new();
    site.add_extension(
        ExtensionKind::Module,
        "node",
        &[
            ("node.settings", json!({"preview": 1})),
            (
                "node.type.page",
                json!({"name": "Page", "dependencies": {"config": ["node.settings"]}}),
            ),
        ],
    );
    site
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_output() {
    config_sync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("snapshot-delete"));
}

#[test]
fn test_version_output() {
    config_sync()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("config-sync"));
}

#[test]
fn test_no_command_shows_help_hint() {
    config_sync()
        .assert()
        .success()
        .stdout(predicate::str::contains("config-sync --help"));
}

// ============================================================================
// Error Handling
// ============================================================================

#[test]
fn test_not_a_site_fails() {
    let temp = tempfile::tempdir().unwrap();
    config_sync()
        .arg("--root")
        .arg(temp.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("Not a config-sync site"));
}

#[test]
fn test_unknown_extension_fails() {
    let site = site_with_node();
    config_sync()
        .arg("--root")
        .arg(site.root())
        .args(["init", "--extension", "theme:olivero"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("theme:olivero"));
}

#[test]
fn test_malformed_extension_reference_fails() {
    let site = site_with_node();
    config_sync()
        .arg("--root")
        .arg(site.root())
        .args(["snapshot", "--extension", "node"])
        .assert()
        .failure();
}

// ============================================================================
// Workflow
// ============================================================================

#[test]
fn test_status_lists_pending_creates() {
    let site = site_with_node();
    let stdout = run_ok(&site, &["status"]);
    assert!(stdout.contains("module:node"), "stdout:\n{stdout}");
    assert!(stdout.contains("+ node.settings"), "stdout:\n{stdout}");
    assert!(stdout.contains("+ node.type.page"), "stdout:\n{stdout}");
}

#[test]
fn test_status_json_orders_creates_by_dependency() {
    let site = site_with_node();
    let stdout = run_ok(&site, &["status", "--json"]);
    let status: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(
        status["module"]["node"][0]["create"],
        json!(["node.settings", "node.type.page"])
    );
}

#[test]
fn test_init_import_then_in_sync() {
    let site = site_with_node();

    let stdout = run_ok(&site, &["init"]);
    assert!(stdout.contains("clean"), "stdout:\n{stdout}");
    site.assert_file_exists(".config-sync/staging/node.type.page.yml");

    let stdout = run_ok(&site, &["import"]);
    assert!(stdout.contains("2 item(s) changed"), "stdout:\n{stdout}");
    site.assert_file_contains(".config-sync/active/node.type.page.yml", "name: Page");
    site.assert_file_exists(".config-sync/snapshot/active/node.settings.yml");

    let stdout = run_ok(&site, &["status"]);
    assert!(stdout.contains("Nothing to reconcile"), "stdout:\n{stdout}");
}

#[test]
fn test_customized_item_needs_all_flag() {
    let site = site_with_node();
    run_ok(&site, &["init"]);
    run_ok(&site, &["import"]);

    site.write_active("node.settings", &json!({"preview": 2}));
    site.ship(ExtensionKind::Module, "node", "node.settings", &json!({"preview": 1, "help": ""}));

    let stdout = run_ok(&site, &["status"]);
    assert!(stdout.contains("Nothing to reconcile"), "stdout:\n{stdout}");
    let stdout = run_ok(&site, &["status", "--all"]);
    assert!(stdout.contains("~ node.settings"), "stdout:\n{stdout}");

    let report: Value = serde_json::from_str(&run_ok(&site, &["init", "--json"])).unwrap();
    assert_eq!(report["status"], "partial");
    assert_eq!(report["skipped"][0]["detail"], "customized locally");
    assert_eq!(report["skipped"][0]["proposed"], json!({"preview": 2, "help": ""}));

    let stdout = run_ok(&site, &["init"]);
    assert!(stdout.contains("clean merge proposed"), "stdout:\n{stdout}");

    run_ok(&site, &["init", "--all"]);
    assert_eq!(
        site.staging().read("node.settings").unwrap(),
        Some(json!({"preview": 2, "help": ""}))
    );
}

#[test]
fn test_diff_shows_staged_change() {
    let site = site_with_node();
    run_ok(&site, &["init"]);
    run_ok(&site, &["import"]);
    site.ship(ExtensionKind::Module, "node", "node.settings", &json!({"preview": 0}));
    run_ok(&site, &["init"]);

    let stdout = run_ok(&site, &["diff", "node.settings"]);
    assert!(stdout.contains("--- active/node.settings"), "stdout:\n{stdout}");
    assert!(stdout.contains("-preview: 1"), "stdout:\n{stdout}");
    assert!(stdout.contains("+preview: 0"), "stdout:\n{stdout}");
}

#[test]
fn test_snapshot_delete_clears_snapshot() {
    let site = site_with_node();
    let stdout = run_ok(&site, &["snapshot"]);
    assert!(stdout.contains("2 item(s) from 1 extension(s)"), "stdout:\n{stdout}");
    site.assert_file_exists(".config-sync/snapshot/upstream/node.settings.yml");

    run_ok(&site, &["snapshot-delete"]);
    site.assert_file_not_exists(".config-sync/snapshot/upstream/node.settings.yml");
}
