//! Integration tests for the CLI binary.
//!
//! Runs the `gva` binary against the embedded matrix and against matrix
//! files written to a temporary directory.
//!
//! This test is registered as a [[test]] in the gigvora-access-cli crate
//! so that CARGO_BIN_EXE_gva is available.

use std::process::{Command, Output};

/// Get a Command pointing to the `gva` binary with a clean environment.
fn gva_binary() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gva"));
    cmd.env_remove("GIGVORA_PERMISSION_MATRIX")
        .env_remove("GIGVORA_PERMISSION_MODE");
    cmd
}

fn run(args: &[&str]) -> Output {
    gva_binary()
        .args(args)
        .output()
        .expect("failed to execute gva")
}

fn write_broken_matrix(dir: &tempfile::TempDir) -> String {
    let path = dir.path().join("broken.json");
    std::fs::write(
        &path,
        r#"{
            "permissions": [{"key": "gigs:publish", "implies": ["gigs:view"]}],
            "memberships": [{"key": "freelancer", "permissions": ["gigs:publish"]}]
        }"#,
    )
    .unwrap();
    path.to_str().unwrap().to_string()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn cli_responds_to_help() {
    let output = run(&["--help"]);
    assert!(
        output.status.success(),
        "gva --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let out = stdout(&output);
    assert!(
        out.contains("gva") || out.contains("Usage"),
        "gva --help output should contain usage information, got: {out}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = run(&["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("0.2"));
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = run(&["--nonexistent-flag"]);
    assert!(!output.status.success());
}

#[test]
fn cli_validates_embedded_matrix() {
    let output = run(&["validate"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("<embedded>"));
    assert!(out.contains("Issues:      none"));
}

#[test]
fn cli_check_allowed_and_denied() {
    let allowed = run(&["check", "calendar:view", "-m", "coach"]);
    assert!(allowed.status.success());
    assert!(stdout(&allowed).contains("calendar:view: allowed"));

    let denied = run(&["check", "wallet:escrow:release", "-m", "freelancer"]);
    assert!(!denied.status.success());
    assert!(stdout(&denied).contains("wallet:escrow:release: denied"));
    assert!(String::from_utf8_lossy(&denied.stderr).contains("Permission denied"));
}

#[test]
fn cli_check_with_explicit_grant() {
    let output = run(&["check", "wallet:view", "-m", "mentor", "-g", "wallet:view"]);
    assert!(output.status.success());
}

#[test]
fn cli_resolve_json_snapshot() {
    let output = run(&["resolve", "--json", "-m", "mentor,workspace_admin"]);
    assert!(output.status.success());

    let value: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("resolve --json should emit JSON");
    let memberships = value["memberships"].as_array().unwrap();
    assert_eq!(memberships.len(), 2);

    let calendar_view = value["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["permission"] == "calendar:view")
        .expect("calendar:view should be resolved");
    assert_eq!(
        calendar_view["sources"],
        serde_json::json!(["mentor", "workspace_admin"])
    );
}

#[test]
fn cli_explain_unknown_permission_fails() {
    let output = run(&["explain", "calendar:export", "-m", "mentor"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown permission"));
}

#[test]
fn cli_explain_lists_escalation() {
    let output = run(&["explain", "compliance:review", "-m", "freelancer"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Granted:  no"));
    assert!(out.contains("compliance_officer"));
}

#[test]
fn cli_validate_broken_matrix_strict_and_lenient() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_broken_matrix(&dir);
    let path = path.as_str();

    let strict = run(&["validate", "--matrix", path]);
    assert!(!strict.status.success());
    assert!(stdout(&strict).contains("implies unknown permission gigs:view"));

    let lenient = run(&["validate", "--matrix", path, "--lenient"]);
    assert!(lenient.status.success());

    let resolved = run(&[
        "check",
        "gigs:publish",
        "--matrix",
        path,
        "--lenient",
        "-m",
        "freelancer",
    ]);
    assert!(resolved.status.success());
}

#[test]
fn cli_reads_matrix_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("matrix.json");
    std::fs::write(
        &path,
        r#"{
            "permissions": [{"key": "reports:export"}],
            "memberships": [{"key": "analyst", "permissions": ["reports:export"]}]
        }"#,
    )
    .unwrap();

    let output = gva_binary()
        .env("GIGVORA_PERMISSION_MATRIX", &path)
        .args(["permissions", "--json"])
        .output()
        .expect("failed to execute gva");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let list = value.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["key"], "reports:export");
}

#[test]
fn cli_memberships_filtered_by_tier() {
    let output = run(&["memberships", "--tier", "operations"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Memberships (4):"));
    for key in ["agency_admin", "workspace_admin", "finance_admin", "compliance_officer"] {
        assert!(out.contains(key), "missing {key} in:\n{out}");
    }
    assert!(!out.contains("freelancer"));
    assert!(!out.contains("platform_admin"));
}

#[test]
fn cli_memberships_table_is_aligned() {
    let output = run(&["memberships", "--tier", "platform"]);
    assert!(output.status.success());
    let row = format!(
        "  {:<22} {:<12} {:<24} {}",
        "platform_admin", "platform", "Platform admin", "* (grant all)"
    );
    let out = stdout(&output);
    assert!(out.lines().any(|line| line == row), "no aligned row in:\n{out}");
}

#[test]
fn cli_memberships_granting_json() {
    let output = run(&["memberships", "--granting", "wallet:escrow:view", "--json"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let keys: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["key"].as_str().unwrap())
        .collect();
    assert_eq!(
        keys,
        vec!["client", "agency_admin", "finance_admin", "platform_admin"]
    );
    assert_eq!(value[3]["grantAll"], true);
}

#[test]
fn cli_permissions_by_category_in_key_order() {
    let output = run(&["permissions", "--category", "wallet"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Permissions (4):"));

    let keys: Vec<&str> = out
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|word| word.starts_with("wallet:"))
        .collect();
    assert_eq!(
        keys,
        vec![
            "wallet:escrow:release",
            "wallet:escrow:view",
            "wallet:ledger:reconcile",
            "wallet:view",
        ]
    );
}

#[test]
fn cli_permissions_table_is_aligned() {
    let output = run(&["permissions", "--surface", "finance.escrow", "--limit", "1"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Permissions (1):"));

    let row = format!(
        "  {:<30} {:<14} {}",
        "wallet:escrow:release", "wallet", "Release escrow"
    );
    assert!(out.lines().any(|line| line == row), "no aligned row in:\n{out}");
}

#[test]
fn cli_permissions_pattern_json() {
    let output = run(&["permissions", "--pattern", "compliance:*", "--json"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let keys: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["key"].as_str().unwrap())
        .collect();
    assert_eq!(
        keys,
        vec!["compliance:manage", "compliance:review", "compliance:view"]
    );
    assert_eq!(value[0]["escalationPath"][0], "compliance_officer");
}

#[test]
fn cli_resolve_text_lists_sources() {
    let output = run(&["resolve", "-m", "coach", "-g", "ghost:perm"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Memberships: mentor"));
    assert!(out.contains("Permissions (3):"));

    let row = format!("  {:<30} via {}", "calendar:view", "mentor");
    assert!(out.lines().any(|line| line == row), "missing row in:\n{out}");
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown permission 'ghost:perm'"));
}

#[test]
fn cli_explain_json_shape() {
    let output = run(&["explain", "compliance:review", "-m", "freelancer", "--json"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["permission"], "compliance:review");
    assert_eq!(value["label"], "Review compliance");
    assert_eq!(value["granted"], false);
    assert_eq!(value["via_grant_all"], false);
    assert_eq!(value["sources"], serde_json::json!([]));
    assert_eq!(
        value["escalation_candidates"],
        serde_json::json!(["compliance_officer", "platform_admin"])
    );
}

#[test]
fn cli_lenient_flag_ignores_invalid_environment_mode() {
    let output = gva_binary()
        .env("GIGVORA_PERMISSION_MODE", "yolo")
        .args(["--lenient", "validate"])
        .output()
        .expect("failed to execute gva");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let without_flag = gva_binary()
        .env("GIGVORA_PERMISSION_MODE", "yolo")
        .arg("validate")
        .output()
        .expect("failed to execute gva");
    assert!(!without_flag.status.success());
    assert!(String::from_utf8_lossy(&without_flag.stderr).contains("GIGVORA_PERMISSION_MODE"));
}

#[test]
fn cli_strict_flag_overrides_lenient_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_broken_matrix(&dir);

    let lenient_env = gva_binary()
        .env("GIGVORA_PERMISSION_MODE", "lenient")
        .args(["validate", "--matrix", &path])
        .output()
        .expect("failed to execute gva");
    assert!(lenient_env.status.success());

    let forced_strict = gva_binary()
        .env("GIGVORA_PERMISSION_MODE", "lenient")
        .args(["validate", "--strict", "--matrix", &path])
        .output()
        .expect("failed to execute gva");
    assert!(!forced_strict.status.success());
    assert!(stdout(&forced_strict).contains("implies unknown permission gigs:view"));
}

#[test]
fn cli_rejects_strict_with_lenient() {
    let output = run(&["validate", "--strict", "--lenient"]);
    assert!(!output.status.success());
}
