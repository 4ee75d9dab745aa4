use assert_cmd::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn tabpilot(config: &Path) -> Command {
    let bin = assert_cmd::cargo::cargo_bin!("tabpilot");
    let mut cmd = Command::new(bin);
    cmd.env_remove("TABPILOT_POLICY_PATH")
        .env_remove("TABPILOT_LOG")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("tabpilot.yaml");
    std::fs::write(&path, body).unwrap();
    path
}

fn stdout_json(output: &Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("utf8 output");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn tools_list_reports_every_tool() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "");

    let assert = tabpilot(&config)
        .args(["tools", "list", "--json"])
        .assert()
        .success();
    let value = stdout_json(assert.get_output());
    let names: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["computer", "navigate", "tabs_context", "tabs_create", "gif_creator"]
    );
}

#[test]
fn computer_schema_lists_actions() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "");

    let assert = tabpilot(&config)
        .args(["tools", "schema", "computer"])
        .assert()
        .success();
    let value = stdout_json(assert.get_output());
    assert_eq!(value["name"], "computer");
    let schema = &value["input_schema"];
    assert_eq!(schema["type"], "object");
    let actions = schema["properties"]["action"]["enum"].as_array().unwrap();
    assert!(actions.iter().any(|a| a == "left_click_drag"));
    assert!(schema["required"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r == "action"));
}

#[test]
fn unknown_tool_schema_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "");

    tabpilot(&config)
        .args(["tools", "schema", "teleport"])
        .assert()
        .failure();
}

#[test]
fn config_validate_rejects_bad_quality() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "recording:\n  encode:\n    quality: 99\n");

    tabpilot(&config)
        .args(["config", "validate"])
        .assert()
        .failure();
}

#[test]
fn config_show_emits_effective_settings() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "actions:\n  scroll_tick_px: 40\n");

    let assert = tabpilot(&config)
        .args(["--output", "json", "config", "show"])
        .assert()
        .success();
    let value = stdout_json(assert.get_output());
    assert_eq!(value["actions"]["scroll_tick_px"], 40);
    assert_eq!(value["recording"]["max_frames"], 50);
}

#[test]
fn policy_check_follows_site_rules() {
    let dir = tempfile::tempdir().unwrap();
    let policy = dir.path().join("policy.yaml");
    std::fs::write(
        &policy,
        r#"
version: 1
defaults:
  prompt: true
sites:
  - match_pattern: "https://*.example.com"
    allow: ["navigate", "read_page_content"]
    deny: ["upload_image"]
"#,
    )
    .unwrap();
    let config = write_config(
        &dir,
        &format!("permissions:\n  policy_path: \"{}\"\n", policy.display()),
    );

    let decision = |url: &str, category: &str| {
        let assert = tabpilot(&config)
            .args(["--output", "json", "policy", "check", url, category])
            .assert()
            .success();
        stdout_json(assert.get_output())["decision"]
            .as_str()
            .unwrap()
            .to_string()
    };

    assert_eq!(decision("https://shop.example.com/cart", "navigate"), "allow");
    assert_eq!(decision("https://shop.example.com/cart", "upload_image"), "deny");
    assert_eq!(decision("https://shop.example.com/cart", "click"), "prompt");
    assert_eq!(decision("https://elsewhere.test/", "navigate"), "prompt");
}

#[test]
fn policy_check_rejects_unknown_category() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "");

    tabpilot(&config)
        .args(["policy", "check", "https://example.com", "teleport"])
        .assert()
        .failure();
}
