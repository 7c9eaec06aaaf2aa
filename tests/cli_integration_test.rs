mod common;

use common::*;
use std::process::{Command, Output};

fn ha_refcheck(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ha-refcheck"))
        .args(args)
        .env_remove("HA_REFCHECK_CONFIG_DIR")
        .env_remove("HA_REFCHECK_VERBOSE")
        .env_remove("HA_REFCHECK_QUIET")
        .env_remove("HA_REFCHECK_FORMAT")
        .env_remove("HA_REFCHECK_EXCLUDE")
        .env_remove("HA_REFCHECK_LOG")
        .output()
        .expect("Failed to execute ha-refcheck")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_version() {
    let output = ha_refcheck(&["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("ha-refcheck 0.2.0"));
}

#[test]
fn test_help_lists_subcommands() {
    let output = ha_refcheck(&["--help"]);
    assert!(output.status.success());
    let help = stdout(&output);
    assert!(help.contains("check"));
    assert!(help.contains("entities"));
}

#[test]
fn test_valid_configuration_exits_zero() {
    let config = TestConfigDir::new();
    config.write_yaml(
        "automations.yaml",
        "- alias: Motion\n  triggers:\n    - trigger: state\n      entity_id: sensor.normal_sensor\n  actions:\n    - action: light.turn_on\n",
    );

    let output = ha_refcheck(&[config.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));

    let text = stdout(&output);
    assert!(text.contains("AVAILABLE ENTITIES BY DOMAIN:"));
    assert!(text.contains("✅ All entity/device references are valid!"));
}

#[test]
fn test_unknown_entity_exits_one() {
    let config = TestConfigDir::new();
    config.write_yaml("scenes.yaml", "entity_id: light.missing\n");

    let output = ha_refcheck(&["check", config.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));

    let text = stdout(&output);
    assert!(text.contains("ERRORS:"));
    assert!(text.contains("Unknown entity 'light.missing'"));
    assert!(text.contains("❌ Invalid entity/device references found"));
}

#[test]
fn test_warnings_do_not_fail_the_run() {
    let config = TestConfigDir::new();
    config.write_yaml("scenes.yaml", "entity_id: sensor.disabled_sensor\n");

    let output = ha_refcheck(&[config.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("(with warnings)"));
}

#[test]
fn test_missing_config_dir_exits_one() {
    let output = ha_refcheck(&["/nonexistent/homeassistant/config"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("does not exist"));
}

#[test]
fn test_json_format() {
    let config = TestConfigDir::new();
    config.write_yaml("scenes.yaml", "area_id: attic\n");

    let output = ha_refcheck(&["--format", "json", config.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["errors"].as_array().unwrap().len(), 0);
    assert_eq!(report["warnings"][0]["code"], "unknown_area");
    assert_eq!(report["entity_summary"]["sensor"]["disabled"], 1);
}

#[test]
fn test_exclude_skips_files() {
    let config = TestConfigDir::new();
    config.write_yaml("broken.yaml", "entity_id: light.missing\n");

    let output = ha_refcheck(&[
        "--exclude",
        "broken.yaml",
        config.path().to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_structure_errors_and_no_structure_flag() {
    let config = TestConfigDir::new();
    config.write_yaml("scripts.yaml", "morning:\n  alias: Morning\n");

    let output = ha_refcheck(&[config.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Script 'morning' missing required 'sequence' or 'use_blueprint'"));

    let output = ha_refcheck(&["--no-structure", config.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let output = ha_refcheck(&["-v", "-q", "config"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot be used with"));
}

#[test]
fn test_invalid_exclude_pattern_is_a_usage_error() {
    let config = TestConfigDir::new();
    let output = ha_refcheck(&["--exclude", "[unclosed", config.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Error:"));
}

#[test]
fn test_entities_summary() {
    let config = TestConfigDir::new();
    let output = ha_refcheck(&["entities", config.path().to_str().unwrap()]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("HOME ASSISTANT ENTITY REGISTRY SUMMARY"));
    // Disabled entities are not listed
    assert!(text.contains("Total Entities: 3"));
}

#[test]
fn test_entities_search() {
    let config = TestConfigDir::new();
    let output = ha_refcheck(&[
        "entities",
        "--search",
        "motion",
        config.path().to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("binary_sensor.test_motion_battery"));
    assert!(!text.contains("sensor.normal_sensor"));
}

#[test]
fn test_entities_without_registry_fails() {
    let config = TestConfigDir::empty();
    let output = ha_refcheck(&["entities", config.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
}
