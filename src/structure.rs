//! Shape checks for the well-known top-level configuration files
//!
//! Only `configuration.yaml`, `automations.yaml` and `scripts.yaml` have a
//! required shape. Every other file passes unchecked.

use std::path::Path;

use crate::error::StructureIssue;
use crate::node::ConfigNode;

pub const CONFIGURATION_FILE: &str = "configuration.yaml";
pub const AUTOMATIONS_FILE: &str = "automations.yaml";
pub const SCRIPTS_FILE: &str = "scripts.yaml";

/// Top-level integrations that Home Assistant no longer accepts
pub const DEPRECATED_KEYS: [&str; 2] = ["discovery", "introduction"];

const BLUEPRINT_KEY: &str = "use_blueprint";

/// Check the document shape of `file`, chosen by its file name
pub fn check_structure(file: &Path, tree: &ConfigNode) -> Vec<StructureIssue> {
    let Some(name) = file.file_name().and_then(|name| name.to_str()) else {
        return Vec::new();
    };

    match name {
        CONFIGURATION_FILE => check_configuration(tree),
        AUTOMATIONS_FILE => check_automations(tree),
        SCRIPTS_FILE => check_scripts(tree),
        _ => Vec::new(),
    }
}

fn check_configuration(tree: &ConfigNode) -> Vec<StructureIssue> {
    if tree.as_mapping().is_none() {
        return vec![StructureIssue::ConfigurationNotMapping];
    }

    let mut issues = Vec::new();
    if !tree.contains_key("homeassistant") {
        issues.push(StructureIssue::MissingHomeAssistantSection);
    }
    issues.extend(
        DEPRECATED_KEYS
            .iter()
            .filter(|key| tree.contains_key(key))
            .map(|key| StructureIssue::DeprecatedKey {
                key: key.to_string(),
            }),
    );
    issues
}

fn check_automations(tree: &ConfigNode) -> Vec<StructureIssue> {
    if tree.is_empty_document() {
        return Vec::new();
    }
    let Some(automations) = tree.as_sequence() else {
        return vec![StructureIssue::AutomationsNotList];
    };

    let mut issues = Vec::new();
    for (index, automation) in automations.iter().enumerate() {
        if automation.as_mapping().is_none() {
            issues.push(StructureIssue::AutomationNotMapping { index });
            continue;
        }

        if !automation.contains_key(BLUEPRINT_KEY) {
            if !automation.contains_key("trigger") && !automation.contains_key("triggers") {
                issues.push(StructureIssue::AutomationMissingTrigger { index });
            }
            if !automation.contains_key("action") && !automation.contains_key("actions") {
                issues.push(StructureIssue::AutomationMissingAction { index });
            }
        }
        if !automation.contains_key("alias") {
            issues.push(StructureIssue::AutomationMissingAlias { index });
        }
    }
    issues
}

fn check_scripts(tree: &ConfigNode) -> Vec<StructureIssue> {
    if tree.is_empty_document() {
        return Vec::new();
    }
    let Some(scripts) = tree.as_mapping() else {
        return vec![StructureIssue::ScriptsNotMapping];
    };

    let mut issues = Vec::new();
    for (name, script) in scripts {
        if script.as_mapping().is_none() {
            issues.push(StructureIssue::ScriptNotMapping { name: name.clone() });
        } else if !script.contains_key(BLUEPRINT_KEY) && !script.contains_key("sequence") {
            issues.push(StructureIssue::ScriptMissingSequence { name: name.clone() });
        }
    }
    issues
}
