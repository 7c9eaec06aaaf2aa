use std::fmt;
use std::path::{Path, PathBuf};

use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;

use crate::registry::RegistryKind;

/// Main application error type for failures of the tool itself
#[derive(Error, Debug)]
pub enum RefCheckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Config directory {} does not exist", .path.display())]
    ConfigDirMissing { path: PathBuf },

    #[error("No entities found in registry")]
    NoEntities,

    #[error("Invalid glob pattern '{pattern}': {details}")]
    InvalidPattern { pattern: String, details: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures while reading a registry snapshot from `.storage`
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("{kind} registry not found: {}", .path.display())]
    NotFound { kind: RegistryKind, path: PathBuf },

    #[error("Failed to load {} registry: {details}", .kind.noun())]
    Malformed { kind: RegistryKind, details: String },

    #[error("Entity registry contains duplicate registry ID '{registry_id}' ({})", .entity_ids.join(", "))]
    DuplicateId {
        registry_id: String,
        entity_ids: Vec<String>,
    },
}

/// Failures while turning a configuration document into a tree
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("File must be UTF-8 encoded: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Whether a diagnostic fails the run or is only advisory
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A finding recorded while validating a configuration directory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    #[error("{registry} registry not found: {}", .path.display())]
    MissingRegistryFile {
        registry: RegistryKind,
        path: PathBuf,
    },

    #[error("Failed to load {} registry: {details}", .registry.noun())]
    MalformedRegistryFile {
        registry: RegistryKind,
        details: String,
    },

    #[error("Entity registry contains duplicate registry ID '{registry_id}' ({})", .entity_ids.join(", "))]
    DuplicateRegistryId {
        registry_id: String,
        entity_ids: Vec<String>,
    },

    #[error("Failed to load YAML - {details}")]
    MalformedConfigFile { details: String },

    #[error("File must be UTF-8 encoded")]
    InvalidEncoding,

    #[error("Duplicate key '{key}', the last value is used")]
    DuplicateKey { key: String },

    #[error(transparent)]
    Structure(#[from] StructureIssue),

    #[error("Config directory {} does not exist", .path.display())]
    ConfigDirMissing { path: PathBuf },

    #[error("No YAML files found in config directory")]
    NoConfigFiles,

    #[error("Unknown entity '{entity_id}'")]
    UnknownEntity { entity_id: String },

    #[error("Unknown entity registry ID '{registry_id}'")]
    UnknownEntityRegistryId { registry_id: String },

    #[error("Ambiguous entity registry ID '{registry_id}'")]
    AmbiguousEntityRegistryId { registry_id: String },

    #[error("Unknown device '{device_id}'")]
    UnknownDevice { device_id: String },

    #[error("References disabled entity '{entity_id}'")]
    DisabledEntityReferenced { entity_id: String },

    #[error("Entity registry ID '{registry_id}' references disabled entity '{entity_id}'")]
    DisabledEntityRegistryId {
        registry_id: String,
        entity_id: String,
    },

    #[error("Unknown area '{area_id}'")]
    UnknownArea { area_id: String },
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::Structure(issue) => issue.severity(),
            // Area references are optional, so is their registry
            Issue::MissingRegistryFile { registry, .. } if *registry == RegistryKind::Area => {
                Severity::Warning
            }
            Issue::NoConfigFiles
            | Issue::DuplicateKey { .. }
            | Issue::DisabledEntityReferenced { .. }
            | Issue::DisabledEntityRegistryId { .. }
            | Issue::UnknownArea { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Stable machine-readable identifier used by the JSON report
    pub fn code(&self) -> &'static str {
        match self {
            Issue::MissingRegistryFile { .. } => "missing_registry_file",
            Issue::MalformedRegistryFile { .. } => "malformed_registry_file",
            Issue::DuplicateRegistryId { .. } => "duplicate_registry_id",
            Issue::MalformedConfigFile { .. } => "malformed_config_file",
            Issue::InvalidEncoding => "invalid_encoding",
            Issue::DuplicateKey { .. } => "duplicate_key",
            Issue::Structure(issue) => issue.code(),
            Issue::ConfigDirMissing { .. } => "config_dir_missing",
            Issue::NoConfigFiles => "no_config_files",
            Issue::UnknownEntity { .. } => "unknown_entity",
            Issue::UnknownEntityRegistryId { .. } => "unknown_entity_registry_id",
            Issue::AmbiguousEntityRegistryId { .. } => "ambiguous_entity_registry_id",
            Issue::UnknownDevice { .. } => "unknown_device",
            Issue::DisabledEntityReferenced { .. } => "disabled_entity_referenced",
            Issue::DisabledEntityRegistryId { .. } => "disabled_entity_registry_id",
            Issue::UnknownArea { .. } => "unknown_area",
        }
    }
}

/// Shape problems of `configuration.yaml`, `automations.yaml` and `scripts.yaml`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureIssue {
    #[error("Configuration must be a dictionary")]
    ConfigurationNotMapping,

    #[error("Missing 'homeassistant' section")]
    MissingHomeAssistantSection,

    #[error("'{key}' is deprecated")]
    DeprecatedKey { key: String },

    #[error("Automations must be a list")]
    AutomationsNotList,

    #[error("Automation {index} must be a dictionary")]
    AutomationNotMapping { index: usize },

    #[error("Automation {index} missing 'trigger' or 'triggers'")]
    AutomationMissingTrigger { index: usize },

    #[error("Automation {index} missing 'action' or 'actions'")]
    AutomationMissingAction { index: usize },

    #[error("Automation {index} missing 'alias' (recommended)")]
    AutomationMissingAlias { index: usize },

    #[error("Scripts must be a dictionary")]
    ScriptsNotMapping,

    #[error("Script '{name}' must be a dictionary")]
    ScriptNotMapping { name: String },

    #[error("Script '{name}' missing required 'sequence' or 'use_blueprint'")]
    ScriptMissingSequence { name: String },
}

impl StructureIssue {
    pub fn severity(&self) -> Severity {
        match self {
            StructureIssue::MissingHomeAssistantSection
            | StructureIssue::DeprecatedKey { .. }
            | StructureIssue::AutomationMissingAlias { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            StructureIssue::ConfigurationNotMapping => "configuration_not_mapping",
            StructureIssue::MissingHomeAssistantSection => "missing_homeassistant_section",
            StructureIssue::DeprecatedKey { .. } => "deprecated_key",
            StructureIssue::AutomationsNotList => "automations_not_list",
            StructureIssue::AutomationNotMapping { .. } => "automation_not_mapping",
            StructureIssue::AutomationMissingTrigger { .. } => "automation_missing_trigger",
            StructureIssue::AutomationMissingAction { .. } => "automation_missing_action",
            StructureIssue::AutomationMissingAlias { .. } => "automation_missing_alias",
            StructureIssue::ScriptsNotMapping => "scripts_not_mapping",
            StructureIssue::ScriptNotMapping { .. } => "script_not_mapping",
            StructureIssue::ScriptMissingSequence { .. } => "script_missing_sequence",
        }
    }
}

impl From<RegistryError> for Issue {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { kind, path } => Issue::MissingRegistryFile {
                registry: kind,
                path,
            },
            RegistryError::Malformed { kind, details } => Issue::MalformedRegistryFile {
                registry: kind,
                details,
            },
            RegistryError::DuplicateId {
                registry_id,
                entity_ids,
            } => Issue::DuplicateRegistryId {
                registry_id,
                entity_ids,
            },
        }
    }
}

/// An [`Issue`] qualified with the file it was found in, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: Option<PathBuf>,
    pub issue: Issue,
}

impl Diagnostic {
    pub fn new(file: Option<&Path>, issue: Issue) -> Self {
        Self {
            file: file.map(Path::to_path_buf),
            issue,
        }
    }

    pub fn severity(&self) -> Severity {
        self.issue.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}: {}", file.display(), self.issue),
            None => write!(f, "{}", self.issue),
        }
    }
}

impl Serialize for Diagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Diagnostic", 4)?;
        state.serialize_field("file", &self.file)?;
        state.serialize_field("severity", &self.severity())?;
        state.serialize_field("code", self.issue.code())?;
        state.serialize_field("message", &self.issue.to_string())?;
        state.end()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RefCheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_display() {
        let unknown = Issue::UnknownEntityRegistryId {
            registry_id: "ffffffffffffffffffffffffffffffff".to_string(),
        };
        assert_eq!(
            unknown.to_string(),
            "Unknown entity registry ID 'ffffffffffffffffffffffffffffffff'"
        );

        let disabled = Issue::DisabledEntityRegistryId {
            registry_id: "11223344556677889900aabbccddeeff".to_string(),
            entity_id: "sensor.disabled_sensor".to_string(),
        };
        assert!(disabled.to_string().contains("disabled entity"));
        assert!(disabled.to_string().contains("sensor.disabled_sensor"));
    }

    #[test]
    fn test_issue_severity() {
        assert_eq!(
            Issue::UnknownEntity {
                entity_id: "light.x".to_string()
            }
            .severity(),
            Severity::Error
        );
        assert_eq!(
            Issue::UnknownArea {
                area_id: "attic".to_string()
            }
            .severity(),
            Severity::Warning
        );
        assert_eq!(
            Issue::MissingRegistryFile {
                registry: RegistryKind::Area,
                path: PathBuf::from(".storage/core.area_registry"),
            }
            .severity(),
            Severity::Warning
        );
        assert_eq!(
            Issue::MissingRegistryFile {
                registry: RegistryKind::Device,
                path: PathBuf::from(".storage/core.device_registry"),
            }
            .severity(),
            Severity::Error
        );
    }

    #[test]
    fn test_registry_error_conversion() {
        let err = RegistryError::NotFound {
            kind: RegistryKind::Entity,
            path: PathBuf::from("config/.storage/core.entity_registry"),
        };
        assert_eq!(
            err.to_string(),
            "Entity registry not found: config/.storage/core.entity_registry"
        );

        match Issue::from(err) {
            Issue::MissingRegistryFile { registry, .. } => {
                assert_eq!(registry, RegistryKind::Entity)
            }
            other => panic!("Expected MissingRegistryFile, got {:?}", other),
        }

        let malformed = RegistryError::Malformed {
            kind: RegistryKind::Device,
            details: "expected value at line 1 column 1".to_string(),
        };
        assert!(
            malformed
                .to_string()
                .starts_with("Failed to load device registry")
        );
    }

    #[test]
    fn test_diagnostic_display_is_file_qualified() {
        let diagnostic = Diagnostic::new(
            Some(Path::new("config/automations.yaml")),
            Issue::UnknownDevice {
                device_id: "abc".to_string(),
            },
        );
        assert_eq!(
            diagnostic.to_string(),
            "config/automations.yaml: Unknown device 'abc'"
        );

        let global = Diagnostic::new(None, Issue::NoConfigFiles);
        assert_eq!(global.to_string(), "No YAML files found in config directory");
    }

    #[test]
    fn test_diagnostic_serialization() {
        let diagnostic = Diagnostic::new(
            Some(Path::new("scripts.yaml")),
            Issue::UnknownArea {
                area_id: "attic".to_string(),
            },
        );
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["file"], "scripts.yaml");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["code"], "unknown_area");
        assert_eq!(json["message"], "Unknown area 'attic'");
    }

    #[test]
    fn test_structure_issues_keep_their_severity() {
        let missing_alias = Issue::from(StructureIssue::AutomationMissingAlias { index: 2 });
        assert_eq!(missing_alias.severity(), Severity::Warning);
        assert_eq!(missing_alias.code(), "automation_missing_alias");
        assert_eq!(missing_alias.to_string(), "Automation 2 missing 'alias' (recommended)");

        let not_list = Issue::from(StructureIssue::AutomationsNotList);
        assert_eq!(not_list.severity(), Severity::Error);
    }

    #[test]
    fn test_encoding_error_source() {
        use std::error::Error;

        let invalid = String::from_utf8(vec![0x66, 0xff, 0x6f]).unwrap_err();
        let err = LoadError::from(invalid);

        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("File must be UTF-8 encoded"));
    }
}
