//! # ha-refcheck Library
//!
//! Checks that the entity, device and area references in a Home Assistant
//! configuration directory exist in the registry snapshots under `.storage`.
//! Unknown references are errors; references to disabled entities and
//! unknown areas are warnings. The shapes of `configuration.yaml`,
//! `automations.yaml` and `scripts.yaml` are checked alongside.

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod explorer;
pub mod extract;
pub mod file_discovery;
pub mod loader;
pub mod node;
pub mod output;
pub mod registry;
pub mod report;
pub mod structure;
pub mod template;
pub mod validator;

pub use cli::{Cli, Command, OutputFormat, VerbosityLevel};
pub use config::{Config, ConfigError, ConfigManager};
pub use error::{
    Diagnostic, Issue, LoadError, RefCheckError, RegistryError, Severity, StructureIssue,
};
pub use explorer::EntityExplorer;
pub use extract::{References, extract_all};
pub use file_discovery::FileDiscovery;
pub use loader::Document;
pub use node::ConfigNode;
pub use output::Output;
pub use registry::{
    AreaRecord, DeviceRecord, EntityRecord, RegistryIdIndex, RegistryKind,
};
pub use report::{DomainSummary, Report};
pub use validator::{ReferenceValidator, Registries};
