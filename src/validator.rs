//! Cross-reference validation of configuration files against the registries
//!
//! The validator is synchronous. Registries are read lazily on first use and
//! kept for the lifetime of the validator, so one instance validates a whole
//! directory against a single consistent snapshot. Diagnostics accumulate in
//! the owned [`Report`] and never abort the run.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::classify;
use crate::error::{Issue, LoadError, RegistryError, Result, Severity};
use crate::extract::{self, References};
use crate::file_discovery::FileDiscovery;
use crate::loader;
use crate::node::ConfigNode;
use crate::registry::{
    self, AreaRegistry, DeviceRegistry, EntityRegistry, RegistryIdIndex, STORAGE_DIR,
};
use crate::report::{self, Report};
use crate::structure;

/// Files that only hold credentials and are never checked
pub const SECRETS_FILE: &str = "secrets.yaml";

pub fn is_secrets_file(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == SECRETS_FILE)
}

/// Borrowed view of the loaded registries
#[derive(Debug, Clone, Copy)]
pub struct Registries<'a> {
    pub entities: &'a EntityRegistry,
    pub devices: &'a DeviceRegistry,
    pub areas: &'a AreaRegistry,
    pub index: &'a RegistryIdIndex,
}

/// Lazily loaded registries; a failed load is memoized as empty
#[derive(Debug, Default)]
struct RegistryCache {
    entities: Option<EntityRegistry>,
    devices: Option<DeviceRegistry>,
    areas: Option<AreaRegistry>,
    index: Option<RegistryIdIndex>,
}

impl RegistryCache {
    fn load(&mut self, storage_dir: &Path, report: &mut Report) -> Registries<'_> {
        let entities = self.entities.get_or_insert_with(|| {
            load_or_report(registry::load_entity_registry(storage_dir), report)
        });
        let devices = self.devices.get_or_insert_with(|| {
            load_or_report(registry::load_device_registry(storage_dir), report)
        });
        let areas = self.areas.get_or_insert_with(|| {
            load_or_report(registry::load_area_registry(storage_dir), report)
        });
        let index = self.index.get_or_insert_with(|| {
            let index = RegistryIdIndex::build(entities);
            for duplicate in index.duplicate_errors() {
                warn!(error = %duplicate, "ambiguous registry id");
                report.push(None, duplicate.into());
            }
            debug!(registry_ids = index.len(), "built registry id index");
            index
        });

        Registries {
            entities,
            devices,
            areas,
            index,
        }
    }

    fn entities(&mut self, storage_dir: &Path, report: &mut Report) -> &EntityRegistry {
        self.entities.get_or_insert_with(|| {
            load_or_report(registry::load_entity_registry(storage_dir), report)
        })
    }
}

fn load_or_report<T: Default>(
    loaded: std::result::Result<T, RegistryError>,
    report: &mut Report,
) -> T {
    loaded.unwrap_or_else(|e| {
        warn!(error = %e, "registry unavailable");
        report.push(None, e.into());
        T::default()
    })
}

/// Compare one file's references with the registries
///
/// Issues come back grouped as entities, registry ids, devices, then areas.
pub fn check_references(refs: &References, registries: Registries<'_>) -> Vec<Issue> {
    let mut issues = Vec::new();

    for entity_id in &refs.entities {
        if classify::is_registry_id(entity_id) {
            continue;
        }
        match registries.entities.get(entity_id) {
            None => issues.push(Issue::UnknownEntity {
                entity_id: entity_id.clone(),
            }),
            Some(record) if record.is_disabled() => issues.push(Issue::DisabledEntityReferenced {
                entity_id: entity_id.clone(),
            }),
            Some(_) => {}
        }
    }

    for registry_id in &refs.registry_ids {
        if registries.index.is_ambiguous(registry_id) {
            issues.push(Issue::AmbiguousEntityRegistryId {
                registry_id: registry_id.clone(),
            });
            continue;
        }
        match registries.index.get(registry_id) {
            None => issues.push(Issue::UnknownEntityRegistryId {
                registry_id: registry_id.clone(),
            }),
            Some(entity_id) => {
                if registries
                    .entities
                    .get(entity_id)
                    .is_some_and(|record| record.is_disabled())
                {
                    issues.push(Issue::DisabledEntityRegistryId {
                        registry_id: registry_id.clone(),
                        entity_id: entity_id.to_string(),
                    });
                }
            }
        }
    }

    issues.extend(
        refs.devices
            .iter()
            .filter(|device_id| !registries.devices.contains_key(*device_id))
            .map(|device_id| Issue::UnknownDevice {
                device_id: device_id.clone(),
            }),
    );

    issues.extend(
        refs.areas
            .iter()
            .filter(|area_id| !registries.areas.contains_key(*area_id))
            .map(|area_id| Issue::UnknownArea {
                area_id: area_id.clone(),
            }),
    );

    issues
}

/// Validates the entity, device and area references of a configuration directory
#[derive(Debug)]
pub struct ReferenceValidator {
    config_dir: PathBuf,
    storage_dir: PathBuf,
    discovery: FileDiscovery,
    check_structure: bool,
    registries: RegistryCache,
    report: Report,
}

impl ReferenceValidator {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let storage_dir = config_dir.join(STORAGE_DIR);
        Self {
            config_dir,
            storage_dir,
            discovery: FileDiscovery::new(),
            check_structure: true,
            registries: RegistryCache::default(),
            report: Report::new(),
        }
    }

    /// Replace the default discovery settings
    pub fn with_discovery(mut self, discovery: FileDiscovery) -> Self {
        self.discovery = discovery;
        self
    }

    /// Enable or disable the shape checks of the well-known files
    pub fn with_structure_checks(mut self, enabled: bool) -> Self {
        self.check_structure = enabled;
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Validate one parsed document; `file` labels its diagnostics
    ///
    /// Returns `false` when at least one error was recorded for this
    /// document. Warnings do not affect the result.
    pub fn validate_file(&mut self, tree: &ConfigNode, file: &Path) -> bool {
        if is_secrets_file(file) {
            debug!(file = %file.display(), "skipping secrets file");
            return true;
        }

        self.report.files_checked += 1;

        let mut issues: Vec<Issue> = Vec::new();
        if self.check_structure {
            issues.extend(structure::check_structure(file, tree).into_iter().map(Issue::from));
        }

        if tree.is_empty_document() {
            debug!(file = %file.display(), "empty document");
        } else {
            let refs = extract::extract_all(tree);
            debug!(
                file = %file.display(),
                entities = refs.entities.len(),
                registry_ids = refs.registry_ids.len(),
                devices = refs.devices.len(),
                areas = refs.areas.len(),
                "extracted references"
            );

            let registries = self.registries.load(&self.storage_dir, &mut self.report);
            issues.extend(check_references(&refs, registries));
        }

        self.record(file, issues)
    }

    /// Load and validate one file
    ///
    /// A file that cannot be read or parsed is recorded as an error and
    /// counts as invalid. Repeated keys are reported as warnings before the
    /// document is checked.
    pub fn validate_path(&mut self, path: &Path) -> bool {
        if is_secrets_file(path) {
            debug!(file = %path.display(), "skipping secrets file");
            return true;
        }

        match loader::load_file(path) {
            Ok(document) => {
                for key in document.duplicate_keys {
                    warn!(file = %path.display(), key = %key, "duplicate key");
                    self.report.push(Some(path), Issue::DuplicateKey { key });
                }
                self.validate_file(&document.tree, path)
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to load configuration file");
                let issue = match e {
                    LoadError::Encoding(_) => Issue::InvalidEncoding,
                    other => Issue::MalformedConfigFile {
                        details: other.to_string(),
                    },
                };
                self.report.files_checked += 1;
                self.record(path, vec![issue])
            }
        }
    }

    fn record(&mut self, file: &Path, issues: Vec<Issue>) -> bool {
        let mut valid = true;
        for issue in issues {
            if issue.severity() == Severity::Error {
                valid = false;
            }
            self.report.push(Some(file), issue);
        }

        if !valid {
            self.report.files_invalid += 1;
        }
        valid
    }

    /// Validate every discovered file of the configuration directory
    pub async fn validate_all(&mut self) -> Result<bool> {
        if !self.config_dir.exists() {
            self.report.push(
                None,
                Issue::ConfigDirMissing {
                    path: self.config_dir.clone(),
                },
            );
            return Ok(false);
        }

        let files = self.discovery.discover_files(&self.config_dir).await?;
        if files.is_empty() {
            self.report.push(None, Issue::NoConfigFiles);
            return Ok(true);
        }

        info!(
            config_dir = %self.config_dir.display(),
            files = files.len(),
            "validating configuration files"
        );

        let mut all_valid = true;
        for file in &files {
            if !self.validate_path(file) {
                all_valid = false;
            }
        }

        info!(
            errors = self.report.errors.len(),
            warnings = self.report.warnings.len(),
            "validation finished"
        );
        Ok(all_valid)
    }

    /// Finish the run and hand out the report with the entity summary
    pub fn into_report(mut self) -> Report {
        if self.config_dir.exists() {
            let entities = self
                .registries
                .entities(&self.storage_dir, &mut self.report);
            let summary = report::summarize_entities(entities);
            self.report.entity_summary = summary;
        }
        self.report
    }
}
