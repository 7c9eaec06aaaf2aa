//! Registry snapshots from `<config>/.storage`
//!
//! Three JSON files are read: `core.entity_registry`, `core.device_registry`
//! and `core.area_registry`. Each becomes an id-keyed map. Unknown fields are
//! ignored so newer snapshot versions keep loading.

use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RegistryError;

/// Directory under the configuration root holding the registry snapshots
pub const STORAGE_DIR: &str = ".storage";

/// Which of the three registries a snapshot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    Entity,
    Device,
    Area,
}

impl RegistryKind {
    pub fn file_name(self) -> &'static str {
        match self {
            RegistryKind::Entity => "core.entity_registry",
            RegistryKind::Device => "core.device_registry",
            RegistryKind::Area => "core.area_registry",
        }
    }

    /// Lowercase name for use mid-sentence
    pub fn noun(self) -> &'static str {
        match self {
            RegistryKind::Entity => "entity",
            RegistryKind::Device => "device",
            RegistryKind::Area => "area",
        }
    }

    pub fn path_in(self, storage_dir: &Path) -> PathBuf {
        storage_dir.join(self.file_name())
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegistryKind::Entity => "Entity",
            RegistryKind::Device => "Device",
            RegistryKind::Area => "Area",
        };
        f.write_str(name)
    }
}

/// One entry of `core.entity_registry`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity_id: String,
    /// Internal registry identifier, stored as `id` in the snapshot
    #[serde(rename = "id", default)]
    pub registry_id: Option<String>,
    #[serde(default)]
    pub platform: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub unique_id: String,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub disabled_by: Option<String>,
    #[serde(default)]
    pub hidden_by: Option<String>,
    #[serde(default)]
    pub area_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub device_class: Option<String>,
    #[serde(default)]
    pub original_device_class: Option<String>,
    #[serde(default)]
    pub unit_of_measurement: Option<String>,
}

impl EntityRecord {
    pub fn is_disabled(&self) -> bool {
        self.disabled_by.is_some()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden_by.is_some()
    }

    /// The part of `entity_id` before the first dot
    pub fn domain(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map_or(self.entity_id.as_str(), |(domain, _)| domain)
    }
}

/// One entry of `core.device_registry`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub disabled_by: Option<String>,
}

/// One entry of `core.area_registry`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AreaRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

pub type EntityRegistry = BTreeMap<String, EntityRecord>;
pub type DeviceRegistry = BTreeMap<String, DeviceRecord>;
pub type AreaRegistry = BTreeMap<String, AreaRecord>;

#[derive(Deserialize)]
struct EntitySnapshot {
    #[serde(default)]
    data: EntitySection,
}

#[derive(Default, Deserialize)]
struct EntitySection {
    #[serde(default)]
    entities: Vec<EntityRecord>,
}

#[derive(Deserialize)]
struct DeviceSnapshot {
    #[serde(default)]
    data: DeviceSection,
}

#[derive(Default, Deserialize)]
struct DeviceSection {
    #[serde(default)]
    devices: Vec<DeviceRecord>,
}

#[derive(Deserialize)]
struct AreaSnapshot {
    #[serde(default)]
    data: AreaSection,
}

#[derive(Default, Deserialize)]
struct AreaSection {
    #[serde(default)]
    areas: Vec<AreaRecord>,
}

pub fn load_entity_registry(storage_dir: &Path) -> Result<EntityRegistry, RegistryError> {
    let snapshot: EntitySnapshot = read_snapshot(storage_dir, RegistryKind::Entity)?;
    Ok(snapshot
        .data
        .entities
        .into_iter()
        .map(|record| (record.entity_id.clone(), record))
        .collect())
}

pub fn load_device_registry(storage_dir: &Path) -> Result<DeviceRegistry, RegistryError> {
    let snapshot: DeviceSnapshot = read_snapshot(storage_dir, RegistryKind::Device)?;
    Ok(snapshot
        .data
        .devices
        .into_iter()
        .map(|record| (record.id.clone(), record))
        .collect())
}

pub fn load_area_registry(storage_dir: &Path) -> Result<AreaRegistry, RegistryError> {
    let snapshot: AreaSnapshot = read_snapshot(storage_dir, RegistryKind::Area)?;
    Ok(snapshot
        .data
        .areas
        .into_iter()
        .map(|record| (record.id.clone(), record))
        .collect())
}

fn read_snapshot<T: DeserializeOwned>(
    storage_dir: &Path,
    kind: RegistryKind,
) -> Result<T, RegistryError> {
    let path = kind.path_in(storage_dir);
    let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => RegistryError::NotFound {
            kind,
            path: path.clone(),
        },
        _ => RegistryError::Malformed {
            kind,
            details: e.to_string(),
        },
    })?;

    let snapshot = serde_json::from_str(&content).map_err(|e| RegistryError::Malformed {
        kind,
        details: e.to_string(),
    })?;
    debug!(registry = kind.noun(), path = %path.display(), "loaded registry snapshot");
    Ok(snapshot)
}

/// Some integrations store numeric unique ids
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Inverse mapping `registry_id → entity_id`
///
/// An identifier claimed by more than one entity is kept out of the mapping
/// and remembered as ambiguous together with every claimant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryIdIndex {
    ids: BTreeMap<String, String>,
    duplicates: BTreeMap<String, Vec<String>>,
}

impl RegistryIdIndex {
    pub fn build(entities: &EntityRegistry) -> Self {
        let mut index = Self::default();

        for record in entities.values() {
            let Some(registry_id) = &record.registry_id else {
                continue;
            };
            let entity_id = record.entity_id.clone();

            if let Some(claimants) = index.duplicates.get_mut(registry_id) {
                claimants.push(entity_id);
            } else if let Some(first) = index.ids.remove(registry_id) {
                index
                    .duplicates
                    .insert(registry_id.clone(), vec![first, entity_id]);
            } else {
                index.ids.insert(registry_id.clone(), entity_id);
            }
        }

        index
    }

    /// Entity id registered under `registry_id`, unless unknown or ambiguous
    pub fn get(&self, registry_id: &str) -> Option<&str> {
        self.ids.get(registry_id).map(String::as_str)
    }

    pub fn is_ambiguous(&self, registry_id: &str) -> bool {
        self.duplicates.contains_key(registry_id)
    }

    /// One error per identifier shared by several entities
    pub fn duplicate_errors(&self) -> impl Iterator<Item = RegistryError> + '_ {
        self.duplicates
            .iter()
            .map(|(registry_id, entity_ids)| RegistryError::DuplicateId {
                registry_id: registry_id.clone(),
                entity_ids: entity_ids.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
