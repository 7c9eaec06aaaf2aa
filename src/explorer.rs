//! Read-only browser over the entity registry
//!
//! Groups the enabled, visible entities by domain and by area so automation
//! authors can look up what exists without opening the `.storage` JSON.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::warn;

use crate::cli::EntitiesArgs;
use crate::error::{RefCheckError, RegistryError, Result};
use crate::registry::{self, AreaRegistry, EntityRecord, EntityRegistry, STORAGE_DIR};

/// Area label for entities without an assigned area
pub const NO_AREA: &str = "No Area";

/// Domains commonly used in automations, listed by the summary
pub const AUTOMATION_DOMAINS: [&str; 17] = [
    "binary_sensor",
    "camera",
    "climate",
    "cover",
    "device_tracker",
    "fan",
    "input_boolean",
    "input_number",
    "input_select",
    "light",
    "lock",
    "media_player",
    "person",
    "scene",
    "script",
    "sensor",
    "switch",
];

const SUMMARY_EXAMPLES: usize = 3;
const RULE_WIDTH: usize = 80;

/// One entity as shown by the browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityInfo {
    pub entity_id: String,
    pub name: String,
    pub area: String,
    pub device_class: Option<String>,
    pub platform: String,
    pub unit: Option<String>,
}

impl EntityInfo {
    fn domain(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map_or(self.entity_id.as_str(), |(domain, _)| domain)
    }

    fn has_area(&self) -> bool {
        self.area != NO_AREA
    }

    /// `entity_id (class) [unit] | Area`
    fn detail_line(&self) -> String {
        let mut line = format!("   {}", self.entity_id);
        if let Some(device_class) = &self.device_class {
            line.push_str(&format!(" ({device_class})"));
        }
        if let Some(unit) = &self.unit {
            line.push_str(&format!(" [{unit}]"));
        }
        if self.has_area() {
            line.push_str(&format!(" | {}", self.area));
        }
        line
    }

    fn matches(&self, query: &str) -> bool {
        self.entity_id.to_lowercase().contains(query)
            || self.name.to_lowercase().contains(query)
            || self
                .device_class
                .as_deref()
                .is_some_and(|class| class.to_lowercase().contains(query))
    }
}

/// Best human name: user name, then integration name, then the object id
pub fn display_name(record: &EntityRecord) -> String {
    if let Some(name) = record.name.as_deref().filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    if let Some(name) = record.original_name.as_deref().filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    let object_id = record
        .entity_id
        .rsplit('.')
        .next()
        .unwrap_or(&record.entity_id);
    title_case(&object_id.replace('_', " "))
}

fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if previous_is_letter {
            result.extend(c.to_lowercase());
        } else {
            result.extend(c.to_uppercase());
        }
        previous_is_letter = c.is_alphabetic();
    }
    result
}

/// Entities grouped for browsing
#[derive(Debug, Clone, Default)]
pub struct EntityExplorer {
    by_domain: BTreeMap<String, Vec<EntityInfo>>,
    by_area: BTreeMap<String, Vec<EntityInfo>>,
    automation_relevant: BTreeMap<String, Vec<EntityInfo>>,
    area_names: BTreeMap<String, String>,
}

impl EntityExplorer {
    /// Disabled and hidden entities are left out
    pub fn new(entities: &EntityRegistry, areas: &AreaRegistry) -> Self {
        let area_names: BTreeMap<String, String> = areas
            .values()
            .map(|area| (area.id.clone(), area.name.clone()))
            .collect();
        let mut explorer = Self {
            area_names,
            ..Self::default()
        };

        for record in entities.values() {
            if record.is_disabled() || record.is_hidden() {
                continue;
            }

            let area = record
                .area_id
                .as_ref()
                .and_then(|id| explorer.area_names.get(id))
                .cloned()
                .unwrap_or_else(|| NO_AREA.to_string());
            let info = EntityInfo {
                entity_id: record.entity_id.clone(),
                name: display_name(record),
                area,
                device_class: record
                    .original_device_class
                    .clone()
                    .or_else(|| record.device_class.clone()),
                platform: record.platform.clone(),
                unit: record.unit_of_measurement.clone(),
            };

            let domain = info.domain().to_string();
            if AUTOMATION_DOMAINS.contains(&domain.as_str()) {
                explorer
                    .automation_relevant
                    .entry(domain.clone())
                    .or_default()
                    .push(info.clone());
            }
            explorer
                .by_area
                .entry(info.area.clone())
                .or_default()
                .push(info.clone());
            explorer.by_domain.entry(domain).or_default().push(info);
        }

        explorer
    }

    pub fn entity_count(&self) -> usize {
        self.by_domain.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_domain.is_empty()
    }

    /// Output for the selected browsing mode
    pub fn render(&self, args: &EntitiesArgs) -> String {
        if let Some(query) = &args.search {
            self.render_search(query)
        } else if let Some(domain) = &args.domain {
            self.render_domains(Some(domain.as_str()))
        } else if let Some(area) = &args.area {
            self.render_areas(Some(area.as_str()))
        } else if args.full {
            let mut output = self.render_summary();
            output.push_str(&self.render_domains(None));
            output.push_str(&self.render_areas(None));
            output
        } else {
            self.render_summary()
        }
    }

    pub fn render_summary(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();
        out.push_str(&rule);
        out.push('\n');
        out.push_str("HOME ASSISTANT ENTITY REGISTRY SUMMARY\n");
        out.push_str(&rule);
        out.push('\n');

        out.push_str("\n📊 OVERVIEW:\n");
        out.push_str(&format!("   Total Entities: {}\n", self.entity_count()));
        out.push_str(&format!("   Domains: {}\n", self.by_domain.len()));
        out.push_str(&format!("   Areas: {}\n", self.by_area.len()));

        out.push_str("\n🤖 AUTOMATION-RELEVANT ENTITIES:\n");
        for (domain, entities) in &self.automation_relevant {
            out.push_str(&format!(
                "   {}: {} entities\n",
                domain.to_uppercase(),
                entities.len()
            ));
            for entity in entities.iter().take(SUMMARY_EXAMPLES) {
                out.push_str(&format!("     • {}", entity.entity_id));
                if entity.has_area() {
                    out.push_str(&format!(" ({})", entity.area));
                }
                if let Some(unit) = &entity.unit {
                    out.push_str(&format!(" [{unit}]"));
                }
                out.push('\n');
            }
            if entities.len() > SUMMARY_EXAMPLES {
                out.push_str(&format!(
                    "     ... and {} more\n",
                    entities.len() - SUMMARY_EXAMPLES
                ));
            }
            out.push('\n');
        }
        out
    }

    /// Every entity of one domain, or of all domains
    pub fn render_domains(&self, filter: Option<&str>) -> String {
        let mut out = section_header("ENTITIES BY DOMAIN");
        let domains: Vec<&str> = match filter {
            Some(domain) => vec![domain],
            None => self.by_domain.keys().map(String::as_str).collect(),
        };

        for domain in domains {
            let Some(entities) = self.by_domain.get(domain) else {
                out.push_str(&format!("Domain '{domain}' not found\n"));
                continue;
            };
            out.push_str(&format!(
                "\n🏷️  {} ({} entities):\n",
                domain.to_uppercase(),
                entities.len()
            ));
            for entity in sorted_by_id(entities) {
                out.push_str(&entity.detail_line());
                out.push('\n');
            }
        }
        out
    }

    /// Entity ids of one area grouped by domain, or of all areas
    ///
    /// The filter accepts an area name or an area id.
    pub fn render_areas(&self, filter: Option<&str>) -> String {
        let mut out = section_header("ENTITIES BY AREA");
        let areas: Vec<&str> = match filter {
            Some(area) => vec![self.area_names.get(area).map_or(area, String::as_str)],
            None => self.by_area.keys().map(String::as_str).collect(),
        };

        for area in areas {
            let Some(entities) = self.by_area.get(area) else {
                out.push_str(&format!("Area '{area}' not found\n"));
                continue;
            };
            out.push_str(&format!(
                "\n🏠 {} ({} entities):\n",
                area.to_uppercase(),
                entities.len()
            ));

            let mut by_domain: BTreeMap<&str, Vec<&EntityInfo>> = BTreeMap::new();
            for entity in sorted_by_id(entities) {
                by_domain.entry(entity.domain()).or_default().push(entity);
            }
            for (domain, members) in by_domain {
                let ids: Vec<&str> = members.iter().map(|e| e.entity_id.as_str()).collect();
                out.push_str(&format!("   {}: {}\n", domain, ids.join(", ")));
            }
        }
        out
    }

    /// Case-insensitive match on entity id, name and device class
    pub fn render_search(&self, query: &str) -> String {
        let mut out = format!("\n🔍 SEARCH RESULTS for '{query}':\n{}\n", "=".repeat(50));
        let needle = query.to_lowercase();

        let mut matches: Vec<&EntityInfo> = self
            .by_domain
            .values()
            .flatten()
            .filter(|entity| entity.matches(&needle))
            .collect();
        if matches.is_empty() {
            out.push_str("No matches found\n");
            return out;
        }

        matches.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        for entity in matches {
            out.push_str(&entity.detail_line());
            out.push('\n');
        }
        out
    }
}

fn section_header(title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("\n{rule}\n{title}\n{rule}\n")
}

fn sorted_by_id(entities: &[EntityInfo]) -> Vec<&EntityInfo> {
    let mut sorted: Vec<&EntityInfo> = entities.iter().collect();
    sorted.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
    sorted
}

/// Load the registries of `config_dir` and render the requested view
pub fn explore(config_dir: &Path, args: &EntitiesArgs) -> Result<String> {
    if !config_dir.exists() {
        return Err(RefCheckError::ConfigDirMissing {
            path: config_dir.to_path_buf(),
        });
    }

    let storage_dir = config_dir.join(STORAGE_DIR);
    let entities = registry::load_entity_registry(&storage_dir)?;
    let areas = match registry::load_area_registry(&storage_dir) {
        Ok(areas) => areas,
        Err(RegistryError::NotFound { .. }) => AreaRegistry::new(),
        Err(e) => {
            warn!(error = %e, "could not load area names");
            AreaRegistry::new()
        }
    };

    if entities.is_empty() {
        return Err(RefCheckError::NoEntities);
    }

    Ok(EntityExplorer::new(&entities, &areas).render(args))
}
