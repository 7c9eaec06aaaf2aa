//! Reference extraction over parsed configuration trees
//!
//! Four independent walks share one traversal driver. Each walk decides per
//! mapping entry whether the entry is a reference it collects or a subtree to
//! descend into. Traversal uses an explicit stack so deeply nested blueprint
//! documents cannot exhaust the call stack.

use std::collections::BTreeSet;

use crate::classify;
use crate::node::ConfigNode;
use crate::template;

pub const ENTITY_KEYS: [&str; 3] = ["entity_id", "entity_ids", "entities"];
pub const DEVICE_KEYS: [&str; 2] = ["device_id", "device_ids"];
pub const AREA_KEYS: [&str; 2] = ["area_id", "area_ids"];

/// Key whose values may hold entity registry identifiers
pub const REGISTRY_ID_KEY: &str = "entity_id";

pub type ReferenceSet = BTreeSet<String>;

/// Every reference found in one configuration document
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct References {
    /// `domain.object` identifiers, including those found in templates
    pub entities: ReferenceSet,
    /// 32-character hex registry identifiers used in place of entity ids
    pub registry_ids: ReferenceSet,
    pub devices: ReferenceSet,
    pub areas: ReferenceSet,
}

impl References {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
            && self.registry_ids.is_empty()
            && self.devices.is_empty()
            && self.areas.is_empty()
    }

    pub fn total(&self) -> usize {
        self.entities.len() + self.registry_ids.len() + self.devices.len() + self.areas.len()
    }
}

/// Run all four walks over `tree`
pub fn extract_all(tree: &ConfigNode) -> References {
    References {
        entities: extract_entity_references(tree),
        registry_ids: extract_registry_ids(tree),
        devices: extract_device_references(tree),
        areas: extract_area_references(tree),
    }
}

/// Plain entity identifiers, including those embedded in templates
///
/// Values under entity keys are filtered through
/// [`classify::should_skip_plain_reference`]. Service-call `data` payloads and
/// any other nested structure are covered by the general descent.
pub fn extract_entity_references(tree: &ConfigNode) -> ReferenceSet {
    let mut found = ReferenceSet::new();

    walk_entries(tree, |key, value| {
        if ENTITY_KEYS.contains(&key) {
            found.extend(
                string_values(value)
                    .filter(|candidate| !classify::should_skip_plain_reference(candidate))
                    .map(str::to_string),
            );
            return false;
        }
        if DEVICE_KEYS.contains(&key) || AREA_KEYS.contains(&key) {
            return false;
        }
        if let Some(text) = value.as_str()
            && template::has_template_call(text)
        {
            found.extend(template::extract_entities(text));
            return false;
        }
        true
    });

    found
}

/// Registry identifiers written under `entity_id`, at any depth
pub fn extract_registry_ids(tree: &ConfigNode) -> ReferenceSet {
    let mut found = ReferenceSet::new();

    walk_entries(tree, |key, value| {
        if key != REGISTRY_ID_KEY {
            return true;
        }
        found.extend(
            string_values(value)
                .filter(|candidate| classify::is_registry_id(candidate))
                .map(str::to_string),
        );
        false
    });

    found
}

pub fn extract_device_references(tree: &ConfigNode) -> ReferenceSet {
    collect_keyed(tree, &DEVICE_KEYS)
}

pub fn extract_area_references(tree: &ConfigNode) -> ReferenceSet {
    collect_keyed(tree, &AREA_KEYS)
}

/// Strings under any of `keys`, minus tag placeholders
fn collect_keyed(tree: &ConfigNode, keys: &[&str]) -> ReferenceSet {
    let mut found = ReferenceSet::new();

    walk_entries(tree, |key, value| {
        if !keys.contains(&key) {
            return true;
        }
        found.extend(
            string_values(value)
                .filter(|candidate| !classify::is_tag_placeholder(candidate))
                .map(str::to_string),
        );
        false
    });

    found
}

/// Visit every mapping entry reachable from `root`
///
/// `visit` returns whether the entry's value should be descended into.
/// Sequence elements are always descended into.
fn walk_entries<'a, F>(root: &'a ConfigNode, mut visit: F)
where
    F: FnMut(&'a str, &'a ConfigNode) -> bool,
{
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        match node {
            ConfigNode::Mapping(entries) => {
                for (key, value) in entries {
                    if visit(key.as_str(), value) {
                        stack.push(value);
                    }
                }
            }
            ConfigNode::Sequence(items) => stack.extend(items),
            _ => {}
        }
    }
}

/// A string value, or the string elements of a sequence value
fn string_values(value: &ConfigNode) -> impl Iterator<Item = &str> {
    let items: &[ConfigNode] = match value {
        ConfigNode::Sequence(items) => items,
        single @ ConfigNode::String(_) => std::slice::from_ref(single),
        _ => &[],
    };
    items.iter().filter_map(ConfigNode::as_str)
}
