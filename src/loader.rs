//! YAML loader that normalizes Home Assistant custom tags
//!
//! Tags such as `!include`, `!include_dir_merge_named`, `!input` or `!secret`
//! are not resolved. A tagged scalar becomes the literal string
//! `"!<tag> <argument>"` so the classifier can recognize and skip it.
//!
//! Documents are read event by event into [`ConfigNode`] rather than through
//! `serde_yaml::Value`: a repeated key keeps its last value and is recorded,
//! and integers beyond 64 bits are kept as number text.

use std::fmt;
use std::path::Path;

use serde::de::{self, DeserializeSeed, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::node::ConfigNode;

const MERGE_KEY: &str = "<<";

/// A parsed configuration document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub tree: ConfigNode,
    /// Keys that appeared more than once in the same mapping, in document order
    pub duplicate_keys: Vec<String>,
}

/// Parse a YAML document, keeping track of repeated keys
pub fn parse_document(source: &str) -> Result<Document, LoadError> {
    let mut duplicate_keys = Vec::new();
    if is_blank_document(source) {
        return Ok(Document {
            tree: ConfigNode::Null,
            duplicate_keys,
        });
    }

    let tree = NodeSeed {
        duplicates: &mut duplicate_keys,
    }
    .deserialize(serde_yaml::Deserializer::from_str(source))?;

    Ok(Document {
        tree,
        duplicate_keys,
    })
}

/// Parse a YAML document into a [`ConfigNode`] tree
pub fn parse_str(source: &str) -> Result<ConfigNode, LoadError> {
    let document = parse_document(source)?;
    for key in &document.duplicate_keys {
        warn!(key = %key, "duplicate key, the last value is used");
    }
    Ok(document.tree)
}

/// Read and parse a configuration file
pub fn load_file(path: &Path) -> Result<Document, LoadError> {
    let bytes = std::fs::read(path)?;
    let source = String::from_utf8(bytes)?;
    debug!(path = %path.display(), bytes = source.len(), "parsing configuration file");
    parse_document(&source)
}

/// Comment-only or whitespace-only files carry no document
fn is_blank_document(source: &str) -> bool {
    source
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#') || line == "---")
}

struct NodeSeed<'a> {
    duplicates: &'a mut Vec<String>,
}

impl NodeSeed<'_> {
    fn reborrow(&mut self) -> NodeSeed<'_> {
        NodeSeed {
            duplicates: &mut *self.duplicates,
        }
    }
}

impl<'de> DeserializeSeed<'de> for NodeSeed<'_> {
    type Value = ConfigNode;

    fn deserialize<D>(self, deserializer: D) -> Result<ConfigNode, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for NodeSeed<'_> {
    type Value = ConfigNode;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a YAML configuration node")
    }

    fn visit_unit<E>(self) -> Result<ConfigNode, E> {
        Ok(ConfigNode::Null)
    }

    fn visit_none<E>(self) -> Result<ConfigNode, E> {
        Ok(ConfigNode::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<ConfigNode, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        self.deserialize(deserializer)
    }

    fn visit_bool<E>(self, value: bool) -> Result<ConfigNode, E> {
        Ok(ConfigNode::Bool(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<ConfigNode, E> {
        Ok(ConfigNode::Number(serde_yaml::Number::from(value).to_string()))
    }

    fn visit_u64<E>(self, value: u64) -> Result<ConfigNode, E> {
        Ok(ConfigNode::Number(serde_yaml::Number::from(value).to_string()))
    }

    fn visit_i128<E>(self, value: i128) -> Result<ConfigNode, E> {
        Ok(ConfigNode::Number(value.to_string()))
    }

    fn visit_u128<E>(self, value: u128) -> Result<ConfigNode, E> {
        Ok(ConfigNode::Number(value.to_string()))
    }

    fn visit_f64<E>(self, value: f64) -> Result<ConfigNode, E> {
        Ok(ConfigNode::Number(serde_yaml::Number::from(value).to_string()))
    }

    fn visit_str<E>(self, value: &str) -> Result<ConfigNode, E> {
        Ok(ConfigNode::String(value.to_string()))
    }

    fn visit_string<E>(self, value: String) -> Result<ConfigNode, E> {
        Ok(ConfigNode::String(value))
    }

    fn visit_seq<A>(mut self, mut seq: A) -> Result<ConfigNode, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element_seed(self.reborrow())? {
            items.push(item);
        }
        Ok(ConfigNode::Sequence(items))
    }

    fn visit_map<A>(mut self, mut map: A) -> Result<ConfigNode, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries: Vec<(String, ConfigNode)> = Vec::new();
        let mut merges = Vec::new();

        while let Some(key) = map.next_key_seed(self.reborrow())? {
            let key = key_text(key);
            let value = map.next_value_seed(self.reborrow())?;

            if key == MERGE_KEY {
                merges.push(value);
            } else if let Some(slot) = entries.iter_mut().find(|(existing, _)| *existing == key) {
                self.duplicates.push(key);
                slot.1 = value;
            } else {
                entries.push((key, value));
            }
        }

        for source in merges {
            merge_into::<A::Error>(&mut entries, source)?;
        }
        Ok(ConfigNode::Mapping(entries))
    }

    fn visit_enum<A>(self, data: A) -> Result<ConfigNode, A::Error>
    where
        A: EnumAccess<'de>,
    {
        let (tag, contents): (String, _) = data.variant()?;
        let tag = format!("!{}", tag.trim_start_matches('!'));

        Ok(match contents.newtype_variant_seed(self)? {
            node @ (ConfigNode::Mapping(_) | ConfigNode::Sequence(_)) => node,
            ConfigNode::Null => ConfigNode::String(tag),
            ConfigNode::String(argument) | ConfigNode::Number(argument) => {
                ConfigNode::String(format!("{tag} {argument}"))
            }
            ConfigNode::Bool(argument) => ConfigNode::String(format!("{tag} {argument}")),
        })
    }
}

/// `<<` merge: entries already present win, earlier sources win over later ones
fn merge_into<E: de::Error>(
    entries: &mut Vec<(String, ConfigNode)>,
    source: ConfigNode,
) -> Result<(), E> {
    match source {
        ConfigNode::Mapping(merged) => {
            for (key, value) in merged {
                if !entries.iter().any(|(existing, _)| *existing == key) {
                    entries.push((key, value));
                }
            }
            Ok(())
        }
        ConfigNode::Sequence(sources) => {
            for source in sources {
                match source {
                    mapping @ ConfigNode::Mapping(_) => merge_into(entries, mapping)?,
                    other => {
                        return Err(E::custom(format!(
                            "expected a mapping for merging, but found {}",
                            other.kind()
                        )));
                    }
                }
            }
            Ok(())
        }
        other => Err(E::custom(format!(
            "expected a mapping or list of mappings for merging, but found {}",
            other.kind()
        ))),
    }
}

fn key_text(key: ConfigNode) -> String {
    match key {
        ConfigNode::String(text) | ConfigNode::Number(text) => text,
        ConfigNode::Bool(b) => b.to_string(),
        ConfigNode::Null => "null".to_string(),
        complex => format!("{complex:?}"),
    }
}
