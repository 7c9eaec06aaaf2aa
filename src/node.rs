//! Parsed configuration document tree
//!
//! The reference extractor never sees YAML directly. The loader hands it a
//! [`ConfigNode`] in which custom tags have already been replaced by literal
//! `"!<tag> <argument>"` strings.

/// One node of a parsed configuration document
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConfigNode {
    /// Key/value pairs in document order; non-string keys are stringified
    Mapping(Vec<(String, ConfigNode)>),
    Sequence(Vec<ConfigNode>),
    String(String),
    /// Numeric scalar in its textual form
    Number(String),
    Bool(bool),
    #[default]
    Null,
}

impl ConfigNode {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigNode::String(value) => Some(value),
            _ => None,
        }
    }

    /// Look up a key in a mapping node
    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        match self {
            ConfigNode::Mapping(entries) => entries
                .iter()
                .find(|(candidate, _)| candidate == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(String, ConfigNode)]> {
        match self {
            ConfigNode::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[ConfigNode]> {
        match self {
            ConfigNode::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Name of the node type, for messages
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigNode::Mapping(_) => "a mapping",
            ConfigNode::Sequence(_) => "a sequence",
            ConfigNode::String(_) => "a string",
            ConfigNode::Number(_) => "a number",
            ConfigNode::Bool(_) => "a boolean",
            ConfigNode::Null => "null",
        }
    }

    /// An empty document parses to `Null`
    pub fn is_empty_document(&self) -> bool {
        matches!(self, ConfigNode::Null)
    }
}

impl From<&str> for ConfigNode {
    fn from(value: &str) -> Self {
        ConfigNode::String(value.to_string())
    }
}

impl From<String> for ConfigNode {
    fn from(value: String) -> Self {
        ConfigNode::String(value)
    }
}

impl From<serde_json::Value> for ConfigNode {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ConfigNode::Null,
            serde_json::Value::Bool(b) => ConfigNode::Bool(b),
            serde_json::Value::Number(n) => ConfigNode::Number(n.to_string()),
            serde_json::Value::String(s) => ConfigNode::String(s),
            serde_json::Value::Array(items) => {
                ConfigNode::Sequence(items.into_iter().map(ConfigNode::from).collect())
            }
            serde_json::Value::Object(map) => ConfigNode::Mapping(
                map.into_iter()
                    .map(|(key, value)| (key, ConfigNode::from(value)))
                    .collect(),
            ),
        }
    }
}
