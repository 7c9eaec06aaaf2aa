use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::classify;

/// Template call forms that name an entity, in match order
const TEMPLATE_PATTERNS: [&str; 7] = [
    r"states\('([^']+)'\)",
    r#"states\("([^"]+)"\)"#,
    r"states\.([a-zA-Z_][a-zA-Z0-9_]*\.[a-zA-Z_][a-zA-Z0-9_]*)",
    r"is_state\('([^']+)'",
    r#"is_state\("([^"]+)""#,
    r"state_attr\('([^']+)'",
    r#"state_attr\("([^"]+)""#,
];

/// Substrings that make a plain string worth scanning
pub const TEMPLATE_CALL_MARKERS: [&str; 3] = ["states(", "state_attr(", "is_state("];

static TEMPLATE_REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();

fn template_regexes() -> &'static [Regex] {
    TEMPLATE_REGEXES.get_or_init(|| {
        TEMPLATE_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern).expect("Failed to compile template pattern"))
            .collect()
    })
}

/// Whether `value` contains one of the entity-naming template calls
pub fn has_template_call(value: &str) -> bool {
    TEMPLATE_CALL_MARKERS
        .iter()
        .any(|marker| value.contains(marker))
}

/// Extract entity identifiers referenced by template function calls
///
/// Captures that do not look like `domain.object` are dropped.
pub fn extract_entities(template: &str) -> BTreeSet<String> {
    template_regexes()
        .iter()
        .flat_map(|regex| regex.captures_iter(template))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|candidate| classify::is_entity_id(candidate))
        .map(str::to_string)
        .collect()
}
