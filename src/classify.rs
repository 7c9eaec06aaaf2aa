//! String classification for reference extraction
//!
//! Decides whether a string found under an entity key is a real entity
//! identifier or something that only looks like a value: a normalized tag
//! placeholder, a template, an opaque registry identifier or a keyword.
//! The rules are evaluated in [`SKIP_RULES`] order.

/// Keywords accepted wherever a list of entities is expected
pub const SPECIAL_KEYWORDS: [&str; 2] = ["all", "none"];

/// Length of an entity registry identifier (hex digits, no separators)
pub const REGISTRY_ID_LEN: usize = 32;

/// Why a string is not treated as a plain entity reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TagPlaceholder,
    Template,
    RegistryId,
    SpecialKeyword,
}

/// Skip rules in precedence order
pub const SKIP_RULES: [(SkipReason, fn(&str) -> bool); 4] = [
    (SkipReason::TagPlaceholder, is_tag_placeholder),
    (SkipReason::Template, is_template),
    (SkipReason::RegistryId, is_registry_id),
    (SkipReason::SpecialKeyword, is_special_keyword),
];

/// `!include`, `!input`, `!secret` and friends after normalization
pub fn is_tag_placeholder(value: &str) -> bool {
    value.starts_with('!')
}

/// True when `{{` is followed somewhere later by `}}`
pub fn is_template(value: &str) -> bool {
    value
        .find("{{")
        .is_some_and(|start| value[start + 2..].contains("}}"))
}

/// Exactly 32 lowercase hexadecimal characters
pub fn is_registry_id(value: &str) -> bool {
    value.len() == REGISTRY_ID_LEN
        && value
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

pub fn is_special_keyword(value: &str) -> bool {
    SPECIAL_KEYWORDS.contains(&value)
}

/// `domain.object` with exactly two non-empty segments
pub fn is_entity_id(value: &str) -> bool {
    let mut segments = value.split('.');
    matches!(
        (segments.next(), segments.next(), segments.next()),
        (Some(domain), Some(object), None) if !domain.is_empty() && !object.is_empty()
    )
}

/// First rule that excludes `value` from plain entity extraction
pub fn skip_reason(value: &str) -> Option<SkipReason> {
    SKIP_RULES
        .iter()
        .find(|(_, rule)| rule(value))
        .map(|(reason, _)| *reason)
}

pub fn should_skip_plain_reference(value: &str) -> bool {
    skip_reason(value).is_some()
}
