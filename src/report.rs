//! Accumulated diagnostics and the registry summary of one validation run

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::{Diagnostic, Issue, Severity};
use crate::registry::EntityRegistry;

/// Number of example entity ids kept per domain
pub const SUMMARY_EXAMPLES: usize = 3;

/// Entity counts for one domain of the registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainSummary {
    pub count: usize,
    pub enabled: usize,
    pub disabled: usize,
    /// First few entity ids of the domain, enabled or not
    pub examples: Vec<String>,
}

/// Group the entity registry by domain
pub fn summarize_entities(entities: &EntityRegistry) -> BTreeMap<String, DomainSummary> {
    let mut summary: BTreeMap<String, DomainSummary> = BTreeMap::new();

    for record in entities.values() {
        let domain = summary.entry(record.domain().to_string()).or_default();
        domain.count += 1;
        if record.is_disabled() {
            domain.disabled += 1;
        } else {
            domain.enabled += 1;
        }
        if domain.examples.len() < SUMMARY_EXAMPLES {
            domain.examples.push(record.entity_id.clone());
        }
    }

    summary
}

/// Outcome of validating a configuration directory
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub entity_summary: BTreeMap<String, DomainSummary>,
    pub files_checked: usize,
    pub files_invalid: usize,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue under its severity
    pub fn push(&mut self, file: Option<&Path>, issue: Issue) {
        let diagnostic = Diagnostic::new(file, issue);
        match diagnostic.severity() {
            Severity::Error => self.errors.push(diagnostic),
            Severity::Warning => self.warnings.push(diagnostic),
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn error_messages(&self) -> impl Iterator<Item = String> + '_ {
        self.errors.iter().map(ToString::to_string)
    }

    pub fn warning_messages(&self) -> impl Iterator<Item = String> + '_ {
        self.warnings.iter().map(ToString::to_string)
    }
}
