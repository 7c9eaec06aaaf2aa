//! Report rendering
//!
//! Human output mirrors the layout Home Assistant users know from the
//! config check scripts: error and warning sections, the registry summary,
//! then a one-line verdict.

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::error::Result;
use crate::report::Report;

pub const BANNER_VALID: &str = "✅ All entity/device references are valid!";
pub const BANNER_WARNINGS: &str = "✅ Entity/device references are valid (with warnings)";
pub const BANNER_INVALID: &str = "❌ Invalid entity/device references found";

/// Output formatter for validation reports
pub struct Output {
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn render(&self, report: &Report, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Human => Ok(self.format_report(report)),
            OutputFormat::Json => format_json(report),
        }
    }

    pub fn format_report(&self, report: &Report) -> String {
        let mut output = String::new();

        if !report.errors.is_empty() {
            output.push_str(&self.colorize("ERRORS:", "31"));
            output.push('\n');
            for error in &report.errors {
                output.push_str(&format!("  ❌ {}\n", error));
            }
            output.push('\n');
        }

        if self.verbosity != VerbosityLevel::Quiet {
            if !report.warnings.is_empty() {
                output.push_str(&self.colorize("WARNINGS:", "33"));
                output.push('\n');
                for warning in &report.warnings {
                    output.push_str(&format!("  ⚠️  {}\n", warning));
                }
                output.push('\n');
            }

            output.push_str(&self.format_entity_summary(report));
        }

        if self.verbosity >= VerbosityLevel::Verbose {
            output.push_str(&format!(
                "Files checked: {} ({} invalid)\n\n",
                report.files_checked, report.files_invalid
            ));
        }

        output.push_str(&self.format_banner(report));
        output.push('\n');
        output
    }

    fn format_entity_summary(&self, report: &Report) -> String {
        let mut output = String::new();
        if report.entity_summary.is_empty() {
            return output;
        }

        output.push_str(&self.colorize("AVAILABLE ENTITIES BY DOMAIN:", "36"));
        output.push('\n');
        for (domain, info) in &report.entity_summary {
            output.push_str(&format!(
                "  {}: {} enabled, {} disabled\n",
                domain, info.enabled, info.disabled
            ));
            if !info.examples.is_empty() {
                output.push_str(&format!("    Examples: {}\n", info.examples.join(", ")));
            }
        }
        output.push('\n');
        output
    }

    fn format_banner(&self, report: &Report) -> String {
        if !report.is_success() {
            self.colorize(BANNER_INVALID, "31")
        } else if report.has_warnings() {
            self.colorize(BANNER_WARNINGS, "33")
        } else {
            self.colorize(BANNER_VALID, "32")
        }
    }
}

/// Pretty-printed JSON document of the whole report
pub fn format_json(report: &Report) -> Result<String> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Issue;
    use crate::report::DomainSummary;
    use std::path::Path;

    fn create_test_report() -> Report {
        let mut report = Report::new();
        report.files_checked = 3;
        report.files_invalid = 1;
        report.push(
            Some(Path::new("automations.yaml")),
            Issue::UnknownEntity {
                entity_id: "light.missing".to_string(),
            },
        );
        report.push(
            Some(Path::new("automations.yaml")),
            Issue::UnknownArea {
                area_id: "attic".to_string(),
            },
        );
        report.entity_summary.insert(
            "light".to_string(),
            DomainSummary {
                count: 2,
                enabled: 1,
                disabled: 1,
                examples: vec!["light.kitchen".to_string(), "light.porch".to_string()],
            },
        );
        report
    }

    #[test]
    fn test_human_report_layout() {
        let output = Output::new(VerbosityLevel::Normal).with_colors(false);
        let formatted = output.format_report(&create_test_report());

        let expected = "\
ERRORS:
  ❌ automations.yaml: Unknown entity 'light.missing'

WARNINGS:
  ⚠️  automations.yaml: Unknown area 'attic'

AVAILABLE ENTITIES BY DOMAIN:
  light: 1 enabled, 1 disabled
    Examples: light.kitchen, light.porch

❌ Invalid entity/device references found
";
        assert_eq!(formatted, expected);
    }

    #[test]
    fn test_quiet_report() {
        let output = Output::new(VerbosityLevel::Quiet).with_colors(false);
        let formatted = output.format_report(&create_test_report());

        assert!(formatted.contains("Unknown entity"));
        assert!(!formatted.contains("WARNINGS:"));
        assert!(!formatted.contains("AVAILABLE ENTITIES"));
        assert!(formatted.ends_with(&format!("{}\n", BANNER_INVALID)));
    }

    #[test]
    fn test_verbose_report_counts_files() {
        let output = Output::new(VerbosityLevel::Verbose).with_colors(false);
        let formatted = output.format_report(&create_test_report());
        assert!(formatted.contains("Files checked: 3 (1 invalid)"));
    }

    #[test]
    fn test_banners() {
        let output = Output::new(VerbosityLevel::Normal).with_colors(false);

        let mut report = Report::new();
        assert_eq!(output.format_report(&report), format!("{}\n", BANNER_VALID));

        report.push(None, Issue::NoConfigFiles);
        assert!(output.format_report(&report).ends_with(&format!("{}\n", BANNER_WARNINGS)));
    }

    #[test]
    fn test_colors() {
        let output = Output::new(VerbosityLevel::Normal).with_colors(true);
        let formatted = output.format_report(&Report::new());
        assert!(formatted.starts_with("\x1b[32m"));
    }

    #[test]
    fn test_json_report() {
        let json = Output::new(VerbosityLevel::Normal)
            .render(&create_test_report(), OutputFormat::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["errors"][0]["code"], "unknown_entity");
        assert_eq!(value["warnings"][0]["severity"], "warning");
        assert_eq!(value["entity_summary"]["light"]["enabled"], 1);
        assert_eq!(value["files_checked"], 3);
    }
}
