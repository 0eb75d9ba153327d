//
//  report.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::str::FromStr;

use crate::error::{ArchlintError, Result};
use crate::rules::RuleViolation;

/// Output shapes the reporting boundary understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Table,
    List,
    Json,
}

impl FromStr for ReportFormat {
    type Err = ArchlintError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "list" => Ok(Self::List),
            "json" => Ok(Self::Json),
            other => Err(ArchlintError::Config(format!(
                "unknown report mode: {other}. Supported values are 'table', 'list', or 'json'."
            ))),
        }
    }
}

/// Render a violation batch for the console.
pub fn render(violations: &[RuleViolation], format: ReportFormat, pretty: bool) -> Result<String> {
    match format {
        ReportFormat::Json => {
            let rendered = if pretty {
                serde_json::to_string_pretty(violations)?
            } else {
                serde_json::to_string(violations)?
            };
            Ok(rendered)
        }
        ReportFormat::List => Ok(render_list(violations)),
        ReportFormat::Table => Ok(render_table(violations)),
    }
}

fn location(violation: &RuleViolation) -> String {
    let mut location = violation.file.clone().unwrap_or_default();
    if let Some(line) = violation.line {
        location.push_str(&format!(":{line}"));
        if let Some(column) = violation.column {
            location.push_str(&format!(":{column}"));
        }
    }
    location
}

fn render_list(violations: &[RuleViolation]) -> String {
    if violations.is_empty() {
        return "No violations found.".to_string();
    }

    let mut out = String::new();
    for violation in violations {
        out.push_str(&format!("{}  {}\n", violation.rule_id, location(violation)));
        out.push_str(&format!("    {}\n", violation.message));
    }
    out
}

fn render_table(violations: &[RuleViolation]) -> String {
    if violations.is_empty() {
        return "No violations found.".to_string();
    }

    let rows: Vec<(String, String, &str)> = violations
        .iter()
        .map(|v| (v.rule_id.clone(), location(v), v.message.as_str()))
        .collect();

    let rule_width = rows
        .iter()
        .map(|(rule, _, _)| rule.len())
        .chain(["RULE".len()])
        .max()
        .unwrap_or(0);
    let location_width = rows
        .iter()
        .map(|(_, location, _)| location.len())
        .chain(["FILE".len()])
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!(
        "{:rule_width$}  {:location_width$}  MESSAGE\n",
        "RULE", "FILE"
    ));
    for (rule, location, message) in rows {
        out.push_str(&format!(
            "{rule:rule_width$}  {location:location_width$}  {message}\n"
        ));
    }
    out
}
