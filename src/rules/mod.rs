//
//  mod.rs
//  Archlint
//
//  Created by hak (tharun)
//

pub mod dependency;
pub mod structure;

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

use crate::config::RulesConfig;
use crate::error::{ArchlintError, Result};
use crate::graph::DependencyGraph;

pub use dependency::allow_list::{AllowListEntry, AllowListRule};
pub use dependency::no_circular::NoCircularRule;
pub use dependency::no_cross_feature::NoCrossFeatureImportRule;
pub use dependency::no_cross_layer::{LayerConfig, NoCrossLayerRule};
pub use structure::filename_case::{CaseStyle, FilenameCaseRule};
pub use structure::no_loose_files::NoLooseFilesRule;
pub use structure::required_feature_index::RequiredFeatureIndexRule;
pub use structure::required_files::{RequiredFilesRule, RequiredFilesTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Structure,
    Dependency,
}

/// Static description of a rule, used by listings and reporters.
#[derive(Debug, Clone, Copy)]
pub struct RuleMeta {
    pub description: &'static str,
    pub severity: Severity,
    pub category: RuleCategory,
}

/// One violation produced by rule evaluation. Purely descriptive; never
/// mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleViolation {
    pub rule_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub fixable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

/// Out-of-band sink a rule's fix step may use to report violations it
/// resolves during mutation.
pub type ReportSink<'a> = dyn Fn(&[RuleViolation]) + Sync + 'a;

/// Ephemeral, scan-scoped state handed to each rule.
pub struct RuleContext<'a> {
    pub root: &'a Path,
    pub files: &'a [String],
    pub fix: bool,
    pub verbose: bool,
    pub graph: &'a DependencyGraph,
    pub report: Option<&'a ReportSink<'a>>,
}

impl RuleContext<'_> {
    /// Forward a batch of violations to the report sink, if one is wired.
    pub fn emit(&self, violations: &[RuleViolation]) {
        if let Some(sink) = self.report {
            sink(violations);
        }
    }
}

/// The rule capability set. Built-in and externally supplied rules are
/// stored and dispatched identically through this trait; `fix` defaults to
/// a no-op for rules without one.
pub trait Rule: Send + Sync {
    fn id(&self) -> &str;
    fn meta(&self) -> RuleMeta;
    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleViolation>>;
    fn fix(&self, _ctx: &RuleContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Instantiate the built-in rules in their canonical order, honoring
/// per-rule overrides and the include/exclude lists from configuration.
pub fn built_in_rules(config: &RulesConfig) -> Vec<Box<dyn Rule>> {
    let mut rules: Vec<Box<dyn Rule>> = vec![
        Box::new(RequiredFeatureIndexRule),
        Box::new(RequiredFilesRule::new(config.required_files.clone())),
        Box::new(FilenameCaseRule::new(config.filename_case.clone())),
        Box::new(NoLooseFilesRule::new(config.no_loose_files.clone())),
        Box::new(NoCrossFeatureImportRule),
        Box::new(NoCrossLayerRule::new(config.no_cross_layer.clone())),
        Box::new(NoCircularRule),
        Box::new(AllowListRule::new(config.allow_list.clone())),
    ];

    if let Some(include) = &config.include {
        let mut picked: Vec<Box<dyn Rule>> = Vec::with_capacity(include.len());
        for id in include {
            if let Some(position) = rules.iter().position(|rule| rule.id() == id) {
                picked.push(rules.remove(position));
            }
        }
        rules = picked;
    }

    rules.retain(|rule| !config.exclude.iter().any(|id| id == rule.id()));
    rules
}

/// Reject malformed registry entries before any graph evaluation begins.
pub fn validate_rules(rules: &[Box<dyn Rule>]) -> Result<()> {
    let mut seen: HashSet<String> = HashSet::new();
    for rule in rules {
        let id = rule.id();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(ArchlintError::InvalidRule(format!(
                "malformed rule id {id:?}"
            )));
        }
        if !seen.insert(id.to_string()) {
            return Err(ArchlintError::InvalidRule(format!(
                "duplicate rule id {id:?}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_order_is_stable() {
        let rules = built_in_rules(&RulesConfig::default());
        let ids: Vec<&str> = rules.iter().map(|r| r.id()).collect();
        assert_eq!(
            ids,
            vec![
                "structure/required-feature-index",
                "structure/required-files",
                "structure/filename-case",
                "structure/no-loose-files",
                "dependency/no-cross-feature-import",
                "dependency/no-cross-layer",
                "dependency/no-circular",
                "dependency/allow-list",
            ]
        );
    }

    #[test]
    fn include_list_drives_selection_and_order() {
        let config = RulesConfig {
            include: Some(vec![
                "dependency/no-circular".to_string(),
                "structure/no-loose-files".to_string(),
            ]),
            ..Default::default()
        };
        let ids: Vec<String> = built_in_rules(&config)
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["dependency/no-circular", "structure/no-loose-files"]);
    }

    #[test]
    fn exclude_list_removes_rules() {
        let config = RulesConfig {
            exclude: vec!["dependency/allow-list".to_string()],
            ..Default::default()
        };
        let rules = built_in_rules(&config);
        assert!(rules.iter().all(|r| r.id() != "dependency/allow-list"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut rules = built_in_rules(&RulesConfig::default());
        rules.push(Box::new(NoCircularRule));
        assert!(validate_rules(&rules).is_err());
    }
}
