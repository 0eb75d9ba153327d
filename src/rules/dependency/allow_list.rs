//
//  allow_list.rs
//  Archlint
//
//  Created by hak (tharun)
//

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{ArchlintError, Result};
use crate::paths::{relative_to, to_posix};
use crate::rules::{Rule, RuleCategory, RuleContext, RuleMeta, RuleViolation, Severity};

const RULE_ID: &str = "dependency/allow-list";
const SUGGESTED_FIX: &str =
    "Move shared logic to an allowed module or expose a public API in the allowed list.";

/// One allow-list entry: files matching `from` may only import targets
/// matching at least one `allow` template. Templates support `$1`, `$2`, …
/// back-references into `from`'s capture groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowListEntry {
    pub from: String,
    pub allow: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AllowListOptions {
    #[serde(default)]
    pub entries: Option<Vec<AllowListEntry>>,
}

/// Restrict dependency edges using an allow-list.
pub struct AllowListRule {
    entries: Vec<AllowListEntry>,
}

fn default_entries() -> Vec<AllowListEntry> {
    vec![AllowListEntry {
        from: "^src/features/([a-zA-Z0-9-]+)/".to_string(),
        allow: vec![
            "^src/shared/".to_string(),
            "^src/features/$1/".to_string(),
        ],
    }]
}

/// Expand `$N` back-references in a template using the groups captured by
/// the `from` match. Unmatched groups expand to the empty string. The
/// expansion happens before the template is compiled, because group text is
/// only known at match time.
fn expand_backrefs(template: &str, captures: &Captures<'_>) -> String {
    let mut expanded = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek().is_some_and(|d| d.is_ascii_digit()) {
            let mut index = 0usize;
            while let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                index = index * 10 + digit as usize;
                chars.next();
            }
            if let Some(group) = captures.get(index) {
                expanded.push_str(group.as_str());
            }
        } else {
            expanded.push(c);
        }
    }

    expanded
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ArchlintError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

impl AllowListRule {
    pub fn new(options: Option<AllowListOptions>) -> Self {
        let entries = match options.and_then(|o| o.entries) {
            Some(entries) if !entries.is_empty() => entries,
            _ => default_entries(),
        };
        Self { entries }
    }

    fn collect_violations(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleViolation>> {
        let mut violations = Vec::new();

        for (file, imports) in ctx.graph {
            let normalized = to_posix(file);

            // A file may match several entries; each must be satisfied
            // independently per edge.
            for entry in &self.entries {
                let from = compile(&entry.from)?;
                let Some(captures) = from.captures(&normalized) else {
                    continue;
                };

                let allow: Vec<Regex> = entry
                    .allow
                    .iter()
                    .map(|template| compile(&expand_backrefs(template, &captures)))
                    .collect::<Result<_>>()?;

                for reference in imports {
                    let Some(resolved) = &reference.resolved else {
                        continue;
                    };
                    let target = relative_to(ctx.root, resolved);
                    if allow.iter().any(|regex| regex.is_match(&target)) {
                        continue;
                    }

                    violations.push(RuleViolation {
                        rule_id: RULE_ID.to_string(),
                        message: format!(
                            "Import from \"{target}\" is not allowed for module \"{normalized}\"."
                        ),
                        file: Some(normalized.clone()),
                        line: None,
                        column: None,
                        fixable: false,
                        suggested_fix: Some(SUGGESTED_FIX.to_string()),
                    });
                }
            }
        }

        Ok(violations)
    }
}

impl Rule for AllowListRule {
    fn id(&self) -> &str {
        RULE_ID
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta {
            description: "Restrict dependency edges using an allow-list.",
            severity: Severity::Error,
            category: RuleCategory::Dependency,
        }
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleViolation>> {
        self.collect_violations(ctx)
    }

    fn fix(&self, ctx: &RuleContext<'_>) -> Result<()> {
        let violations = self.collect_violations(ctx)?;
        if !violations.is_empty() {
            ctx.emit(&violations);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DependencyGraph, ImportReference};
    use std::path::{Path, PathBuf};

    fn entry(from: &str, allow: &[&str]) -> AllowListEntry {
        AllowListEntry {
            from: from.to_string(),
            allow: allow.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn graph_with_edges(root: &Path, from: &str, targets: &[&str]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        graph.insert(
            from.to_string(),
            targets
                .iter()
                .map(|t| ImportReference {
                    specifier: format!("./{t}"),
                    is_type_only: false,
                    resolved: Some(root.join(t)),
                })
                .collect(),
        );
        graph
    }

    fn run(root: &Path, graph: &DependencyGraph, entries: Vec<AllowListEntry>) -> Vec<RuleViolation> {
        let files: Vec<String> = graph.keys().cloned().collect();
        let ctx = RuleContext {
            root,
            files: &files,
            fix: false,
            verbose: false,
            graph,
            report: None,
        };
        AllowListRule::new(Some(AllowListOptions {
            entries: Some(entries),
        }))
        .check(&ctx)
        .unwrap()
    }

    #[test]
    fn back_references_scope_targets_to_the_matched_feature() {
        let root = PathBuf::from("/ws");
        let entries = vec![entry(
            "^src/features/([a-z]+)/",
            &["^src/features/$1/"],
        )];

        let same = graph_with_edges(&root, "src/features/cart/a.ts", &["src/features/cart/b.ts"]);
        assert!(run(&root, &same, entries.clone()).is_empty());

        let cross = graph_with_edges(
            &root,
            "src/features/cart/a.ts",
            &["src/features/payment/x.ts"],
        );
        let violations = run(&root, &cross, entries);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message,
            "Import from \"src/features/payment/x.ts\" is not allowed for module \"src/features/cart/a.ts\"."
        );
    }

    #[test]
    fn files_not_matching_from_are_ignored() {
        let root = PathBuf::from("/ws");
        let graph = graph_with_edges(&root, "src/shared/a.ts", &["src/features/cart/b.ts"]);
        let entries = vec![entry("^src/features/([a-z]+)/", &["^src/features/$1/"])];
        assert!(run(&root, &graph, entries).is_empty());
    }

    #[test]
    fn every_matching_entry_must_be_satisfied() {
        let root = PathBuf::from("/ws");
        let graph = graph_with_edges(&root, "src/features/cart/a.ts", &["src/shared/util.ts"]);
        let entries = vec![
            entry("^src/features/([a-z]+)/", &["^src/shared/", "^src/features/$1/"]),
            entry("^src/", &["^src/features/"]),
        ];
        // The first entry allows the edge, the second does not.
        let violations = run(&root, &graph, entries);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn default_entries_allow_shared_imports() {
        let root = PathBuf::from("/ws");
        let graph = graph_with_edges(&root, "src/features/cart/a.ts", &["src/shared/util.ts"]);
        let files: Vec<String> = graph.keys().cloned().collect();
        let ctx = RuleContext {
            root: &root,
            files: &files,
            fix: false,
            verbose: false,
            graph: &graph,
            report: None,
        };
        assert!(AllowListRule::new(None).check(&ctx).unwrap().is_empty());
    }

    #[test]
    fn unresolved_imports_are_exempt() {
        let root = PathBuf::from("/ws");
        let mut graph = DependencyGraph::new();
        graph.insert(
            "src/features/cart/a.ts".to_string(),
            vec![ImportReference {
                specifier: "react".to_string(),
                is_type_only: false,
                resolved: None,
            }],
        );
        let entries = vec![entry("^src/features/([a-z]+)/", &["^src/features/$1/"])];
        assert!(run(&root, &graph, entries).is_empty());
    }
}
