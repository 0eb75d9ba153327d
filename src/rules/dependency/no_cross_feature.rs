//
//  no_cross_feature.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::collections::HashMap;
use std::fs;

use crate::error::Result;
use crate::paths::{relative_to, to_posix};
use crate::rules::{Rule, RuleCategory, RuleContext, RuleMeta, RuleViolation, Severity};

const RULE_ID: &str = "dependency/no-cross-feature-import";
const SUGGESTED_FIX: &str = "Move shared code into 'src/shared' or expose a public API from the target feature instead of importing its internals.";

/// Disallow direct imports across feature modules.
pub struct NoCrossFeatureImportRule;

/// The path segment immediately following a `features` segment, or None
/// for paths outside the feature tree.
fn feature_name(relative_path: &str) -> Option<&str> {
    let normalized_segments: Vec<&str> = relative_path.split('/').collect();
    let feature_index = normalized_segments
        .iter()
        .position(|segment| *segment == "features")?;
    normalized_segments.get(feature_index + 1).copied()
}

/// Locate the first occurrence of `specifier` in the raw file text.
/// Returns 1-based line and column.
fn locate_specifier(content: &str, specifier: &str) -> (Option<usize>, Option<usize>) {
    let Some(index) = content.find(specifier) else {
        return (None, None);
    };

    let preceding = &content[..index];
    let line = preceding.matches('\n').count() + 1;
    let last_line = preceding.rsplit('\n').next().unwrap_or("");
    let column = last_line.chars().count() + 1;

    (Some(line), Some(column))
}

fn find_cross_feature_imports(ctx: &RuleContext<'_>) -> Result<Vec<RuleViolation>> {
    let mut violations = Vec::new();
    // The raw-text location search re-reads each offending source file at
    // most once per evaluation.
    let mut content_cache: HashMap<String, String> = HashMap::new();

    for (file, imports) in ctx.graph {
        let normalized = to_posix(file);
        let Some(source_feature) = feature_name(&normalized) else {
            continue;
        };
        let source_feature = source_feature.to_string();

        for reference in imports {
            let Some(resolved) = &reference.resolved else {
                continue;
            };
            let target = relative_to(ctx.root, resolved);
            if !target.starts_with("src/") {
                continue;
            }
            let Some(target_feature) = feature_name(&target) else {
                continue;
            };
            if target_feature == source_feature {
                continue;
            }

            if !content_cache.contains_key(&normalized) {
                let loaded = fs::read_to_string(ctx.root.join(&normalized))?;
                content_cache.insert(normalized.clone(), loaded);
            }
            let (line, column) = content_cache
                .get(&normalized)
                .map(|content| locate_specifier(content, &reference.specifier))
                .unwrap_or((None, None));

            violations.push(RuleViolation {
                rule_id: RULE_ID.to_string(),
                message: format!(
                    "Feature module \"{source_feature}\" cannot import from feature \"{target_feature}\"."
                ),
                file: Some(normalized.clone()),
                line,
                column,
                fixable: false,
                suggested_fix: Some(SUGGESTED_FIX.to_string()),
            });
        }
    }

    Ok(violations)
}

impl Rule for NoCrossFeatureImportRule {
    fn id(&self) -> &str {
        RULE_ID
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta {
            description: "Disallow direct imports across feature modules to preserve layering.",
            severity: Severity::Error,
            category: RuleCategory::Dependency,
        }
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleViolation>> {
        find_cross_feature_imports(ctx)
    }

    fn fix(&self, ctx: &RuleContext<'_>) -> Result<()> {
        let violations = find_cross_feature_imports(ctx)?;
        if !violations.is_empty() {
            ctx.emit(&violations);
        }
        Ok(())
    }
}
