//
//  required_feature_index.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::fs::OpenOptions;
use std::io::Write;

use indexmap::IndexSet;

use crate::error::Result;
use crate::paths::to_posix;
use crate::rules::{Rule, RuleCategory, RuleContext, RuleMeta, RuleViolation, Severity};

const RULE_ID: &str = "structure/required-feature-index";
const FEATURE_ROOT: &str = "src/features";
const REQUIRED_ENTRY: &str = "index.ts";

const SCAFFOLD_CONTENT: &str = "/**\n * Scaffolded by archlint.\n * Define the public API of this feature here.\n */\nexport {};\n";

/// Ensure each feature exposes an index.ts entry point.
pub struct RequiredFeatureIndexRule;

/// `src/features/<name>` for any path under the feature tree.
fn feature_root(file: &str) -> Option<String> {
    let normalized = to_posix(file);
    let segments: Vec<&str> = normalized.split('/').collect();
    let feature_index = segments.iter().position(|s| *s == "features")?;
    let feature_name = segments.get(feature_index + 1)?;
    Some(format!("{FEATURE_ROOT}/{feature_name}"))
}

fn find_missing_entries(files: &[String]) -> Vec<RuleViolation> {
    let feature_directories: IndexSet<String> =
        files.iter().filter_map(|f| feature_root(f)).collect();

    let mut missing = Vec::new();
    for feature_dir in &feature_directories {
        let entry_file = format!("{feature_dir}/{REQUIRED_ENTRY}");
        if files.iter().any(|f| *f == entry_file) {
            continue;
        }

        missing.push(RuleViolation {
            rule_id: RULE_ID.to_string(),
            message: format!("Missing \"{REQUIRED_ENTRY}\" in {feature_dir}."),
            file: Some(entry_file.clone()),
            line: None,
            column: None,
            fixable: true,
            suggested_fix: Some(format!(
                "Create {entry_file} to define the public entry point for this feature (run archlint scan --fix to scaffold)."
            )),
        });
    }

    missing
}

impl Rule for RequiredFeatureIndexRule {
    fn id(&self) -> &str {
        RULE_ID
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta {
            description: "Ensure each feature exposes an index.ts entry point.",
            severity: Severity::Warning,
            category: RuleCategory::Structure,
        }
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleViolation>> {
        Ok(find_missing_entries(ctx.files))
    }

    fn fix(&self, ctx: &RuleContext<'_>) -> Result<()> {
        let violations = find_missing_entries(ctx.files);
        if violations.is_empty() {
            return Ok(());
        }

        for violation in &violations {
            let Some(file) = &violation.file else {
                continue;
            };
            let Some(feature_dir) = feature_root(file) else {
                continue;
            };

            let path = ctx.root.join(feature_dir).join(REQUIRED_ENTRY);
            // create_new: a concurrently created entry file is never
            // clobbered.
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut handle) => handle.write_all(SCAFFOLD_CONTENT.as_bytes())?,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        let reported: Vec<RuleViolation> = violations
            .into_iter()
            .map(|violation| {
                let message = match &violation.file {
                    Some(file) => format!("Created {file}"),
                    None => violation.message.clone(),
                };
                RuleViolation {
                    message,
                    ..violation
                }
            })
            .collect();
        ctx.emit(&reported);

        Ok(())
    }
}
