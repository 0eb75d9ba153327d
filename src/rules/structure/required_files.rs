//
//  required_files.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::Result;
use crate::paths::relative_to;
use crate::rules::{Rule, RuleCategory, RuleContext, RuleMeta, RuleViolation, Severity};

const RULE_ID: &str = "structure/required-files";

/// Files that must exist within a directory, with optional scaffold
/// templates keyed by file name.
#[derive(Debug, Clone, Deserialize)]
pub struct RequiredFilesTarget {
    pub directory: String,
    pub files: Vec<String>,
    #[serde(default)]
    pub templates: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequiredFilesOptions {
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub targets: Option<Vec<RequiredFilesTarget>>,
}

/// Ensure required files exist within target directories.
pub struct RequiredFilesRule {
    root_override: Option<String>,
    targets: Vec<RequiredFilesTarget>,
}

impl RequiredFilesRule {
    pub fn new(options: Option<RequiredFilesOptions>) -> Self {
        let options = options.unwrap_or_default();
        let targets = match options.targets {
            Some(targets) if !targets.is_empty() => targets,
            _ => vec![RequiredFilesTarget {
                directory: "src/features".to_string(),
                files: vec!["index.ts".to_string()],
                templates: None,
            }],
        };
        Self {
            root_override: options.root,
            targets,
        }
    }

    fn base_dir(&self, ctx: &RuleContext<'_>) -> PathBuf {
        match &self.root_override {
            Some(root) => ctx.root.join(root),
            None => ctx.root.to_path_buf(),
        }
    }
}

impl Rule for RequiredFilesRule {
    fn id(&self) -> &str {
        RULE_ID
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta {
            description: "Ensure required files exist within target directories.",
            severity: Severity::Error,
            category: RuleCategory::Structure,
        }
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleViolation>> {
        let base = self.base_dir(ctx);
        let mut violations = Vec::new();

        for target in &self.targets {
            for file in &target.files {
                let full_path = base.join(&target.directory).join(file);
                if full_path.exists() {
                    continue;
                }
                let relative = relative_to(ctx.root, &full_path);
                violations.push(RuleViolation {
                    rule_id: RULE_ID.to_string(),
                    message: format!(
                        "Required file \"{file}\" is missing in \"{}\".",
                        target.directory
                    ),
                    file: Some(relative.clone()),
                    line: None,
                    column: None,
                    fixable: true,
                    suggested_fix: Some(format!(
                        "Create {relative} or run archlint scan --fix to scaffold it."
                    )),
                });
            }
        }

        Ok(violations)
    }

    fn fix(&self, ctx: &RuleContext<'_>) -> Result<()> {
        let base = self.base_dir(ctx);

        for target in &self.targets {
            for file in &target.files {
                let full_path = base.join(&target.directory).join(file);
                if full_path.exists() {
                    continue;
                }
                if let Some(parent) = full_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let template = target
                    .templates
                    .as_ref()
                    .and_then(|templates| templates.get(file))
                    .map(String::as_str)
                    .unwrap_or("");
                fs::write(&full_path, template)?;
            }
        }

        Ok(())
    }
}
