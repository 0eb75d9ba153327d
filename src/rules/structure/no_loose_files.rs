//
//  no_loose_files.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::fs;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::error::{ArchlintError, Result};
use crate::paths::to_posix;
use crate::rules::{Rule, RuleCategory, RuleContext, RuleMeta, RuleViolation, Severity};

const RULE_ID: &str = "structure/no-loose-files";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoLooseFilesOptions {
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub disallow_in: Option<Vec<String>>,
    #[serde(default)]
    pub allow_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub relocation_dir: Option<String>,
}

/// Prevent loose files from living outside designated directories.
pub struct NoLooseFilesRule {
    root_override: Option<String>,
    disallow_in: Vec<String>,
    allow_patterns: Vec<String>,
    relocation_dir: String,
}

impl NoLooseFilesRule {
    pub fn new(options: Option<NoLooseFilesOptions>) -> Self {
        let options = options.unwrap_or_default();
        Self {
            root_override: options.root,
            disallow_in: options
                .disallow_in
                .unwrap_or_else(|| vec!["src".to_string()]),
            allow_patterns: options.allow_patterns.unwrap_or_else(|| {
                vec![
                    "src/index.ts".to_string(),
                    "src/main.ts".to_string(),
                    "src/main.tsx".to_string(),
                ]
            }),
            relocation_dir: options
                .relocation_dir
                .unwrap_or_else(|| "src/shared/__loose__".to_string()),
        }
    }

    fn find_loose_files(&self, files: &[String]) -> Result<Vec<String>> {
        let disallow_roots: Vec<String> = self.disallow_in.iter().map(|d| to_posix(d)).collect();
        let allow: Vec<Regex> = self
            .allow_patterns
            .iter()
            .map(|pattern| compile_allow_pattern(&to_posix(pattern)))
            .collect::<Result<_>>()?;

        let mut results = Vec::new();
        for file in files {
            let relative = to_posix(file);
            let segments: Vec<&str> = relative.split('/').collect();

            let disallowed = disallow_roots.iter().any(|dir| {
                if dir.ends_with('/') {
                    relative.starts_with(dir.as_str())
                } else {
                    segments.len() == 2 && segments[0] == dir
                }
            });
            if !disallowed {
                continue;
            }
            if allow.iter().any(|regex| regex.is_match(&relative)) {
                continue;
            }
            results.push(relative);
        }

        Ok(results)
    }
}

/// Allow patterns are literal paths, with `*` as the only wildcard.
fn compile_allow_pattern(pattern: &str) -> Result<Regex> {
    let escaped = regex::escape(pattern).replace("\\*", ".*");
    Regex::new(&format!("^{escaped}$")).map_err(|e| ArchlintError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

impl Rule for NoLooseFilesRule {
    fn id(&self) -> &str {
        RULE_ID
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta {
            description: "Prevent loose files from living outside designated directories.",
            severity: Severity::Warning,
            category: RuleCategory::Structure,
        }
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleViolation>> {
        let loose = self.find_loose_files(ctx.files)?;
        Ok(loose
            .into_iter()
            .map(|relative| RuleViolation {
                rule_id: RULE_ID.to_string(),
                message: format!(
                    "File \"{relative}\" should be moved into a designated directory (e.g. features/, shared/)."
                ),
                file: Some(relative),
                line: None,
                column: None,
                fixable: true,
                suggested_fix: Some(format!(
                    "Move the file into {} or another appropriate module directory.",
                    self.relocation_dir
                )),
            })
            .collect())
    }

    fn fix(&self, ctx: &RuleContext<'_>) -> Result<()> {
        let loose = self.find_loose_files(ctx.files)?;
        if loose.is_empty() {
            return Ok(());
        }

        let base = match &self.root_override {
            Some(root) => ctx.root.join(root),
            None => ctx.root.to_path_buf(),
        };
        let relocation_dir = base.join(&self.relocation_dir);
        fs::create_dir_all(&relocation_dir)?;

        for relative in loose {
            let source = ctx.root.join(&relative);
            let Some(file_name) = source.file_name() else {
                continue;
            };
            let target = relocation_dir.join(file_name);

            // Relocation failures are reported, not fatal; the remaining
            // files still get moved.
            if let Err(e) = fs::rename(&source, &target) {
                if ctx.verbose {
                    warn!(source = %source.display(), error = %e, "failed to relocate loose file");
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyGraph;
    use std::path::Path;

    fn ctx<'a>(root: &'a Path, files: &'a [String], graph: &'a DependencyGraph) -> RuleContext<'a> {
        RuleContext {
            root,
            files,
            fix: true,
            verbose: false,
            graph,
            report: None,
        }
    }

    #[test]
    fn flags_files_directly_under_src() {
        let files = vec![
            "src/helpers.ts".to_string(),
            "src/index.ts".to_string(),
            "src/features/cart/service.ts".to_string(),
        ];
        let graph = DependencyGraph::new();
        let rule = NoLooseFilesRule::new(None);

        let violations = rule.check(&ctx(Path::new("/ws"), &files, &graph)).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].file.as_deref(), Some("src/helpers.ts"));
    }

    #[test]
    fn wildcard_allow_patterns_match() {
        let files = vec!["src/setup.generated.ts".to_string()];
        let graph = DependencyGraph::new();
        let rule = NoLooseFilesRule::new(Some(NoLooseFilesOptions {
            allow_patterns: Some(vec!["src/*.generated.ts".to_string()]),
            ..Default::default()
        }));

        assert!(rule.check(&ctx(Path::new("/ws"), &files, &graph)).unwrap().is_empty());
    }

    #[test]
    fn trailing_slash_disallows_whole_subtree() {
        let files = vec!["scripts/tools/gen.ts".to_string()];
        let graph = DependencyGraph::new();
        let rule = NoLooseFilesRule::new(Some(NoLooseFilesOptions {
            disallow_in: Some(vec!["scripts/".to_string()]),
            allow_patterns: Some(vec![]),
            ..Default::default()
        }));

        let violations = rule.check(&ctx(Path::new("/ws"), &files, &graph)).unwrap();
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn fix_relocates_loose_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/helpers.ts"), "export {};\n").unwrap();

        let files = vec!["src/helpers.ts".to_string()];
        let graph = DependencyGraph::new();
        let rule = NoLooseFilesRule::new(None);
        rule.fix(&ctx(dir.path(), &files, &graph)).unwrap();

        assert!(!dir.path().join("src/helpers.ts").exists());
        assert!(dir
            .path()
            .join("src/shared/__loose__/helpers.ts")
            .is_file());
    }
}
