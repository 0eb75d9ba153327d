//
//  mod.rs
//  Archlint
//
//  Created by hak (tharun)
//

pub mod discovery;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use path_clean::PathClean;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ArchlintConfig;
use crate::error::Result;
use crate::graph::{build_dependency_graph, DependencyGraphCache};
use crate::paths::{relative_to, to_posix};
use crate::resolver::{ModuleResolver, ResolverConfig};
use crate::rules::{built_in_rules, validate_rules, ReportSink, Rule, RuleContext, RuleViolation};

pub use discovery::scan_workspace_files;

const DEFAULT_TARGET_GLOB: &str = "**/*.{ts,tsx,js,jsx}";

/// Per-scan options.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Optional path or glob narrowing the scan scope.
    pub target: Option<String>,
    pub fix: bool,
    pub verbose: bool,
    /// Root-relative paths whose cache entries must be invalidated before
    /// this scan (watch mode).
    pub changed_files: Option<Vec<String>>,
}

/// The outcome handed to the reporting collaborator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub violations: Vec<RuleViolation>,
    pub files: Vec<String>,
    pub duration_ms: f64,
}

/// The scan scope an external watcher should subscribe to.
#[derive(Debug, Clone)]
pub struct ScanPatterns {
    pub root: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Out-of-band violation consumer, wired through to each rule's fix step.
pub type Reporter = Box<dyn Fn(&[RuleViolation]) + Send + Sync>;

/// Sequences file discovery → graph build → rule evaluation → optional fix.
///
/// The orchestrator owns the incremental extraction cache, so its lifetime
/// spans repeated scans in watch mode.
pub struct Orchestrator {
    root: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
    resolver_config: Option<ResolverConfig>,
    rules: Vec<Box<dyn Rule>>,
    cache: DependencyGraphCache,
    reporter: Option<Reporter>,
}

impl Orchestrator {
    /// Orchestrator over the built-in rules configured by `config`.
    pub fn new(cwd: &Path, config: ArchlintConfig) -> Result<Self> {
        Self::with_rules(cwd, config, Vec::new())
    }

    /// Orchestrator with additional externally supplied rules appended
    /// after the built-ins. The whole registry is validated up front.
    pub fn with_rules(
        cwd: &Path,
        config: ArchlintConfig,
        extra_rules: Vec<Box<dyn Rule>>,
    ) -> Result<Self> {
        let root = config.resolve_root(cwd);
        let mut rules = built_in_rules(&config.rules);
        rules.extend(extra_rules);
        validate_rules(&rules)?;

        let resolver_config = config
            .resolver
            .clone()
            .or_else(|| ResolverConfig::from_tsconfig(&root));

        Ok(Self {
            root,
            include: config.project.include,
            exclude: config.project.exclude,
            resolver_config,
            rules,
            cache: DependencyGraphCache::new(),
            reporter: None,
        })
    }

    /// Install the sink that receives out-of-band violations from rule fix
    /// steps.
    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Expose the scan scope so an external watcher can subscribe.
    pub fn scan_patterns(&self) -> ScanPatterns {
        ScanPatterns {
            root: self.root.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
        }
    }

    /// Run one full scan pipeline.
    pub fn scan(&self, options: &ScanOptions) -> Result<ScanResult> {
        let start = Instant::now();

        let include = match &options.target {
            Some(target) => derive_target_include(&self.root, target),
            None => self.include.clone(),
        };

        if let Some(changed) = &options.changed_files {
            if !changed.is_empty() {
                let absolute: Vec<PathBuf> = changed
                    .iter()
                    .map(|file| self.root.join(file).clean())
                    .collect();
                self.cache.invalidate(Some(&absolute));
                info!(changed = changed.len(), "invalidated changed files");
            }
        }

        let files = scan_workspace_files(&self.root, &include, &self.exclude)?;
        let resolver = ModuleResolver::with_config(&self.root, self.resolver_config.clone());
        let graph = build_dependency_graph(&files, &self.root, &resolver, Some(&self.cache))?;

        let sink = |batch: &[RuleViolation]| {
            if let Some(reporter) = &self.reporter {
                reporter(batch);
            }
        };
        let sink: &ReportSink<'_> = &sink;

        let mut violations: Vec<RuleViolation> = Vec::new();

        // Rules run strictly in registration order: a fix step may mutate
        // the filesystem, and later rules must still see the graph built at
        // scan start rather than a partially mutated tree.
        for rule in &self.rules {
            let ctx = RuleContext {
                root: &self.root,
                files: &files,
                fix: options.fix,
                verbose: options.verbose,
                graph: &graph,
                report: Some(sink),
            };

            violations.extend(rule.check(&ctx)?);

            if options.fix {
                if let Err(e) = rule.fix(&ctx) {
                    // A failed mutation must not starve the remaining
                    // rules' fix phases.
                    warn!(rule = rule.id(), error = %e, "fix step failed");
                }
            }
        }

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            files = files.len(),
            violations = violations.len(),
            duration_ms,
            "scan complete"
        );

        Ok(ScanResult {
            violations,
            files,
            duration_ms,
        })
    }
}

fn has_glob_characters(value: &str) -> bool {
    value.chars().any(|c| "[]{}()!*?".contains(c))
}

fn strip_dot_prefix(pattern: &str) -> String {
    if pattern == "." {
        return ".".to_string();
    }
    pattern.trim_start_matches("./").to_string()
}

/// Narrow the include set to a scan target: globs pass through, directories
/// get the default source glob scoped under them, anything else is used as
/// a literal pattern.
fn derive_target_include(root: &Path, target: &str) -> Vec<String> {
    let normalized = to_posix(target);
    let absolute = if Path::new(&normalized).is_absolute() {
        PathBuf::from(&normalized)
    } else {
        root.join(&normalized)
    }
    .clean();

    let relative = relative_to(root, &absolute);
    let pattern = if relative.starts_with("..") {
        to_posix(&absolute.display().to_string())
    } else if relative.is_empty() {
        ".".to_string()
    } else {
        relative
    };
    let cleaned = strip_dot_prefix(&pattern);

    if has_glob_characters(&cleaned) {
        return vec![cleaned];
    }

    if let Ok(meta) = fs::metadata(&absolute) {
        if meta.is_dir() {
            let trimmed = if cleaned == "." {
                ""
            } else {
                cleaned.trim_end_matches('/')
            };
            return if trimmed.is_empty() {
                vec![DEFAULT_TARGET_GLOB.to_string()]
            } else {
                vec![format!("{trimmed}/{DEFAULT_TARGET_GLOB}")]
            };
        }
    }

    if cleaned == "." || cleaned.is_empty() {
        vec![DEFAULT_TARGET_GLOB.to_string()]
    } else {
        vec![cleaned]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use std::fs;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn dependency_only_config() -> ArchlintConfig {
        ArchlintConfig {
            rules: RulesConfig {
                include: Some(vec![
                    "dependency/no-cross-feature-import".to_string(),
                    "dependency/no-circular".to_string(),
                ]),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn feature_workspace() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "src/features/Cart/x.ts",
            "import { pay } from '../Payment/y';\n",
        );
        write(dir.path(), "src/features/Payment/y.ts", "export const pay = 1;\n");
        write(dir.path(), "src/shared/util.ts", "export const util = 1;\n");
        dir
    }

    #[test]
    fn scan_reports_cross_feature_violations() {
        let dir = feature_workspace();
        let orchestrator = Orchestrator::new(dir.path(), dependency_only_config()).unwrap();

        let result = orchestrator.scan(&ScanOptions::default()).unwrap();
        assert_eq!(result.files.len(), 3);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(
            result.violations[0].rule_id,
            "dependency/no-cross-feature-import"
        );
        assert!(result.duration_ms >= 0.0);
    }

    #[test]
    fn repeated_scans_are_idempotent() {
        let dir = feature_workspace();
        let orchestrator = Orchestrator::new(dir.path(), dependency_only_config()).unwrap();

        let first = orchestrator.scan(&ScanOptions::default()).unwrap();
        let second = orchestrator.scan(&ScanOptions::default()).unwrap();

        assert_eq!(first.violations, second.violations);
        assert_eq!(first.files, second.files);
    }

    #[test]
    fn changed_files_invalidate_and_rescan() {
        let dir = feature_workspace();
        let orchestrator = Orchestrator::new(dir.path(), dependency_only_config()).unwrap();

        let first = orchestrator.scan(&ScanOptions::default()).unwrap();
        assert_eq!(first.violations.len(), 1);

        write(dir.path(), "src/features/Cart/x.ts", "export const x = 1;\n");
        let second = orchestrator
            .scan(&ScanOptions {
                changed_files: Some(vec!["src/features/Cart/x.ts".to_string()]),
                ..Default::default()
            })
            .unwrap();
        assert!(second.violations.is_empty());
    }

    #[test]
    fn target_directory_scopes_the_scan() {
        let dir = feature_workspace();
        let orchestrator = Orchestrator::new(dir.path(), dependency_only_config()).unwrap();

        let result = orchestrator
            .scan(&ScanOptions {
                target: Some("src/shared".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.files, vec!["src/shared/util.ts"]);
    }

    #[test]
    fn fix_reports_through_the_sink() {
        use std::sync::{Arc, Mutex};

        let dir = feature_workspace();
        let reported: Arc<Mutex<Vec<RuleViolation>>> = Arc::new(Mutex::new(Vec::new()));
        let sink_target = Arc::clone(&reported);

        let orchestrator = Orchestrator::new(dir.path(), dependency_only_config())
            .unwrap()
            .with_reporter(Box::new(move |batch| {
                sink_target.lock().unwrap().extend_from_slice(batch);
            }));

        orchestrator
            .scan(&ScanOptions {
                fix: true,
                ..Default::default()
            })
            .unwrap();

        let reported = reported.lock().unwrap();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].rule_id, "dependency/no-cross-feature-import");
    }

    #[test]
    fn derive_target_include_passes_globs_through() {
        let dir = tempfile::tempdir().unwrap();
        let patterns = derive_target_include(dir.path(), "src/**/*.ts");
        assert_eq!(patterns, vec!["src/**/*.ts"]);
    }

    #[test]
    fn derive_target_include_scopes_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/features")).unwrap();
        let patterns = derive_target_include(dir.path(), "src/features");
        assert_eq!(patterns, vec![format!("src/features/{DEFAULT_TARGET_GLOB}")]);
    }

    #[test]
    fn derive_target_include_defaults_for_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let patterns = derive_target_include(dir.path(), ".");
        assert_eq!(patterns, vec![DEFAULT_TARGET_GLOB.to_string()]);
    }
}
