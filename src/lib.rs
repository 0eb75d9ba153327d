//! # Archlint
//!
//! Architecture linting for TypeScript workspaces.
//!
//! Archlint extracts the import edges of every source file, resolves them to
//! workspace files (alias-aware, tsconfig-compatible), and enforces
//! architecture rules (layering, allow-lists, no-cycles, feature isolation)
//! against the resulting dependency graph.
//!
//! ## Key Features
//!
//! - **Dependency-graph rules**: cycles, layer boundaries, allow-lists with
//!   back-references, feature isolation
//! - **Alias-aware resolution**: tsconfig `baseUrl`/`paths` or an explicit
//!   alias table, with relative-path probing as the fallback
//! - **Incremental**: per-file extraction is memoized by mtime and
//!   point-invalidated in watch mode
//! - **Extensible**: plugin rules share the built-in rule capability set
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use archlint::{ArchlintConfig, Orchestrator, ScanOptions};
//!
//! let cwd = Path::new(".");
//! let config = ArchlintConfig::discover(cwd).unwrap();
//! let orchestrator = Orchestrator::new(cwd, config).unwrap();
//!
//! let result = orchestrator.scan(&ScanOptions::default()).unwrap();
//! for violation in &result.violations {
//!     println!("{}: {}", violation.rule_id, violation.message);
//! }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod parser;
pub mod paths;
pub mod report;
pub mod resolver;
pub mod rules;
pub mod scan;
pub mod watcher;

// Re-exports for convenience
pub use config::{ArchlintConfig, ProjectConfig, RulesConfig};
pub use error::{ArchlintError, Result};
pub use graph::{build_dependency_graph, DependencyGraph, DependencyGraphCache, ImportReference};
pub use parser::{extract_imports, RawImport, SupportedLanguage};
pub use report::ReportFormat;
pub use resolver::{ModuleResolver, ResolverConfig};
pub use rules::{
    built_in_rules, validate_rules, Rule, RuleCategory, RuleContext, RuleMeta, RuleViolation,
    Severity,
};
pub use scan::{Orchestrator, Reporter, ScanOptions, ScanPatterns, ScanResult};
pub use watcher::{start_watching, WatcherHandle, DEFAULT_DEBOUNCE_MS};
