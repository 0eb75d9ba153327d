//
//  resolver.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::fs;
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use path_clean::PathClean;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Probe order for extensionless candidates and directory index files.
const RELATIVE_IMPORT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Alias table for tsconfig-style resolution.
///
/// `paths` maps specifier patterns (exact, or with a single `*`) to target
/// templates relative to `base_url`. `base_url` itself is relative to the
/// workspace root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub paths: IndexMap<String, Vec<String>>,
}

#[derive(Deserialize)]
struct TsconfigFile {
    #[serde(default, rename = "compilerOptions")]
    compiler_options: TsconfigCompilerOptions,
}

#[derive(Default, Deserialize)]
struct TsconfigCompilerOptions {
    #[serde(default, rename = "baseUrl")]
    base_url: Option<String>,
    #[serde(default)]
    paths: Option<IndexMap<String, Vec<String>>>,
}

impl ResolverConfig {
    /// Read `compilerOptions.{baseUrl,paths}` from `tsconfig.json` (or
    /// `tsconfig.base.json`) under `root`. Any read or parse problem
    /// degrades to None; resolver configuration is never fatal.
    pub fn from_tsconfig(root: &Path) -> Option<Self> {
        for candidate in ["tsconfig.json", "tsconfig.base.json"] {
            let path = root.join(candidate);
            let contents = match fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(_) => continue,
            };
            let parsed: TsconfigFile = match serde_json::from_str(&contents) {
                Ok(parsed) => parsed,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping unparseable tsconfig");
                    continue;
                }
            };
            let options = parsed.compiler_options;
            if options.base_url.is_none() && options.paths.is_none() {
                continue;
            }
            return Some(Self {
                base_url: options.base_url,
                paths: options.paths.unwrap_or_default(),
            });
        }
        None
    }
}

/// Turns an import specifier plus its containing file into an absolute
/// target path, or None for external/unresolvable packages.
///
/// Resolution is deterministic for identical (specifier, from_file,
/// filesystem state); filesystem errors during probing are treated as
/// "does not exist".
pub struct ModuleResolver {
    root: PathBuf,
    config: Option<ResolverConfig>,
}

impl ModuleResolver {
    /// Resolver rooted at `root`, with alias configuration discovered from
    /// the workspace tsconfig when present.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into().clean();
        let config = ResolverConfig::from_tsconfig(&root);
        Self { root, config }
    }

    /// Resolver with an explicit (possibly absent) alias configuration.
    pub fn with_config(root: impl Into<PathBuf>, config: Option<ResolverConfig>) -> Self {
        Self {
            root: root.into().clean(),
            config,
        }
    }

    /// Resolve `specifier` as written in `from_file` (root-relative).
    pub fn resolve(&self, specifier: &str, from_file: &str) -> Option<PathBuf> {
        if let Some(config) = &self.config {
            if let Some(found) = self.resolve_aliased(config, specifier) {
                return Some(found);
            }
        }

        if specifier.starts_with('.') {
            return Some(self.resolve_relative(specifier, from_file));
        }

        None
    }

    /// tsconfig-style resolution for non-relative specifiers: the
    /// most-specific matching `paths` pattern first, then a bare `baseUrl`
    /// lookup. A hit outside the workspace root or under node_modules
    /// rejects the whole step.
    fn resolve_aliased(&self, config: &ResolverConfig, specifier: &str) -> Option<PathBuf> {
        if specifier.starts_with('.') {
            return None;
        }

        let base = match &config.base_url {
            Some(base_url) => self.root.join(base_url).clean(),
            None => self.root.clone(),
        };

        if let Some((targets, captured)) = best_pattern_match(&config.paths, specifier) {
            for template in targets {
                let substituted = match &captured {
                    Some(captured) => template.replacen('*', captured, 1),
                    None => template.clone(),
                };
                let candidate = base.join(substituted).clean();
                if let Some(found) = probe_module_path(&candidate) {
                    return self.accept_workspace_path(found);
                }
            }
        }

        if config.base_url.is_some() {
            let candidate = base.join(specifier).clean();
            if let Some(found) = probe_module_path(&candidate) {
                return self.accept_workspace_path(found);
            }
        }

        None
    }

    fn accept_workspace_path(&self, found: PathBuf) -> Option<PathBuf> {
        let inside_root = found.starts_with(&self.root);
        let in_packages = found
            .components()
            .any(|c| matches!(c, Component::Normal(name) if name == "node_modules"));
        if inside_root && !in_packages {
            Some(found)
        } else {
            None
        }
    }

    /// Relative resolution. Always yields a path: when no probe succeeds the
    /// lexically-cleaned candidate itself is returned, so a dangling
    /// relative import still points into the workspace.
    fn resolve_relative(&self, specifier: &str, from_file: &str) -> PathBuf {
        let absolute_from = self.root.join(from_file).clean();
        let base_dir = absolute_from.parent().unwrap_or(&self.root);
        let candidate = base_dir.join(specifier).clean();
        probe_module_path(&candidate).unwrap_or(candidate)
    }
}

/// Probe a candidate path the way a bundler would: the file itself, then
/// `index.<ext>` for directories, then `<candidate>.<ext>` when the
/// candidate has no extension.
fn probe_module_path(candidate: &Path) -> Option<PathBuf> {
    match fs::metadata(candidate) {
        Ok(meta) if meta.is_file() => return Some(candidate.to_path_buf()),
        Ok(meta) if meta.is_dir() => {
            for ext in RELATIVE_IMPORT_EXTENSIONS {
                let index = candidate.join(format!("index.{ext}"));
                if index.is_file() {
                    return Some(index);
                }
            }
        }
        _ => {}
    }

    if candidate.extension().is_none() {
        for ext in RELATIVE_IMPORT_EXTENSIONS {
            let with_extension = PathBuf::from(format!("{}.{ext}", candidate.display()));
            if with_extension.is_file() {
                return Some(with_extension);
            }
        }
    }

    None
}

/// Pick the `paths` pattern that matches `specifier`, preferring an exact
/// pattern over wildcards and the longest wildcard prefix otherwise.
/// Returns the target templates and the text captured by `*`.
fn best_pattern_match<'a>(
    paths: &'a IndexMap<String, Vec<String>>,
    specifier: &str,
) -> Option<(&'a Vec<String>, Option<String>)> {
    let mut best: Option<(usize, &'a Vec<String>, Option<String>)> = None;

    for (pattern, targets) in paths {
        let (rank, captured) = match pattern.find('*') {
            None => {
                if pattern != specifier {
                    continue;
                }
                (usize::MAX, None)
            }
            Some(star) => {
                let prefix = &pattern[..star];
                let suffix = &pattern[star + 1..];
                if specifier.len() < prefix.len() + suffix.len()
                    || !specifier.starts_with(prefix)
                    || !specifier.ends_with(suffix)
                {
                    continue;
                }
                let captured = specifier[prefix.len()..specifier.len() - suffix.len()].to_string();
                (prefix.len(), Some(captured))
            }
        };

        match &best {
            Some((best_rank, _, _)) if *best_rank >= rank => {}
            _ => best = Some((rank, targets, captured)),
        }
    }

    best.map(|(_, targets, captured)| (targets, captured))
}
