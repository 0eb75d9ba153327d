//
//  config.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::Deserialize;

use crate::error::{ArchlintError, Result};
use crate::resolver::ResolverConfig;
use crate::rules::dependency::allow_list::AllowListOptions;
use crate::rules::dependency::no_cross_layer::NoCrossLayerOptions;
use crate::rules::structure::filename_case::FilenameCaseOptions;
use crate::rules::structure::no_loose_files::NoLooseFilesOptions;
use crate::rules::structure::required_files::RequiredFilesOptions;

/// Configuration file names probed under the working directory.
const CONFIG_CANDIDATES: &[&str] = &["archlint.toml", ".archlint.toml"];

/// Top-level archlint configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchlintConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    /// Explicit alias table; absent means tsconfig discovery, then pure
    /// relative-path resolution.
    #[serde(default)]
    pub resolver: Option<ResolverConfig>,
    #[serde(default)]
    pub rules: RulesConfig,
}

/// Scan scope settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Workspace root to scan (relative to the working directory).
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

/// Built-in rule selection and per-rule overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulesConfig {
    /// When present, only these rule ids run, in this order.
    #[serde(default)]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default, rename = "no-cross-layer")]
    pub no_cross_layer: Option<NoCrossLayerOptions>,
    #[serde(default, rename = "allow-list")]
    pub allow_list: Option<AllowListOptions>,
    #[serde(default, rename = "filename-case")]
    pub filename_case: Option<FilenameCaseOptions>,
    #[serde(default, rename = "no-loose-files")]
    pub no_loose_files: Option<NoLooseFilesOptions>,
    #[serde(default, rename = "required-files")]
    pub required_files: Option<RequiredFilesOptions>,
}

fn default_root() -> String {
    ".".to_string()
}

fn default_include() -> Vec<String> {
    vec!["src/**/*.{ts,tsx,js,jsx}".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec![
        "**/node_modules/**".to_string(),
        "**/dist/**".to_string(),
        "**/.turbo/**".to_string(),
    ]
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            include: default_include(),
            exclude: default_exclude(),
        }
    }
}

impl ArchlintConfig {
    /// Load config from an explicit TOML file. Unlike discovery, a missing
    /// or malformed explicit path is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ArchlintError::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&contents)
            .map_err(|e| ArchlintError::Config(format!("{}: {e}", path.display())))
    }

    /// Probe the standard config file names under `cwd`, falling back to
    /// defaults when none exists.
    pub fn discover(cwd: &Path) -> Result<Self> {
        for candidate in CONFIG_CANDIDATES {
            let path = cwd.join(candidate);
            if path.is_file() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Resolve the workspace root relative to the working directory.
    pub fn resolve_root(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.project.root).clean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_usual_layout() {
        let config = ArchlintConfig::default();
        assert_eq!(config.project.root, ".");
        assert_eq!(config.project.include, vec!["src/**/*.{ts,tsx,js,jsx}"]);
        assert!(config.resolver.is_none());
        assert!(config.rules.include.is_none());
    }

    #[test]
    fn parses_a_full_config() {
        let toml = r#"
            [project]
            root = "packages/web"
            include = ["src/**/*.ts"]
            exclude = ["**/node_modules/**"]

            [resolver]
            base_url = "."

            [resolver.paths]
            "@shared/*" = ["src/shared/*"]

            [rules]
            exclude = ["structure/filename-case"]

            [[rules.no-cross-layer.layers]]
            name = "shared"
            pattern = "^src/shared/"
            can_import = ["shared"]

            [[rules.allow-list.entries]]
            from = "^src/features/([a-z]+)/"
            allow = ["^src/shared/", "^src/features/$1/"]
        "#;

        let config: ArchlintConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.project.root, "packages/web");
        let resolver = config.resolver.unwrap();
        assert_eq!(resolver.base_url.as_deref(), Some("."));
        assert!(resolver.paths.contains_key("@shared/*"));

        let layers = config.rules.no_cross_layer.unwrap().layers.unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].can_import.as_deref(), Some(&["shared".to_string()][..]));

        let entries = config.rules.allow_list.unwrap().entries.unwrap();
        assert_eq!(entries[0].allow.len(), 2);
        assert_eq!(config.rules.exclude, vec!["structure/filename-case"]);
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ArchlintConfig::discover(dir.path()).unwrap();
        assert_eq!(config.project.root, ".");
    }

    #[test]
    fn explicit_load_of_missing_file_fails() {
        assert!(ArchlintConfig::load(Path::new("/nonexistent/archlint.toml")).is_err());
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archlint.toml");
        fs::write(&path, "[project\nroot=").unwrap();
        assert!(matches!(
            ArchlintConfig::load(&path),
            Err(ArchlintError::Config(_))
        ));
    }
}
