//
//  no_cross_layer.rs
//  Archlint
//
//  Created by hak (tharun)
//

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ArchlintError, Result};
use crate::paths::{relative_to, to_posix};
use crate::rules::{Rule, RuleCategory, RuleContext, RuleMeta, RuleViolation, Severity};

const RULE_ID: &str = "dependency/no-cross-layer";

/// One named, pattern-matched partition of the codebase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    pub pattern: String,
    /// Layer names this layer may import. Defaults to all other layers.
    #[serde(default)]
    pub can_import: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoCrossLayerOptions {
    #[serde(default)]
    pub layers: Option<Vec<LayerConfig>>,
}

struct Layer {
    name: String,
    pattern: String,
    can_import: Vec<String>,
}

/// Prevent disallowed cross-layer dependencies.
pub struct NoCrossLayerRule {
    layers: Vec<Layer>,
}

/// First configured layer whose pattern matches wins.
fn detect_layer<'a>(
    compiled: &[(usize, Regex)],
    layers: &'a [Layer],
    path: &str,
) -> Option<&'a Layer> {
    compiled
        .iter()
        .find(|(_, regex)| regex.is_match(path))
        .map(|(index, _)| &layers[*index])
}

fn default_layers() -> Vec<LayerConfig> {
    vec![
        LayerConfig {
            name: "app".to_string(),
            pattern: "^src/app/".to_string(),
            can_import: None,
        },
        LayerConfig {
            name: "features".to_string(),
            pattern: "^src/features/".to_string(),
            can_import: None,
        },
        LayerConfig {
            name: "shared".to_string(),
            pattern: "^src/shared/".to_string(),
            can_import: None,
        },
    ]
}

impl NoCrossLayerRule {
    pub fn new(options: Option<NoCrossLayerOptions>) -> Self {
        let configured = options
            .and_then(|o| o.layers)
            .unwrap_or_else(default_layers);
        let names: Vec<String> = configured.iter().map(|l| l.name.clone()).collect();

        let layers = configured
            .into_iter()
            .map(|layer| {
                let can_import = layer.can_import.unwrap_or_else(|| {
                    names
                        .iter()
                        .filter(|name| **name != layer.name)
                        .cloned()
                        .collect()
                });
                Layer {
                    name: layer.name,
                    pattern: layer.pattern,
                    can_import,
                }
            })
            .collect();

        Self { layers }
    }

    fn compile(&self) -> Result<Vec<(usize, Regex)>> {
        self.layers
            .iter()
            .enumerate()
            .map(|(index, layer)| {
                Regex::new(&layer.pattern)
                    .map(|regex| (index, regex))
                    .map_err(|e| ArchlintError::InvalidPattern {
                        pattern: layer.pattern.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect()
    }

    fn collect_violations(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleViolation>> {
        let compiled = self.compile()?;
        let mut violations = Vec::new();

        for (file, imports) in ctx.graph {
            let normalized = to_posix(file);
            let Some(source_layer) = detect_layer(&compiled, &self.layers, &normalized) else {
                continue;
            };

            for reference in imports {
                let Some(resolved) = &reference.resolved else {
                    continue;
                };
                let target = relative_to(ctx.root, resolved);
                let Some(target_layer) = detect_layer(&compiled, &self.layers, &target) else {
                    continue;
                };
                if source_layer.can_import.contains(&target_layer.name) {
                    continue;
                }

                violations.push(RuleViolation {
                    rule_id: RULE_ID.to_string(),
                    message: format!(
                        "Layer \"{}\" cannot import from \"{}\".",
                        source_layer.name, target_layer.name
                    ),
                    file: Some(normalized.clone()),
                    line: None,
                    column: None,
                    fixable: false,
                    suggested_fix: Some(format!(
                        "Move shared logic to a permitted layer or expose a public API in the \"{}\" layer.",
                        target_layer.name
                    )),
                });
            }
        }

        Ok(violations)
    }
}

impl Rule for NoCrossLayerRule {
    fn id(&self) -> &str {
        RULE_ID
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta {
            description: "Prevent disallowed cross-layer dependencies.",
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
