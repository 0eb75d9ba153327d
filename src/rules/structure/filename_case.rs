//
//  filename_case.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::fmt;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::error::{ArchlintError, Result};
use crate::paths::to_posix;
use crate::rules::{Rule, RuleCategory, RuleContext, RuleMeta, RuleViolation, Severity};

const RULE_ID: &str = "structure/filename-case";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CaseStyle {
    #[serde(rename = "kebab-case")]
    Kebab,
    #[serde(rename = "pascal-case")]
    Pascal,
    #[serde(rename = "camel-case")]
    Camel,
    #[serde(rename = "snake-case")]
    Snake,
}

impl fmt::Display for CaseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Kebab => "kebab-case",
            Self::Pascal => "pascal-case",
            Self::Camel => "camel-case",
            Self::Snake => "snake-case",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilenameCaseEntry {
    pub test: String,
    pub style: CaseStyle,
    #[serde(default)]
    pub include_extension: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilenameCaseOptions {
    #[serde(default)]
    pub rules: Option<Vec<FilenameCaseEntry>>,
}

/// Ensure file names follow the configured casing conventions.
pub struct FilenameCaseRule {
    entries: Vec<FilenameCaseEntry>,
}

impl FilenameCaseRule {
    pub fn new(options: Option<FilenameCaseOptions>) -> Self {
        let entries = match options.and_then(|o| o.rules) {
            Some(rules) if !rules.is_empty() => rules,
            _ => vec![FilenameCaseEntry {
                test: "^src/components/.+\\.(tsx?|jsx?)$".to_string(),
                style: CaseStyle::Pascal,
                include_extension: false,
            }],
        };
        Self { entries }
    }
}

/// Split a file name into lowercase words at case boundaries, underscores,
/// hyphens, and whitespace.
fn split_words(name: &str) -> Vec<String> {
    let mut separated = String::with_capacity(name.len() + 4);
    let mut previous: Option<char> = None;

    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if let Some(p) = previous {
                if p.is_ascii_lowercase() || p.is_ascii_digit() {
                    separated.push('-');
                }
            }
        }
        if c == '_' || c.is_whitespace() {
            separated.push('-');
        } else {
            separated.push(c.to_ascii_lowercase());
        }
        previous = Some(c);
    }

    separated
        .split('-')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn to_desired_case(name: &str, style: CaseStyle) -> String {
    let parts = split_words(name);
    match style {
        CaseStyle::Kebab => parts.join("-"),
        CaseStyle::Snake => parts.join("_"),
        CaseStyle::Camel => parts
            .iter()
            .enumerate()
            .map(|(index, part)| {
                if index == 0 {
                    part.clone()
                } else {
                    capitalize(part)
                }
            })
            .collect(),
        CaseStyle::Pascal => parts.iter().map(|part| capitalize(part)).collect(),
    }
}

struct ParsedName<'a> {
    base: &'a str,
    stem: &'a str,
    extension: String,
}

fn parse_file_name(path: &str) -> Option<ParsedName<'_>> {
    let as_path = Path::new(path);
    let base = as_path.file_name()?.to_str()?;
    let stem = as_path.file_stem()?.to_str()?;
    let extension = match as_path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!(".{ext}"),
        None => String::new(),
    };
    Some(ParsedName {
        base,
        stem,
        extension,
    })
}

fn expected_base(parsed: &ParsedName<'_>, entry: &FilenameCaseEntry) -> String {
    if entry.include_extension {
        to_desired_case(parsed.base, entry.style)
    } else {
        format!(
            "{}{}",
            to_desired_case(parsed.stem, entry.style),
            parsed.extension
        )
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ArchlintError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

impl Rule for FilenameCaseRule {
    fn id(&self) -> &str {
        RULE_ID
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta {
            description: "Ensure file names follow the specified casing conventions.",
            severity: Severity::Warning,
            category: RuleCategory::Structure,
        }
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleViolation>> {
        let mut violations = Vec::new();

        for file in ctx.files {
            let normalized = to_posix(file);

            for entry in &self.entries {
                let regex = compile(&entry.test)?;
                if !regex.is_match(&normalized) {
                    continue;
                }
                let Some(parsed) = parse_file_name(&normalized) else {
                    continue;
                };
                let target = expected_base(&parsed, entry);
                if target == parsed.base {
                    continue;
                }

                violations.push(RuleViolation {
                    rule_id: RULE_ID.to_string(),
                    message: format!(
                        "Filename \"{}\" should be \"{target}\" ({}).",
                        parsed.base, entry.style
                    ),
                    file: Some(normalized.clone()),
                    line: None,
                    column: None,
                    fixable: true,
                    suggested_fix: Some(format!("Rename the file to {target} ({}).", entry.style)),
                });
            }
        }

        Ok(violations)
    }

    fn fix(&self, ctx: &RuleContext<'_>) -> Result<()> {
        for file in ctx.files {
            let normalized = to_posix(file);

            for entry in &self.entries {
                let regex = compile(&entry.test)?;
                if !regex.is_match(&normalized) {
                    continue;
                }
                let Some(parsed) = parse_file_name(&normalized) else {
                    continue;
                };
                let target = expected_base(&parsed, entry);
                if target == parsed.base {
                    continue;
                }

                let absolute = ctx.root.join(&normalized);
                let renamed = match absolute.parent() {
                    Some(parent) => parent.join(&target),
                    None => continue,
                };

                if let Err(e) = fs::rename(&absolute, &renamed) {
                    if ctx.verbose {
                        warn!(path = %absolute.display(), error = %e, "failed to rename file");
                    }
                }
            }
        }

        Ok(())
    }
}
