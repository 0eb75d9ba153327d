//
//  extractor.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::path::Path;

use tree_sitter::{Node, Parser};

use super::language::SupportedLanguage;
use crate::error::{ArchlintError, Result};

/// One raw import edge as written in the source, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImport {
    pub specifier: String,
    pub is_type_only: bool,
}

/// Extract the module specifiers of all top-level import declarations and
/// export-from declarations in a source file.
///
/// Only plain string-literal specifiers are tracked. Dynamic `import(...)`
/// expressions and computed specifiers are intentionally ignored. The path
/// is used for language detection and diagnostics only; this function never
/// touches the filesystem.
pub fn extract_imports(path: &Path, source: &str) -> Result<Vec<RawImport>> {
    let lang = SupportedLanguage::from_path(path)
        .ok_or_else(|| ArchlintError::UnsupportedLanguage(path.to_path_buf()))?;

    let mut parser = Parser::new();
    let ts_lang = lang.tree_sitter_language();
    parser
        .set_language(&ts_lang)
        .map_err(|e| ArchlintError::ParserInit(path.to_path_buf(), e.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ArchlintError::ParseFailed(path.to_path_buf()))?;

    let root = tree.root_node();
    let mut cursor = root.walk();
    let mut imports = Vec::new();

    // Only direct children of the program node count: nested import-like
    // syntax (e.g. inside a namespace) is not a module edge.
    for child in root.children(&mut cursor) {
        match child.kind() {
            "import_statement" | "export_statement" => {
                if let Some(specifier) = module_specifier(&child, source) {
                    imports.push(RawImport {
                        specifier,
                        is_type_only: is_type_only(&child),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(imports)
}

/// The string-literal module specifier of an import/export statement,
/// or None when the statement has no source (`export {}`) or a
/// non-literal one.
fn module_specifier(node: &Node, source: &str) -> Option<String> {
    let source_node = node.child_by_field_name("source")?;
    if source_node.kind() != "string" {
        return None;
    }
    let text = source_node.utf8_text(source.as_bytes()).ok()?;
    Some(strip_quotes(text).to_string())
}

/// `import type … from` and `export type … from` carry a bare `type`
/// keyword directly under the statement node. Per-specifier markers
/// (`import { type A } from …`) do not make the declaration type-only.
fn is_type_only(node: &Node) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|child| child.kind() == "type" && !child.is_named())
}

fn strip_quotes(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return &text[1..text.len() - 1];
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> Vec<RawImport> {
        extract_imports(Path::new("test.ts"), source).unwrap()
    }

    #[test]
    fn collects_import_declarations() {
        let imports = extract(
            "import { a } from './a';\nimport b from \"../b\";\nimport 'side-effect';\n",
        );
        let specifiers: Vec<&str> = imports.iter().map(|i| i.specifier.as_str()).collect();
        assert_eq!(specifiers, vec!["./a", "../b", "side-effect"]);
        assert!(imports.iter().all(|i| !i.is_type_only));
    }

    #[test]
    fn collects_export_from_declarations() {
        let imports = extract("export { a } from './a';\nexport * from './b';\nexport const x = 1;\n");
        let specifiers: Vec<&str> = imports.iter().map(|i| i.specifier.as_str()).collect();
        assert_eq!(specifiers, vec!["./a", "./b"]);
    }

    #[test]
    fn marks_type_only_declarations() {
        let imports = extract(
            "import type { A } from './types';\nimport { b } from './b';\nexport type { C } from './c';\n",
        );
        assert_eq!(imports.len(), 3);
        assert!(imports[0].is_type_only);
        assert!(!imports[1].is_type_only);
        assert!(imports[2].is_type_only);
    }

    #[test]
    fn inline_type_specifiers_are_not_type_only() {
        let imports = extract("import { type A, b } from './mixed';\n");
        assert_eq!(imports.len(), 1);
        assert!(!imports[0].is_type_only);
    }

    #[test]
    fn ignores_dynamic_imports() {
        let imports = extract("const m = await import('./dynamic');\nimport { a } from './a';\n");
        let specifiers: Vec<&str> = imports.iter().map(|i| i.specifier.as_str()).collect();
        assert_eq!(specifiers, vec!["./a"]);
    }

    #[test]
    fn tolerates_recoverable_syntax_errors() {
        let imports = extract("import { a } from './a';\nconst oops = ;\n");
        assert_eq!(imports.len(), 1);
    }

    #[test]
    fn parses_tsx() {
        let imports =
            extract_imports(Path::new("App.tsx"), "import React from 'react';\nexport const App = () => <div />;\n")
                .unwrap();
        assert_eq!(imports[0].specifier, "react");
    }

    #[test]
    fn rejects_unsupported_extensions() {
        assert!(extract_imports(Path::new("style.css"), "").is_err());
    }
}
