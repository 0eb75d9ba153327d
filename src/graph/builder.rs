//
//  builder.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::fs;
use std::path::Path;

use rayon::prelude::*;
use tracing::debug;

use super::cache::DependencyGraphCache;
use super::types::{DependencyGraph, ImportReference};
use crate::error::Result;
use crate::parser::extract_imports;
use crate::resolver::ModuleResolver;

/// Build the dependency graph for a file set.
///
/// Every input file is processed exactly once; extraction runs in parallel
/// across files while the resulting graph preserves the input order. A file
/// that fails to parse fails the whole build, since a silently incomplete
/// graph would turn into false-negative rule results.
pub fn build_dependency_graph(
    files: &[String],
    root: &Path,
    resolver: &ModuleResolver,
    cache: Option<&DependencyGraphCache>,
) -> Result<DependencyGraph> {
    let entries: Vec<(String, Vec<ImportReference>)> = files
        .par_iter()
        .map(|relative| {
            let absolute = root.join(relative);

            let load = || {
                let source = fs::read_to_string(&absolute)?;
                let raw = extract_imports(&absolute, &source)?;
                Ok(raw
                    .into_iter()
                    .map(|import| {
                        let resolved = resolver.resolve(&import.specifier, relative);
                        ImportReference {
                            specifier: import.specifier,
                            is_type_only: import.is_type_only,
                            resolved,
                        }
                    })
                    .collect())
            };

            let imports = match cache {
                Some(cache) => cache.get_imports(&absolute, load)?,
                None => load()?,
            };

            Ok((relative.clone(), imports))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(files = entries.len(), "dependency graph built");

    let mut graph = DependencyGraph::new();
    for (file, imports) in entries {
        graph.insert(file, imports);
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn builds_graph_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/b.ts", "export const b = 1;\n");
        write(dir.path(), "src/a.ts", "import { b } from './b';\nimport React from 'react';\n");

        let files = vec!["src/a.ts".to_string(), "src/b.ts".to_string()];
        let resolver = ModuleResolver::with_config(dir.path(), None);
        let graph = build_dependency_graph(&files, dir.path(), &resolver, None).unwrap();

        let keys: Vec<&String> = graph.keys().collect();
        assert_eq!(keys, vec!["src/a.ts", "src/b.ts"]);

        let imports = &graph["src/a.ts"];
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].specifier, "./b");
        assert!(imports[0].resolved.is_some());
        assert_eq!(imports[1].specifier, "react");
        assert_eq!(imports[1].resolved, None);
        assert!(graph["src/b.ts"].is_empty());
    }

    #[test]
    fn uses_cache_across_builds() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/a.ts", "import './b';\n");
        write(dir.path(), "src/b.ts", "export {};\n");

        let files = vec!["src/a.ts".to_string(), "src/b.ts".to_string()];
        let resolver = ModuleResolver::with_config(dir.path(), None);
        let cache = DependencyGraphCache::new();

        let first = build_dependency_graph(&files, dir.path(), &resolver, Some(&cache)).unwrap();
        let second = build_dependency_graph(&files, dir.path(), &resolver, Some(&cache)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unsupported_file_fails_the_build() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/style.css", "body {}\n");

        let files = vec!["src/style.css".to_string()];
        let resolver = ModuleResolver::with_config(dir.path(), None);
        assert!(build_dependency_graph(&files, dir.path(), &resolver, None).is_err());
    }

    #[test]
    fn missing_file_fails_the_build() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec!["src/ghost.ts".to_string()];
        let resolver = ModuleResolver::with_config(dir.path(), None);
        assert!(build_dependency_graph(&files, dir.path(), &resolver, None).is_err());
    }
}
