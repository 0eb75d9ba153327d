//
//  discovery.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::path::Path;

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;

use crate::error::{ArchlintError, Result};

/// Enumerate workspace files matching the include globs minus the exclude
/// globs. Returns sorted, deduplicated, root-relative forward-slash paths.
pub fn scan_workspace_files(
    root: &Path,
    include: &[String],
    exclude: &[String],
) -> Result<Vec<String>> {
    let mut builder = OverrideBuilder::new(root);
    for pattern in include {
        builder
            .add(pattern)
            .map_err(|e| ArchlintError::Discovery(e.to_string()))?;
    }
    for pattern in exclude {
        builder
            .add(&format!("!{pattern}"))
            .map_err(|e| ArchlintError::Discovery(e.to_string()))?;
    }
    let overrides = builder
        .build()
        .map_err(|e| ArchlintError::Discovery(e.to_string()))?;

    let mut files: Vec<String> = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .overrides(overrides)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter_map(|entry| {
            entry.path().strip_prefix(root).ok().map(|relative| {
                relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
        })
        .collect();

    files.sort();
    files.dedup();
    Ok(files)
}
