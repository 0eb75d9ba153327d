//
//  types.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;

/// One import/export-with-source edge found in a file.
///
/// `resolved` is the absolute target path, or None when the specifier could
/// not be mapped to a workspace file (e.g. a third-party package).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReference {
    pub specifier: String,
    pub is_type_only: bool,
    pub resolved: Option<PathBuf>,
}

/// Mapping from a root-relative, forward-slash file path to the ordered
/// import references found in that file.
///
/// Insertion order follows the scan order; an ordered map keeps repeated
/// scans of the same input byte-for-byte reproducible downstream.
pub type DependencyGraph = IndexMap<String, Vec<ImportReference>>;
