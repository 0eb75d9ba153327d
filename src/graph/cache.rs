//
//  cache.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use tracing::trace;

use super::types::ImportReference;
use crate::error::Result;

struct CacheEntry {
    mtime: SystemTime,
    imports: Vec<ImportReference>,
}

/// Memoizes per-file import extraction keyed by modification time.
///
/// An entry is reusable iff the file's current mtime equals the stored one;
/// any mismatch re-invokes the loader and overwrites the entry. The cache is
/// scoped to one orchestrator instance, never a process-wide singleton, so
/// concurrent scans (e.g. in tests) do not interfere.
#[derive(Default)]
pub struct DependencyGraphCache {
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
}

impl DependencyGraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached imports for `path`, or run `loader` and store its
    /// result under the file's current mtime.
    ///
    /// Two concurrent misses for the same key may both run the loader;
    /// extraction is pure so the duplication is benign and the last writer
    /// wins.
    pub fn get_imports<F>(&self, path: &Path, loader: F) -> Result<Vec<ImportReference>>
    where
        F: FnOnce() -> Result<Vec<ImportReference>>,
    {
        let mtime = fs::metadata(path)?.modified()?;

        {
            let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = entries.get(path) {
                if entry.mtime == mtime {
                    trace!(path = %path.display(), "dependency cache hit");
                    return Ok(entry.imports.clone());
                }
            }
        }

        let imports = loader()?;

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            path.to_path_buf(),
            CacheEntry {
                mtime,
                imports: imports.clone(),
            },
        );

        Ok(imports)
    }

    /// Remove the entries for the given absolute paths, or clear the whole
    /// cache when called with None.
    pub fn invalidate(&self, paths: Option<&[PathBuf]>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match paths {
            None => entries.clear(),
            Some(paths) => {
                for path in paths {
                    entries.remove(path);
                }
            }
        }
    }
}
