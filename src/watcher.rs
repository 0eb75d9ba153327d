//
//  watcher.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use tracing::{info, warn};

use crate::error::{ArchlintError, Result};

/// Quiet period before a change batch is flushed.
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Keeps the underlying watcher alive; dropping it stops watching.
pub struct WatcherHandle {
    _debouncer: Debouncer<RecommendedWatcher>,
}

/// Watch `root` recursively and deliver debounced batches of changed
/// absolute paths. Events arriving while a batch is being processed simply
/// land in the next batch; no rescan state is carried across batches.
pub fn start_watching(root: &Path, debounce_ms: u64) -> Result<(WatcherHandle, Receiver<Vec<PathBuf>>)> {
    let (tx, rx) = mpsc::channel();

    let mut debouncer = new_debouncer(
        Duration::from_millis(debounce_ms),
        move |result: DebounceEventResult| match result {
            Ok(events) => {
                let paths: Vec<PathBuf> = events.into_iter().map(|event| event.path).collect();
                if !paths.is_empty() {
                    let _ = tx.send(paths);
                }
            }
            Err(e) => warn!(error = %e, "watch error"),
        },
    )
    .map_err(|e| ArchlintError::Watch(e.to_string()))?;

    debouncer
        .watcher()
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| ArchlintError::Watch(e.to_string()))?;

    info!(root = %root.display(), debounce_ms, "file watcher started");

    Ok((
        WatcherHandle {
            _debouncer: debouncer,
        },
        rx,
    ))
}
