use std::path::Path;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// File names inside `daylog/` whose changes mean the log set changed
const WATCHED_FILES: &[&str] = &["logs.json"];

/// Filesystem watcher for the `daylog/` directory.
///
/// Calls `on_change` from notify's thread each time the document file is
/// created, modified, renamed into place or removed. Dropping the watcher
/// stops the callbacks.
pub struct StoreWatcher {
    _watcher: RecommendedWatcher,
}

impl StoreWatcher {
    pub fn start<F>(dir: &Path, on_change: F) -> Result<Self, notify::Error>
    where
        F: Fn() + Send + 'static,
    {
        // Some backends report canonical paths (e.g. /private/var on macOS)
        let dirs = vec![
            dir.to_path_buf(),
            dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf()),
        ];

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(e) => {
                        tracing::warn!(error = %e, "store watcher error");
                        return;
                    }
                };

                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }

                if event
                    .paths
                    .iter()
                    .any(|p| dirs.iter().any(|d| is_watched(d, p)))
                {
                    tracing::debug!(kind = ?event.kind, "document file changed");
                    on_change();
                }
            },
            Config::default(),
        )?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        Ok(StoreWatcher { _watcher: watcher })
    }
}

/// Whether an event path is one of the watched files directly inside `dir`.
/// Lock files, temp files from atomic writes and blobs are ignored.
fn is_watched(dir: &Path, path: &Path) -> bool {
    path.parent() == Some(dir)
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| WATCHED_FILES.contains(&name))
}
