//! Watching the manuscript for edits.
//!
//! Native notifications arrive on notify's own thread and are forwarded over
//! a channel; the consumer handles them one at a time on the runtime thread.
//! Every notification triggers a full recount; there is no debouncing.

use anyhow::{Context, Result};
use log::{debug, error};
use notify::event::{CreateKind, RemoveKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::Created => "created",
            ChangeKind::Modified => "modified",
            ChangeKind::Removed => "removed",
        })
    }
}

/// A change to one file under the watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

/// Owns the native watch handle; dropping it stops the watch.
pub struct ManuscriptWatcher {
    _watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<FileChange>,
}

impl ManuscriptWatcher {
    /// Starts a recursive watch on `dir`.
    pub fn start(dir: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    for change in translate_event(&event) {
                        if tx.send(change).is_err() {
                            debug!("watch channel closed");
                            return;
                        }
                    }
                }
                Err(e) => error!("file watcher error: {e}"),
            }
        })
        .context("Failed to create file watcher")?;

        watcher
            .watch(dir, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;
        debug!("Watching {}", dir.display());

        Ok(Self {
            _watcher: watcher,
            events: rx,
        })
    }

    /// Waits for the next file change. `None` once the watcher has shut down.
    pub async fn next_change(&mut self) -> Option<FileChange> {
        self.events.recv().await
    }
}

/// Maps a native event to file changes, dropping directory events and
/// access notifications.
fn translate_event(event: &Event) -> Vec<FileChange> {
    let kind = match event.kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => {
            return Vec::new();
        }
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Modify(_) => ChangeKind::Modified,
        EventKind::Remove(_) => ChangeKind::Removed,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
    };

    event
        .paths
        .iter()
        .filter(|p| !p.is_dir())
        .map(|p| FileChange {
            kind,
            path: p.clone(),
        })
        .collect()
}
