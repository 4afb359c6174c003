//! File change watcher for the registry and token documents.
//!
//! Watches the parent directory of each document instead of the file itself:
//! saves replace the file via rename, which would orphan a watch on the
//! original inode.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::PathBuf;

use dashboard_core::StateDocument;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// A state document changed on disk. Carries no payload; the broadcaster
/// re-reads both documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub document: StateDocument,
}

#[derive(Debug, Clone)]
struct WatchTarget {
    document: StateDocument,
    file_name: OsString,
}

/// Owns the OS watch; dropping it stops notifications.
pub struct ChangeWatcher {
    _watcher: RecommendedWatcher,
    watched: Vec<PathBuf>,
}

impl ChangeWatcher {
    /// Starts watching `targets`. Files missing at startup are skipped.
    pub fn start(
        targets: Vec<(StateDocument, PathBuf)>,
        sender: UnboundedSender<ChangeEvent>,
    ) -> notify::Result<Self> {
        let mut present = Vec::new();
        let mut dirs = BTreeSet::new();
        for (document, path) in targets {
            if !path.exists() {
                warn!(path = %path.display(), "State file missing at startup, not watching");
                continue;
            }
            let (Some(parent), Some(file_name)) = (path.parent(), path.file_name()) else {
                warn!(path = %path.display(), "State file has no parent directory, not watching");
                continue;
            };
            dirs.insert(parent.to_path_buf());
            present.push((
                WatchTarget {
                    document,
                    file_name: file_name.to_os_string(),
                },
                path,
            ));
        }

        let filters: Vec<WatchTarget> = present.iter().map(|(target, _)| target.clone()).collect();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for document in changed_documents(&event, &filters) {
                    let _ = sender.send(ChangeEvent { document });
                }
            }
            Err(err) => warn!(error = %err, "File watch error"),
        })?;

        for dir in &dirs {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
            debug!(dir = %dir.display(), "Watching state directory");
        }

        Ok(Self {
            _watcher: watcher,
            watched: present.into_iter().map(|(_, path)| path).collect(),
        })
    }

    /// Files actually being watched.
    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }
}

fn changed_documents(event: &Event, targets: &[WatchTarget]) -> Vec<StateDocument> {
    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
        return Vec::new();
    }

    let mut documents = Vec::new();
    for path in &event.paths {
        let Some(file_name) = path.file_name() else {
            continue;
        };
        for target in targets {
            if target.file_name.as_os_str() == file_name && !documents.contains(&target.document) {
                documents.push(target.document);
            }
        }
    }
    documents
}
