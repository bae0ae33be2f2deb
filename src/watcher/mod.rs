//! File watching for live preview and cross-instance theme sync.
//!
//! Uses notify crate for cross-platform file system events.
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

#[derive(Debug)]
struct Target {
    path: PathBuf,
    name: Option<OsString>,
}

/// Watches a set of files and emits debounced change notifications.
///
/// Files need not exist yet, but their directories must.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_roots: BTreeSet<PathBuf>,
    targets: Vec<Target>,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl FileWatcher {
    /// Create a watcher for a single `path`.
    ///
    /// # Errors
    /// Returns an error if the file watcher cannot be created or the path cannot be watched.
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        Self::for_paths(&[path.as_ref().to_path_buf()], debounce)
    }

    /// Create a watcher for several files, e.g. both preference stores.
    ///
    /// # Errors
    /// Returns an error if the file watcher cannot be created or a directory cannot be watched.
    pub fn for_paths(paths: &[PathBuf], debounce: Duration) -> notify::Result<Self> {
        // Canonicalize so event paths from the OS (which are always absolute
        // and canonical) match our stored paths.
        let targets = paths
            .iter()
            .map(|p| {
                let path = canonical(p);
                let name = path.file_name().map(std::ffi::OsStr::to_os_string);
                Target { path, name }
            })
            .collect::<Vec<_>>();
        let watch_roots = targets
            .iter()
            .map(|t| watch_root_for(&t.path))
            .collect::<BTreeSet<_>>();

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        for root in &watch_roots {
            watcher.watch(root, RecursiveMode::NonRecursive)?;
        }

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_roots,
            targets,
            debounce,
            pending_since: None,
        })
    }

    /// Canonical paths of the watched files.
    pub fn target_paths(&self) -> impl Iterator<Item = &Path> {
        self.targets.iter().map(|t| t.path.as_path())
    }

    /// Returns true once a debounced file change is ready.
    pub fn take_change_ready(&mut self) -> bool {
        let mut saw_relevant_event = false;
        let mut total_events = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            total_events += 1;
            match event {
                Ok(ev) if self.is_relevant(&ev) => {
                    saw_relevant_event = true;
                }
                Ok(ev) => {
                    tracing::trace!(kind = ?ev.kind, paths = ?ev.paths, "irrelevant fs event");
                }
                Err(err) => {
                    tracing::warn!(%err, "file watcher error");
                }
            }
        }

        if total_events > 0 {
            tracing::trace!(total_events, relevant = saw_relevant_event, "watcher poll");
        }

        if saw_relevant_event {
            self.pending_since = Some(Instant::now());
        }

        let Some(pending_since) = self.pending_since else {
            return false;
        };
        if pending_since.elapsed() >= self.debounce {
            self.pending_since = None;
            return true;
        }
        false
    }

    /// Block until a debounced change is ready, polling every `interval`.
    pub fn wait_for_change(&mut self, interval: Duration) {
        while !self.take_change_ready() {
            std::thread::sleep(interval);
        }
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            self.watch_roots.contains(path)
                || self.targets.iter().any(|t| {
                    path == &t.path
                        || t
                            .name
                            .as_ref()
                            .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
                })
        })
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("targets", &self.targets)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

/// Canonicalize a possibly missing file through its parent directory.
fn canonical(path: &Path) -> PathBuf {
    if let Ok(path) = path.canonicalize() {
        return path;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => parent
            .canonicalize()
            .map_or_else(|_| path.to_path_buf(), |p| p.join(name)),
        _ => path.to_path_buf(),
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
