//! File watcher for hot reloading CSG scripts
//!
//! Watches `.csg` files and reports when they should be parsed again.

use anyhow::{Result, anyhow};
use notify::RecursiveMode;
use notify_debouncer_mini::{DebouncedEvent, new_debouncer};
use parking_lot::Mutex;
use sculpt_csg::Tree;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};
use std::time::Duration;

/// File extension of CSG scripts.
pub const SCRIPT_EXTENSION: &str = "csg";

/// Default debounce window in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Event emitted when a watched file changes
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A watched script changed on disk
    Modified(PathBuf),
    /// The underlying watcher reported an error
    Error(String),
}

/// Watches script files for changes
pub struct ScriptWatcher {
    debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    receiver: Receiver<WatchEvent>,
    watched_paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl ScriptWatcher {
    /// Create a watcher that coalesces bursts of writes within `debounce_ms`
    /// (default [`DEFAULT_DEBOUNCE_MS`]).
    pub fn new(debounce_ms: Option<u64>) -> Result<Self> {
        let (tx, rx) = channel();
        let watched_paths = Arc::new(Mutex::new(Vec::new()));
        let filter_paths = Arc::clone(&watched_paths);

        let debounce = Duration::from_millis(debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS));

        let debouncer = new_debouncer(
            debounce,
            move |result: std::result::Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    let watched = filter_paths.lock();
                    for event in events {
                        if is_relevant(&watched, &event.path) {
                            let _ = tx.send(WatchEvent::Modified(event.path));
                        }
                    }
                }
                Err(e) => {
                    let _ = tx.send(WatchEvent::Error(format!("Watch error: {e:?}")));
                }
            },
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {e:?}"))?;

        Ok(Self {
            debouncer,
            receiver: rx,
            watched_paths,
        })
    }

    /// Watch a script file, or every `.csg` file directly inside a directory.
    pub fn watch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let canonical = path
            .canonicalize()
            .map_err(|e| anyhow!("Failed to watch path {}: {}", path.display(), e))?;

        {
            let mut watched = self.watched_paths.lock();
            if !watched.contains(&canonical) {
                watched.push(canonical.clone());
            }
        }

        self.debouncer
            .watcher()
            .watch(&canonical, RecursiveMode::NonRecursive)
            .map_err(|e| anyhow!("Failed to watch path {}: {}", canonical.display(), e))?;

        tracing::info!("Watching: {}", canonical.display());
        Ok(())
    }

    /// Stop watching a path
    pub fn unwatch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        self.watched_paths.lock().retain(|p| p != &canonical);

        self.debouncer
            .watcher()
            .unwatch(&canonical)
            .map_err(|e| anyhow!("Failed to unwatch path {}: {}", canonical.display(), e))?;

        Ok(())
    }

    /// Paths currently being watched, canonicalized.
    pub fn watched(&self) -> Vec<PathBuf> {
        self.watched_paths.lock().clone()
    }

    /// Try to receive a watch event (non-blocking)
    pub fn try_recv(&self) -> Option<WatchEvent> {
        self.receiver.try_recv().ok()
    }

    /// Receive a watch event (blocking)
    pub fn recv(&self) -> Option<WatchEvent> {
        self.receiver.recv().ok()
    }

    /// Receive a watch event with timeout
    pub fn recv_timeout(&self, timeout: Duration) -> Option<WatchEvent> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Get all pending events
    pub fn drain_events(&self) -> Vec<WatchEvent> {
        self.receiver.try_iter().collect()
    }
}

/// A changed path matters if it is a watched file, or a `.csg` file inside a
/// watched directory.
fn is_relevant(watched: &[PathBuf], path: &Path) -> bool {
    if watched.iter().any(|p| p == path) {
        return true;
    }
    let is_script = path.extension().is_some_and(|e| e == SCRIPT_EXTENSION);
    is_script && watched.iter().any(|p| path.starts_with(p))
}

/// The latest parse of a watched script.
///
/// A failed reload keeps the previous tree so a live preview survives typos.
#[derive(Debug, Clone)]
pub struct LiveScript {
    pub path: PathBuf,
    pub tree: Option<Tree>,
    pub last_error: Option<String>,
    pub generation: u64,
}

impl LiveScript {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tree: None,
            last_error: None,
            generation: 0,
        }
    }

    /// Parse the script again. Returns whether a new tree was installed.
    pub fn reload(&mut self) -> bool {
        match crate::load_file(&self.path) {
            Ok(tree) => {
                self.tree = Some(tree);
                self.last_error = None;
                self.generation += 1;
                true
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Reload failed: {e}");
                self.last_error = Some(e.to_string());
                false
            }
        }
    }
}
