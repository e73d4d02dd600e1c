//! Configuration file watcher for hot reload.
//!
//! # Design Decisions
//! - Watches the file's directory, not the file: editors that save by
//!   renaming a temporary file would otherwise end the watch
//! - A snapshot equal to the last one delivered is dropped, so the burst of
//!   events a single save produces reloads once
//! - A file that fails to parse keeps the current configuration

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_snapshot;
use crate::config::node::ConfigNode;

/// Poll interval for platforms without native file events.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Watches one configuration file and sends a fresh snapshot on every change.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ConfigNode>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end for new snapshots.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ConfigNode>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start watching. Dropping the returned handle stops the watch.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let last = Mutex::new(load_snapshot(&self.path).ok().map(|node| node.to_value()));
        let path = self.path.clone();
        let tx = self.update_tx;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_relevant(&event, &path) => {
                    let snapshot = match load_snapshot(&path) {
                        Ok(snapshot) => snapshot,
                        Err(e) => {
                            tracing::error!(path = %path.display(), error = %e, "failed to reload config, keeping current configuration");
                            return;
                        }
                    };

                    let value = snapshot.to_value();
                    let mut last = last.lock();
                    if last.as_ref() == Some(&value) {
                        return;
                    }
                    *last = Some(value);

                    tracing::info!(path = %path.display(), "config file changed");
                    let _ = tx.send(snapshot);
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "config watch error"),
            },
            Config::default().with_poll_interval(POLL_INTERVAL),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %self.path.display(), "config watcher started");
        Ok(watcher)
    }
}

/// Whether `event` touches the file at `target`.
fn is_relevant(event: &Event, target: &Path) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    let Some(name) = target.file_name() else {
        return false;
    };
    event.paths.iter().any(|p| p.file_name() == Some(name))
}
