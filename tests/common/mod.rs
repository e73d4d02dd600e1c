//! Shared utilities for integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use app_context::error::BoxError;
use app_context::logging::{Entry, Hook, MemoryWriter};
use app_context::Plugins;
use parking_lot::Mutex;

/// Built-in plugins plus a `memory` writer that captures into the returned
/// buffer.
#[allow(dead_code)]
pub fn memory_plugins() -> (Arc<Plugins>, MemoryWriter) {
    let writer = MemoryWriter::new();
    let plugins = Plugins::new();
    let captured = writer.clone();
    plugins.register_writer("memory", move |_| captured.clone());
    (Arc::new(plugins), writer)
}

/// Hook that records `name:target` for every entry it sees.
#[derive(Debug)]
pub struct RecordingHook {
    name: String,
    target: String,
    fired: Arc<Mutex<Vec<String>>>,
}

impl Hook for RecordingHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn fire(&self, _entry: &Entry) -> Result<(), BoxError> {
        self.fired.lock().push(format!("{}:{}", self.name, self.target));
        Ok(())
    }
}

/// Register recording hooks under each of `names`; all share one log.
#[allow(dead_code)]
pub fn register_recording_hooks(plugins: &Plugins, names: &[&str]) -> Arc<Mutex<Vec<String>>> {
    let fired = Arc::new(Mutex::new(Vec::new()));
    for name in names {
        let fired = Arc::clone(&fired);
        let hook_name = name.to_string();
        plugins.register_hook(name, move |cfg| RecordingHook {
            name: hook_name.clone(),
            target: cfg.get_str("target").unwrap_or("-").to_string(),
            fired: Arc::clone(&fired),
        });
    }
    fired
}

#[allow(dead_code)]
pub fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Poll `cond` every 50ms until it holds or `timeout` elapses.
#[allow(dead_code)]
pub async fn wait_for<F>(timeout: Duration, mut cond: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    cond()
}
