//! Output writers.
//!
//! Built-ins: `stdout`, `stderr` (the default), `discard`. [`MemoryWriter`]
//! is not registered by default; register it to capture output in memory.

use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use crate::config::ConfigNode;

/// Destination for formatted entries.
///
/// Writes are synchronous and best-effort; errors are reported by the caller
/// and never reach application code.
pub trait LogWriter: Send + Sync + fmt::Debug {
    /// Registry name of this writer, for introspection.
    fn name(&self) -> &str;

    fn write_entry(&self, buf: &[u8]) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutWriter;

impl LogWriter for StdoutWriter {
    fn name(&self) -> &str {
        "stdout"
    }

    fn write_entry(&self, buf: &[u8]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(buf)?;
        out.flush()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StderrWriter;

impl LogWriter for StderrWriter {
    fn name(&self) -> &str {
        "stderr"
    }

    fn write_entry(&self, buf: &[u8]) -> io::Result<()> {
        io::stderr().lock().write_all(buf)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardWriter;

impl LogWriter for DiscardWriter {
    fn name(&self) -> &str {
        "discard"
    }

    fn write_entry(&self, _buf: &[u8]) -> io::Result<()> {
        Ok(())
    }
}

/// Collects everything written into a shared buffer. Clones share the buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.buf.lock().clear();
    }
}

impl LogWriter for MemoryWriter {
    fn name(&self) -> &str {
        "memory"
    }

    fn write_entry(&self, buf: &[u8]) -> io::Result<()> {
        self.buf.lock().extend_from_slice(buf);
        Ok(())
    }
}

/// Normalise the `writer` key of a logger config into a node with a `name`.
///
/// Accepted shapes:
/// - `writer = "stdout"`
/// - `writer = { name = "stdout", … }`
/// - `[writer.stdout]` (a single-key table whose key is the writer name)
///
/// Anything else yields an empty node, which resolves to the default writer.
pub fn writer_config(cfg: &ConfigNode) -> ConfigNode {
    let mut node = ConfigNode::new();
    match cfg.get("writer") {
        Some(Value::String(name)) => {
            node.set("name", name.as_str());
        }
        Some(Value::Object(table)) if table.contains_key("name") => {
            node = ConfigNode::from(table.clone());
        }
        Some(Value::Object(table)) if table.len() == 1 => {
            if let Some((name, params)) = table.iter().next() {
                if let Value::Object(params) = params {
                    node = ConfigNode::from(params.clone());
                }
                node.set("name", name.as_str());
            }
        }
        _ => {}
    }
    node
}
