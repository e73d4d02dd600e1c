//! Configuration inheritance across the logger tree.
//!
//! A logger node inherits `level`, the formatter name and `writer` from its
//! parent unless it sets them itself. Hooks accumulate: a child fires its own
//! hooks and every ancestor hook whose name it does not redefine.

use serde_json::Value;
use std::collections::HashSet;

use crate::config::ConfigNode;
use crate::logging::hook::{hook_descriptors, hook_name};

pub const LEVEL: &str = "level";
pub const FORMAT: &str = "format";
pub const FORMATTER: &str = "formatter";
pub const WRITER: &str = "writer";
pub const HOOKS: &str = "hooks";
pub const NAME: &str = "name";

/// Keys that configure a logger rather than name a child logger.
pub const RESERVED_KEYS: [&str; 6] = [LEVEL, FORMAT, FORMATTER, WRITER, HOOKS, NAME];

pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Keys of `node` that describe child loggers.
pub fn logger_keys(node: &ConfigNode) -> Vec<String> {
    node.sub_keys().into_iter().filter(|k| !is_reserved(k)).collect()
}

/// Defaults applied to every top-level logger node.
pub fn add_logging_defaults(node: &mut ConfigNode) {
    node.set_default(LEVEL, "info");
    node.set_default(WRITER, "stderr");
}

/// Formatter name of a node; `format` wins over its `formatter` alias.
pub fn formatter_name(node: &ConfigNode) -> &str {
    node.get_str(FORMAT)
        .or_else(|| node.get_str(FORMATTER))
        .unwrap_or("")
}

/// Apply `parent`'s effective settings as defaults on `child`.
pub fn merge_config(mut child: ConfigNode, parent: &ConfigNode) -> ConfigNode {
    if let Some(level) = parent.get(LEVEL) {
        child.set_default(LEVEL, level.clone());
    }
    if !child.has(FORMAT) && !child.has(FORMATTER) {
        if let Some(format) = parent.get(FORMAT).or_else(|| parent.get(FORMATTER)) {
            child.set(FORMAT, format.clone());
        }
    }
    if let Some(writer) = parent.get(WRITER) {
        child.set_default(WRITER, writer.clone());
    }

    if child.has(HOOKS) || parent.has(HOOKS) {
        let merged = merge_hooks(&hook_descriptors(&child), &hook_descriptors(parent));
        child.set(HOOKS, Value::Array(merged));
    }
    child
}

/// Child descriptors first, then parent descriptors with names the child did
/// not define. The first descriptor for a name wins.
fn merge_hooks(child: &[ConfigNode], parent: &[ConfigNode]) -> Vec<Value> {
    let mut seen = HashSet::new();
    child
        .iter()
        .chain(parent)
        .filter(|descriptor| match hook_name(descriptor) {
            Some(name) => seen.insert(name),
            None => false,
        })
        .map(ConfigNode::to_value)
        .collect()
}

/// Effective configuration found for a logger path.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Merged configuration for the path.
    pub config: ConfigNode,
    /// Path of the deepest segment that has its own configuration subtree.
    /// Equal to the requested path when the logger is configured directly.
    pub matched_path: String,
}

impl Resolved {
    /// Whether the requested path has a dedicated configuration subtree.
    pub fn is_exact(&self, path: &str) -> bool {
        self.matched_path.eq_ignore_ascii_case(path)
    }
}

/// Resolve the effective configuration for a dotted logger `path`.
///
/// Walks from the first segment down, merging every configured segment onto
/// its parent's merged node. A segment without configuration reuses the
/// nearest ancestor's merged node unchanged, and the remaining segments are
/// looked up inside that node. Returns `None` only when the first segment is
/// not configured at all.
pub fn find_effective_config(path: &str, root: &ConfigNode) -> Option<Resolved> {
    let path = path.to_lowercase();
    let mut segments = path.split('.');
    let first = segments.next()?;
    if is_reserved(first) {
        return None;
    }

    let mut current = root.sub(first)?;
    add_logging_defaults(&mut current);
    let mut matched_path = first.to_string();
    let mut walked = first.to_string();

    for segment in segments {
        walked.push('.');
        walked.push_str(segment);
        if is_reserved(segment) {
            continue;
        }
        if let Some(child) = current.sub(segment) {
            current = merge_config(child, &current);
            matched_path.clone_from(&walked);
        }
    }

    Some(Resolved {
        config: current,
        matched_path,
    })
}
