//! Log hooks.
//!
//! Hooks are additive: a logger fires every hook configured on it and on its
//! ancestors. No hooks are built in.

use serde_json::Value;
use std::fmt;

use crate::config::ConfigNode;
use crate::error::BoxError;
use crate::logging::entry::Entry;
use crate::logging::level::Level;

/// A side channel fired for every entry at one of its levels, before the entry
/// is formatted and written.
pub trait Hook: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn levels(&self) -> &[Level] {
        &Level::ALL
    }

    fn fire(&self, entry: &Entry) -> Result<(), BoxError>;
}

/// Extract hook descriptors from the `hooks` key of a logger config.
///
/// Accepts one descriptor table or a list of them. Entries that are not
/// tables, or that lack a string `name`, are skipped rather than reported, so
/// stray configuration never prevents a logger from being built.
pub fn hook_descriptors(cfg: &ConfigNode) -> Vec<ConfigNode> {
    let candidates: Vec<&Value> = match cfg.get("hooks") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(value @ Value::Object(_)) => vec![value],
        _ => Vec::new(),
    };

    candidates
        .into_iter()
        .filter_map(|value| match value {
            Value::Object(table) => Some(ConfigNode::from(table.clone())),
            _ => None,
        })
        .filter(|descriptor| hook_name(descriptor).is_some())
        .collect()
}

/// Lowercased `name` of a hook descriptor.
pub fn hook_name(descriptor: &ConfigNode) -> Option<String> {
    descriptor
        .get_str("name")
        .filter(|name| !name.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_descriptor() {
        let cfg = ConfigNode::from_value(json!({
            "hooks": {"name": "other", "host": "blah", "port": 3939}
        }));
        let descriptors = hook_descriptors(&cfg);
        assert_eq!(descriptors.len(), 1);
        assert_eq!(hook_name(&descriptors[0]).as_deref(), Some("other"));
        assert_eq!(descriptors[0].get_str("host"), Some("blah"));
    }

    #[test]
    fn test_list_skips_malformed_entries() {
        let cfg = ConfigNode::from_value(json!({
            "hooks": [
                {"name": "First"},
                {"host": "no-name"},
                "just a string",
                {"name": 42},
                {"name": "second"}
            ]
        }));
        let names: Vec<_> = hook_descriptors(&cfg)
            .iter()
            .filter_map(hook_name)
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_missing_or_scalar_hooks() {
        assert!(hook_descriptors(&ConfigNode::new()).is_empty());
        let cfg = ConfigNode::from_value(json!({"hooks": "syslog"}));
        assert!(hook_descriptors(&cfg).is_empty());
    }
}
