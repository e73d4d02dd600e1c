//! Hierarchical key/value configuration snapshot.
//!
//! # Design Decisions
//! - Keys are case-insensitive: every object key is lowercased on the way in
//! - Dotted keys address nested tables (`"root.child1.level"`)
//! - A node is a cheap handle over shared data; `ptr_eq` compares identity
//! - Mutation (`set`, `set_default`) copies on write, so other handles to the
//!   same snapshot never observe it

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::ConfigError;

/// A snapshot of hierarchical configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigNode {
    table: Arc<Map<String, Value>>,
}

impl ConfigNode {
    /// Create an empty node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a node from a JSON value. Anything but an object yields an empty node.
    pub fn from_value(value: Value) -> Self {
        match normalize(value) {
            Value::Object(table) => Self {
                table: Arc::new(table),
            },
            _ => Self::default(),
        }
    }

    /// Parse a TOML document.
    pub fn from_toml(src: &str) -> Result<Self, ConfigError> {
        let value: Value = toml::from_str(src)?;
        Self::from_document(value)
    }

    /// Parse a JSON document.
    pub fn from_json(src: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(src)?;
        Self::from_document(value)
    }

    fn from_document(value: Value) -> Result<Self, ConfigError> {
        if !value.is_object() {
            return Err(ConfigError::NotATable);
        }
        Ok(Self::from_value(value))
    }

    /// Returns true when both handles point at the same snapshot.
    pub fn ptr_eq(a: &ConfigNode, b: &ConfigNode) -> bool {
        Arc::ptr_eq(&a.table, &b.table)
    }

    /// Look up a (possibly dotted) key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let key = key.to_lowercase();
        let mut parts = key.split('.');
        let mut current = self.table.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Returns true if the key is present, even when its value is null.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_map(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    pub fn get_list(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    /// A new node scoped to the table at `key`, if that key holds a table.
    pub fn sub(&self, key: &str) -> Option<ConfigNode> {
        self.get_map(key).map(|table| Self {
            table: Arc::new(table.clone()),
        })
    }

    /// Set a (possibly dotted) key, creating intermediate tables as needed.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let key = key.to_lowercase();
        let value = normalize(value.into());
        let table = Arc::make_mut(&mut self.table);

        let mut parts: Vec<&str> = key.split('.').collect();
        let Some(last) = parts.pop() else {
            return;
        };
        let mut current = table;
        for part in parts {
            let slot = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Value::Object(map) = slot else {
                return;
            };
            current = map;
        }
        current.insert(last.to_string(), value);
    }

    /// Set `key` only if it is absent. Returns true when the default was applied.
    pub fn set_default(&mut self, key: &str, value: impl Into<Value>) -> bool {
        if self.has(key) {
            return false;
        }
        self.set(key, value);
        true
    }

    /// Remove a top-level key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let key = key.to_lowercase();
        if !self.table.contains_key(&key) {
            return None;
        }
        Arc::make_mut(&mut self.table).remove(&key)
    }

    /// Top-level keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.table.keys().cloned().collect()
    }

    /// Top-level keys whose value is a table.
    pub fn sub_keys(&self) -> Vec<String> {
        self.table
            .iter()
            .filter(|(_, v)| v.is_object())
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.table
    }

    pub fn to_value(&self) -> Value {
        Value::Object((*self.table).clone())
    }

    /// Deserialize this node into a typed structure.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }
}

impl PartialEq for ConfigNode {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || self.table == other.table
    }
}

impl From<Map<String, Value>> for ConfigNode {
    fn from(table: Map<String, Value>) -> Self {
        Self::from_value(Value::Object(table))
    }
}

fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_lowercase(), normalize(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}
