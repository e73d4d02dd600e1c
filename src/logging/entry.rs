//! Log entries and static fields.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::logging::level::Level;

/// Structured fields attached to a logger or a single entry.
///
/// Sorted, so formatters produce deterministic output.
pub type Fields = BTreeMap<String, Value>;

/// A single log record, handed to hooks and formatters.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    /// Full dotted path of the logger that produced the entry.
    pub logger: String,
    pub fields: Fields,
}

impl Entry {
    pub fn new(level: Level, message: impl Into<String>, logger: impl Into<String>, fields: Fields) -> Self {
        Self {
            time: Utc::now(),
            level,
            message: message.into(),
            logger: logger.into(),
            fields,
        }
    }
}

/// Overlay `child` onto `parent`; the child wins on key collisions.
pub fn merge_fields(parent: &Fields, child: Fields) -> Fields {
    let mut merged = parent.clone();
    merged.extend(child);
    merged
}

/// Build a [`Fields`] map from `key => value` pairs.
///
/// ```
/// let fields = app_context::fields! { "app" => "billing", "attempt" => 3 };
/// assert_eq!(fields["attempt"], 3);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::logging::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::logging::Fields::new();
        $(
            fields.insert(::std::string::ToString::to_string(&$key), $crate::logging::Value::from($value));
        )+
        fields
    }};
}
