//! Entry formatters.
//!
//! Built-ins: `text` (key=value lines, the default) and `json` (one object per
//! line). Both honour the `disable_timestamp` key of the logger config.

use serde_json::{Map, Value};
use std::fmt::{self, Write as _};

use crate::config::ConfigNode;
use crate::error::BoxError;
use crate::logging::entry::Entry;

/// Turns an entry into the bytes handed to a writer.
pub trait Formatter: Send + Sync + fmt::Debug {
    /// Registry name of this formatter, for introspection.
    fn name(&self) -> &str;

    fn format(&self, entry: &Entry) -> Result<Vec<u8>, BoxError>;
}

const TIME_KEY: &str = "time";
const LEVEL_KEY: &str = "level";
const MSG_KEY: &str = "msg";
const LOGGER_KEY: &str = "logger";

/// `time="…" level=info logger=root msg="…" key=value`
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    pub disable_timestamp: bool,
}

impl TextFormatter {
    pub fn from_config(cfg: &ConfigNode) -> Self {
        Self {
            disable_timestamp: cfg.get_bool("disable_timestamp").unwrap_or(false),
        }
    }
}

impl Formatter for TextFormatter {
    fn name(&self) -> &str {
        "text"
    }

    fn format(&self, entry: &Entry) -> Result<Vec<u8>, BoxError> {
        let mut line = String::with_capacity(128);
        if !self.disable_timestamp {
            write!(line, "{}=\"{}\" ", TIME_KEY, entry.time.to_rfc3339())?;
        }
        write!(line, "{}={} ", LEVEL_KEY, entry.level)?;
        write!(line, "{}={} ", LOGGER_KEY, quote(&entry.logger))?;
        write!(line, "{}={}", MSG_KEY, quote(&entry.message))?;
        for (key, value) in &entry.fields {
            let rendered = match value {
                Value::String(s) => quote(s),
                other => other.to_string(),
            };
            write!(line, " {}={}", key, rendered)?;
        }
        line.push('\n');
        Ok(line.into_bytes())
    }
}

fn quote(s: &str) -> String {
    let bare = !s.is_empty()
        && s.chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '.' | '_' | '/' | '@' | ':' | '+'));
    if bare {
        s.to_string()
    } else {
        Value::String(s.to_string()).to_string()
    }
}

/// One JSON object per line. Fields that collide with the reserved keys are
/// kept under a `fields.` prefix.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    pub disable_timestamp: bool,
}

impl JsonFormatter {
    pub fn from_config(cfg: &ConfigNode) -> Self {
        Self {
            disable_timestamp: cfg.get_bool("disable_timestamp").unwrap_or(false),
        }
    }
}

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn format(&self, entry: &Entry) -> Result<Vec<u8>, BoxError> {
        let mut object = Map::with_capacity(entry.fields.len() + 4);
        for (key, value) in &entry.fields {
            let key = match key.as_str() {
                TIME_KEY | LEVEL_KEY | MSG_KEY | LOGGER_KEY => format!("fields.{}", key),
                _ => key.clone(),
            };
            object.insert(key, value.clone());
        }
        if !self.disable_timestamp {
            object.insert(TIME_KEY.into(), Value::String(entry.time.to_rfc3339()));
        }
        object.insert(LEVEL_KEY.into(), Value::String(entry.level.to_string()));
        object.insert(LOGGER_KEY.into(), Value::String(entry.logger.clone()));
        object.insert(MSG_KEY.into(), Value::String(entry.message.clone()));

        let mut buf = serde_json::to_vec(&Value::Object(object))?;
        buf.push(b'\n');
        Ok(buf)
    }
}
