//! Application identity.

use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use crate::logging::Fields;

const DEFAULT_VERSION: &str = "dev";
const DEFAULT_BASE_PATH: &str = "/";

/// Name, version, base path and pid of the running application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub base_path: String,
    pub pid: u32,
}

impl AppInfo {
    /// Info for the current process. An empty `name` falls back to the
    /// executable's file name.
    pub fn new(name: &str) -> Self {
        let name = if name.is_empty() {
            executable_name()
        } else {
            name.to_string()
        };

        Self {
            name,
            version: option_env!("APP_VERSION").unwrap_or(DEFAULT_VERSION).to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            pid: std::process::id(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// The info as log fields, one per attribute.
    pub fn fields(&self) -> Fields {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            _ => Fields::new(),
        }
    }
}

fn executable_name() -> String {
    std::env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::file_stem)
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let info = AppInfo::new("billing");
        assert_eq!(info.name, "billing");
        assert_eq!(info.base_path, "/");
        assert_eq!(info.pid, std::process::id());
        assert!(!info.version.is_empty());
    }

    #[test]
    fn test_empty_name_uses_executable() {
        let info = AppInfo::new("");
        assert!(!info.name.is_empty());
    }

    #[test]
    fn test_fields() {
        let info = AppInfo::new("billing").with_version("1.2.3");
        let fields = info.fields();
        assert_eq!(fields["name"], "billing");
        assert_eq!(fields["version"], "1.2.3");
        assert_eq!(fields["base_path"], "/");
        assert_eq!(fields["pid"], std::process::id());
        assert_eq!(fields.len(), 4);
    }

    #[test]
    fn test_builders() {
        let info = AppInfo::new("billing").with_version("1.2.3").with_base_path("/api");
        assert_eq!(info.version, "1.2.3");
        assert_eq!(info.base_path, "/api");
    }
}
