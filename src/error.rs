//! Error types shared across the crate.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by plugin and module callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that prevent a configuration snapshot from being produced.
///
/// These are the only construction-fatal errors: everything that goes wrong
/// inside the logger tree after a snapshot exists degrades to a default.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file is not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed, but its top level is not a table.
    #[error("configuration root must be a table")]
    NotATable,
}

/// Errors returned by the module registry.
///
/// These are caller bugs and are always returned, never logged and swallowed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModuleError {
    /// No module is registered under the key.
    #[error("unknown module {0:?}")]
    Unknown(String),

    /// A module exists under the key but holds a different type.
    #[error("can't assign module {key:?} of type {actual} to {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Errors surfaced by the application context.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A module lifecycle callback failed.
    #[error("module {module} failed during {phase}: {source}")]
    Module {
        module: String,
        phase: &'static str,
        #[source]
        source: BoxError,
    },

    /// The configuration file watcher could not be started.
    #[error("failed to watch configuration: {0}")]
    Watch(#[from] notify::Error),
}
