//! Application context: configuration-driven logger tree, plugin registries
//! and a typed module registry.

pub mod app;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod modules;

pub use app::{AppInfo, Application};
pub use config::ConfigNode;
pub use error::{AppError, BoxError, ConfigError, ModuleError};
pub use lifecycle::{Module, Shutdown};
pub use logging::{Level, Logger, LoggerRegistry, Plugins};
pub use modules::ModuleRegistry;
