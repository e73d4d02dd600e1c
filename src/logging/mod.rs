//! Hierarchical, configuration-driven logging.
//!
//! # Data Flow
//! ```text
//! ConfigNode ──► LoggerRegistry ──► Logger (owned) ──► Settings ──► hooks
//!                     │                  │                    ├──► Formatter
//!                     │                  └── Logger (shared)  └──► LogWriter
//!                     └── Plugins: formatter / writer / hook factories by name
//! ```
//!
//! # Design Decisions
//! - Configuration inherits down the dotted logger path; see [`merge`]
//! - Formatters, writers and hooks are built by name from [`Plugins`]
//! - Emitting never takes the registry lock

pub mod entry;
pub mod formatter;
pub mod hook;
pub mod level;
pub mod logger;
pub mod merge;
pub mod plugins;
pub mod registry;
pub mod writer;

pub use entry::{merge_fields, Entry, Fields};
pub use formatter::{Formatter, JsonFormatter, TextFormatter};
pub use hook::Hook;
pub use level::{parse_level, Level, ParseLevelError};
pub use logger::{Derivation, Logger, Settings};
pub use merge::{find_effective_config, merge_config, Resolved};
pub use plugins::{Factory, PluginRegistry, Plugins};
pub use registry::{LoggerRegistry, RegistryOptions, DEFAULT_ROOT_NAME};
pub use serde_json::Value;
pub use writer::{DiscardWriter, LogWriter, MemoryWriter, StderrWriter, StdoutWriter};
