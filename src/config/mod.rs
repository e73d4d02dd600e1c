//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON)
//!     → loader.rs (search path, parse)
//!     → ConfigNode (immutable snapshot, case-insensitive keys)
//!     → handed to the logger registry and the application
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new snapshot
//!     → snapshot sent over a channel
//!     → Application::reload swaps it in and reconfigures the logger tree
//! ```
//!
//! # Design Decisions
//! - Snapshots are never mutated in place; a reload replaces the whole snapshot
//! - A file that fails to parse on reload keeps the current configuration
//! - Only the initial load can fail construction

pub mod loader;
pub mod node;
pub mod watcher;

pub use loader::{discover, load_snapshot};
pub use node::ConfigNode;
pub use watcher::ConfigWatcher;
