//! Application lifecycle.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Locate config → Load snapshot → Build application → Init modules → Start modules
//!
//! Running:
//!     Config file change → Reload logger tree → Reload modules
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     Ctrl-C → Trigger shutdown → Stop watcher → Stop modules
//! ```
//!
//! # Design Decisions
//! - Modules run each phase in registration order
//! - Init, start and stop fail fast; a failed reload is logged and the
//!   remaining modules still reload

pub mod module;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use module::Module;
pub use shutdown::{Shutdown, ShutdownSignal};
