//! Dependency injection between application modules.
//!
//! # Design Decisions
//! - Lookups are generic: the requested type is fixed at compile time and
//!   checked against the stored one at runtime
//! - The registry has its own lock, never held together with the logger
//!   registry's

pub mod registry;

pub use registry::ModuleRegistry;
