//! Startup orchestration.
//!
//! # Responsibilities
//! - Locate and load configuration
//! - Build the application context
//! - Register modules, then run their init and start phases
//!
//! # Design Decisions
//! - Fail fast: an unreadable config file or a failing module is fatal
//! - Modules initialize in order, not concurrently

use std::path::PathBuf;
use std::sync::Arc;

use crate::app::{AppInfo, Application};
use crate::error::AppError;
use crate::logging::Level;
use crate::lifecycle::module::Module;

/// What to start.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// Application name; empty means the executable's name.
    pub name: String,
    /// Explicit configuration file. When unset the standard locations are
    /// searched.
    pub config: Option<PathBuf>,
}

/// Build the application and bring `modules` up.
pub fn bootstrap(options: &StartupOptions, modules: Vec<Arc<dyn Module>>) -> Result<Arc<Application>, AppError> {
    let app = match &options.config {
        Some(path) => Application::from_file(AppInfo::new(&options.name), path)?,
        None => Application::load(&options.name)?,
    };

    app.add(modules);
    app.init()?;
    app.start()?;

    let info = app.info();
    app.logger().emit(Level::Info, "application started", info.fields());
    tracing::info!(
        app = %info.name,
        version = %info.version,
        pid = info.pid,
        modules = app.module_names().len(),
        "application started"
    );
    Ok(Arc::new(app))
}
