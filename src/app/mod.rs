//! The application context.
//!
//! # Data Flow
//! ```text
//! config file ──► ConfigNode ──► Application ──► LoggerRegistry (logging tree)
//!                                     │      ──► ModuleRegistry (shared services)
//!                                     │      ──► Plugins
//!                                     └── modules: init → start → … → stop
//! ConfigWatcher ──► snapshot ──► Application::reload ──► loggers, then modules
//! ```
//!
//! # Design Decisions
//! - The current snapshot sits behind an `ArcSwap`, so `config()` never
//!   blocks a reload
//! - Module callbacks run on a copy of the module list; a callback may add
//!   modules or look up services without deadlocking

pub mod info;

pub use info::AppInfo;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde_json::json;
use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::{discover, load_snapshot, ConfigNode, ConfigWatcher};
use crate::error::{AppError, ModuleError};
use crate::lifecycle::{Module, Shutdown};
use crate::logging::{Fields, Logger, LoggerRegistry, Plugins, RegistryOptions};
use crate::modules::ModuleRegistry;

/// Fill in the defaults a loaded configuration file is expected to carry.
///
/// A file without a `logging` table gets a root logger at `info`.
pub fn apply_defaults(cfg: &mut ConfigNode) {
    cfg.set_default("logging", json!({"root": {"level": "info"}}));
}

/// Shared context handed to every module.
pub struct Application {
    info: AppInfo,
    config: ArcSwap<ConfigNode>,
    config_path: Option<PathBuf>,
    plugins: Arc<Plugins>,
    loggers: LoggerRegistry,
    modules: ModuleRegistry,
    lifecycle: Mutex<Vec<Arc<dyn Module>>>,
}

impl Application {
    /// Build an application around an in-memory snapshot with the built-in
    /// plugins.
    pub fn new(info: AppInfo, config: ConfigNode) -> Self {
        Self::with_plugins(info, config, Arc::new(Plugins::new()))
    }

    /// Build an application whose logger tree resolves plugins from `plugins`.
    ///
    /// Register custom formatters, writers and hooks on `plugins` first, so
    /// the initial tree can use them.
    pub fn with_plugins(info: AppInfo, config: ConfigNode, plugins: Arc<Plugins>) -> Self {
        let options = RegistryOptions {
            plugins: Arc::clone(&plugins),
            ..Default::default()
        };
        let loggers = LoggerRegistry::with_options(&config, crate::fields! { "app" => info.name.clone() }, options);

        tracing::debug!(app = %info.name, version = %info.version, "application created");

        Self {
            info,
            config: ArcSwap::from_pointee(config),
            config_path: None,
            plugins,
            loggers,
            modules: ModuleRegistry::new(),
            lifecycle: Mutex::new(Vec::new()),
        }
    }

    /// Build an application from the configuration file at `path`.
    pub fn from_file(info: AppInfo, path: &Path) -> Result<Self, AppError> {
        let mut config = load_snapshot(path)?;
        apply_defaults(&mut config);
        tracing::info!(path = %path.display(), "configuration loaded");

        let mut app = Self::new(info, config);
        app.config_path = Some(path.to_path_buf());
        Ok(app)
    }

    /// Build the application `name`, searching the standard locations for its
    /// configuration file. Runs on defaults when no file exists.
    pub fn load(name: &str) -> Result<Self, AppError> {
        let info = AppInfo::new(name);
        match discover(&info.name)? {
            Some((path, mut config)) => {
                apply_defaults(&mut config);
                let mut app = Self::new(info, config);
                app.config_path = Some(path);
                Ok(app)
            }
            None => {
                let mut config = ConfigNode::new();
                apply_defaults(&mut config);
                Ok(Self::new(info, config))
            }
        }
    }

    pub fn info(&self) -> &AppInfo {
        &self.info
    }

    /// The current configuration snapshot.
    pub fn config(&self) -> ConfigNode {
        ConfigNode::clone(&self.config.load())
    }

    /// File the configuration was loaded from, if any.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// The root logger.
    pub fn logger(&self) -> Logger {
        self.loggers.root()
    }

    /// A named child of the root logger.
    pub fn new_logger(&self, name: &str, fields: Fields) -> Logger {
        self.loggers.root().new(name, fields)
    }

    pub fn loggers(&self) -> &LoggerRegistry {
        &self.loggers
    }

    pub fn plugins(&self) -> &Arc<Plugins> {
        &self.plugins
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    /// A clone of the service registered under `key`.
    pub fn get<T>(&self, key: &str) -> Result<T, ModuleError>
    where
        T: Any + Send + Sync + Clone,
    {
        self.modules.get(key)
    }

    pub fn get_into<T>(&self, key: &str, out: &mut T) -> Result<(), ModuleError>
    where
        T: Any + Send + Sync + Clone,
    {
        self.modules.get_into(key, out)
    }

    pub fn set<T>(&self, key: &str, instance: T)
    where
        T: Any + Send + Sync,
    {
        self.modules.set(key, instance);
    }

    /// Append modules; they take part in every later lifecycle phase.
    pub fn add<I>(&self, modules: I)
    where
        I: IntoIterator<Item = Arc<dyn Module>>,
    {
        self.lifecycle.lock().extend(modules);
    }

    /// Names of the added modules, in registration order.
    pub fn module_names(&self) -> Vec<String> {
        self.lifecycle.lock().iter().map(|m| m.name().to_string()).collect()
    }

    pub fn init(&self) -> Result<(), AppError> {
        self.run_phase("init", |module| module.init(self))
    }

    pub fn start(&self) -> Result<(), AppError> {
        self.run_phase("start", |module| module.start(self))
    }

    pub fn stop(&self) -> Result<(), AppError> {
        self.run_phase("stop", |module| module.stop(self))
    }

    fn run_phase<F>(&self, phase: &'static str, mut run: F) -> Result<(), AppError>
    where
        F: FnMut(&dyn Module) -> Result<(), crate::error::BoxError>,
    {
        let modules = self.lifecycle.lock().clone();
        for module in &modules {
            tracing::debug!(module = module.name(), phase, "running module phase");
            run(module.as_ref()).map_err(|source| AppError::Module {
                module: module.name().to_string(),
                phase,
                source,
            })?;
        }
        Ok(())
    }

    /// Apply a new configuration snapshot: swap it in, reconfigure the logger
    /// tree, then let every module reload.
    ///
    /// A module that fails to reload is logged; the rest still run.
    pub fn reload(&self, config: ConfigNode) {
        self.config.store(Arc::new(config.clone()));
        self.loggers.reload(&config);

        let modules = self.lifecycle.lock().clone();
        for module in &modules {
            if let Err(e) = module.reload(self) {
                tracing::error!(module = module.name(), error = %e, "module reload failed");
            }
        }
    }

    /// Reload whenever the file at `path` changes, until `shutdown` fires.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn watch(self: &Arc<Self>, path: &Path, shutdown: &Shutdown) -> Result<JoinHandle<()>, AppError> {
        let (watcher, mut updates) = ConfigWatcher::new(path);
        let handle = watcher.run()?;
        let mut stop = shutdown.subscribe();
        let app = Arc::clone(self);
        let path = path.display().to_string();

        Ok(tokio::spawn(async move {
            let _handle = handle;
            loop {
                tokio::select! {
                    update = updates.recv() => match update {
                        Some(mut snapshot) => {
                            apply_defaults(&mut snapshot);
                            app.reload(snapshot);
                            app.logger().emit(
                                crate::logging::Level::Info,
                                "config file changed",
                                crate::fields! { "path" => path.as_str() },
                            );
                        }
                        None => break,
                    },
                    _ = stop.recv() => break,
                }
            }
            tracing::debug!(path = %path, "config watch stopped");
        }))
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("info", &self.info)
            .field("config_path", &self.config_path)
            .field("loggers", &self.loggers)
            .field("modules", &self.modules)
            .field("lifecycle", &self.module_names())
            .finish()
    }
}
