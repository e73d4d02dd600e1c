//! Named loggers.
//!
//! # Responsibilities
//! - Emit leveled, field-tagged entries through the current settings
//! - Derive named children (cached by the owning registry)
//! - Swap settings in place on reconfiguration
//!
//! # Design Decisions
//! - Level, formatter, writer and hooks live in one `Settings` value behind an
//!   `ArcSwap`; `emit` loads it once, so readers never see a half-updated
//!   logger and never take a lock
//! - A child without its own configuration subtree shares its parent's
//!   emitter (`Derivation::Shared`) and sees every reconfiguration of it
//! - The emitter binding is itself swappable: a reload promotes a shared
//!   logger that gained a subtree and demotes an owned one that lost it,
//!   without changing the handle callers hold
//! - Loggers hold a weak reference to their registry; the registry holds the
//!   loggers

use arc_swap::ArcSwap;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::config::ConfigNode;
use crate::logging::entry::{merge_fields, Entry, Fields};
use crate::logging::formatter::Formatter;
use crate::logging::hook::Hook;
use crate::logging::level::{parse_level, Level};
use crate::logging::merge::{self, formatter_name, merge_config};
use crate::logging::plugins::Plugins;
use crate::logging::registry::RegistryShared;
use crate::logging::writer::{writer_config, LogWriter};

/// Everything a logger needs to emit, swapped as one unit.
#[derive(Debug)]
pub struct Settings {
    level: Level,
    formatter: Arc<dyn Formatter>,
    writer: Arc<dyn LogWriter>,
    hooks: Vec<Arc<dyn Hook>>,
    config: ConfigNode,
}

impl Settings {
    /// Build settings from an effective logger config.
    ///
    /// Never fails: bad levels, unknown plugins and malformed hook entries
    /// all degrade to their defaults.
    pub fn from_config(cfg: &ConfigNode, plugins: &Plugins) -> Self {
        let level = match cfg.get(merge::LEVEL) {
            Some(Value::String(raw)) => parse_level(raw),
            Some(other) => parse_level(&other.to_string()),
            None => Level::Info,
        };
        let (formatter, _) = plugins.resolve_formatter(formatter_name(cfg), cfg);
        let wcfg = writer_config(cfg);
        let (writer, _) = plugins.resolve_writer(wcfg.get_str("name").unwrap_or(""), &wcfg);
        let hooks = plugins.build_hooks(cfg);

        Self {
            level,
            formatter,
            writer,
            hooks,
            config: cfg.clone(),
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn formatter(&self) -> &Arc<dyn Formatter> {
        &self.formatter
    }

    pub fn writer(&self) -> &Arc<dyn LogWriter> {
        &self.writer
    }

    pub fn hooks(&self) -> &[Arc<dyn Hook>] {
        &self.hooks
    }

    pub fn config(&self) -> &ConfigNode {
        &self.config
    }

    fn dispatch(&self, entry: &Entry) {
        for hook in self.hooks.iter().filter(|h| h.levels().contains(&entry.level)) {
            if let Err(err) = hook.fire(entry) {
                tracing::warn!(hook = hook.name(), logger = %entry.logger, error = %err, "log hook failed");
            }
        }

        match self.formatter.format(entry) {
            Ok(buf) => {
                if let Err(err) = self.writer.write_entry(&buf) {
                    tracing::warn!(writer = self.writer.name(), logger = %entry.logger, error = %err, "log write failed");
                }
            }
            Err(err) => {
                tracing::warn!(formatter = self.formatter.name(), logger = %entry.logger, error = %err, "log format failed");
            }
        }
    }
}

/// The mutable heart of a logger, possibly shared with descendants.
#[derive(Debug)]
pub(crate) struct Emitter {
    settings: ArcSwap<Settings>,
}

impl Emitter {
    fn new(settings: Settings) -> Self {
        Self {
            settings: ArcSwap::from_pointee(settings),
        }
    }
}

/// How a logger came by its emitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Derivation {
    /// Built from a configuration subtree dedicated to this logger's path.
    Owned,
    /// Forwards to the emitter owned by the logger at `owner`.
    Shared { owner: String },
}

/// The emitter a logger writes through, and where it came from.
#[derive(Debug)]
struct Binding {
    derivation: Derivation,
    emitter: Arc<Emitter>,
}

/// A configured, named emitter of log entries. Clones are the same logger.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    name: String,
    path: String,
    fields: Fields,
    binding: ArcSwap<Binding>,
    plugins: Arc<Plugins>,
    registry: Weak<RegistryShared>,
}

impl Logger {
    /// A logger with its own emitter built from `cfg`.
    pub(crate) fn owned(
        name: &str,
        path: &str,
        fields: Fields,
        cfg: &ConfigNode,
        plugins: Arc<Plugins>,
        registry: Weak<RegistryShared>,
    ) -> Self {
        let settings = Settings::from_config(cfg, &plugins);
        Self {
            inner: Arc::new(LoggerInner {
                name: name.to_string(),
                path: path.to_lowercase(),
                fields,
                binding: ArcSwap::from_pointee(Binding {
                    derivation: Derivation::Owned,
                    emitter: Arc::new(Emitter::new(settings)),
                }),
                plugins,
                registry,
            }),
        }
    }

    /// A child of `parent` that writes through the parent's emitter.
    pub(crate) fn shared(parent: &Logger, name: &str, path: &str, fields: Fields) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                name: name.to_string(),
                path: path.to_lowercase(),
                fields,
                binding: ArcSwap::new(parent.share()),
                plugins: Arc::clone(&parent.inner.plugins),
                registry: parent.inner.registry.clone(),
            }),
        }
    }

    /// Derive the child logger `name`, or return it from the registry cache.
    ///
    /// The child's fields are this logger's fields overlaid with `fields`, plus
    /// `module`. Calling this twice with the same name returns the same logger.
    pub fn new(&self, name: &str, fields: Fields) -> Logger {
        let path = format!("{}.{}", self.inner.path, name.to_lowercase());
        let fields = merge_fields(&self.inner.fields, fields);

        match self.inner.registry.upgrade() {
            Some(registry) => registry.derive(self, name, &path, fields),
            None => self.derive_detached(name, &path, fields),
        }
    }

    /// Derivation without a registry: resolve against this logger's own
    /// config. Nothing is cached.
    fn derive_detached(&self, name: &str, path: &str, mut fields: Fields) -> Logger {
        let own = self.config();
        let segment = name.to_lowercase();
        match own.sub(&segment).filter(|_| !merge::is_reserved(&segment)) {
            Some(sub) => {
                let cfg = merge_config(sub, &own);
                let display = cfg.get_str(merge::NAME).unwrap_or(name).to_string();
                fields.insert("module".into(), Value::String(display));
                Logger::owned(name, path, fields, &cfg, Arc::clone(&self.inner.plugins), Weak::new())
            }
            None => {
                fields.insert("module".into(), Value::String(name.to_string()));
                Logger::shared(self, name, path, fields)
            }
        }
    }

    /// Replace level, formatter, writer and hooks in one swap.
    ///
    /// Safe to call while other threads emit. A shared logger reconfigures the
    /// emitter it shares with its owner.
    pub fn configure(&self, cfg: &ConfigNode) {
        let settings = Settings::from_config(cfg, &self.inner.plugins);
        self.inner.binding.load().emitter.settings.store(Arc::new(settings));
    }

    /// Give this logger an emitter of its own built from `cfg`.
    pub(crate) fn promote(&self, cfg: &ConfigNode) {
        let settings = Settings::from_config(cfg, &self.inner.plugins);
        self.inner.binding.store(Arc::new(Binding {
            derivation: Derivation::Owned,
            emitter: Arc::new(Emitter::new(settings)),
        }));
    }

    /// Write through `owner`'s emitter from now on. A no-op on itself.
    pub(crate) fn follow(&self, owner: &Logger) {
        if Logger::ptr_eq(self, owner) {
            return;
        }
        self.inner.binding.store(owner.share());
    }

    /// A shared binding onto this logger's current emitter.
    fn share(&self) -> Arc<Binding> {
        let binding = self.inner.binding.load();
        let owner = match &binding.derivation {
            Derivation::Owned => self.inner.path.clone(),
            Derivation::Shared { owner } => owner.clone(),
        };
        Arc::new(Binding {
            derivation: Derivation::Shared { owner },
            emitter: Arc::clone(&binding.emitter),
        })
    }

    fn emitter(&self) -> Arc<Emitter> {
        Arc::clone(&self.inner.binding.load().emitter)
    }

    /// Emit an entry with extra per-entry fields.
    pub fn emit(&self, level: Level, message: impl Into<String>, fields: Fields) {
        let binding = self.inner.binding.load();
        let settings = binding.emitter.settings.load();
        if !level.passes(settings.level) {
            return;
        }
        let entry = Entry::new(level, message, self.inner.path.as_str(), merge_fields(&self.inner.fields, fields));
        settings.dispatch(&entry);
    }

    pub fn log(&self, level: Level, message: impl Into<String>) {
        self.emit(level, message, Fields::new());
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    pub fn fatal(&self, message: impl Into<String>) {
        self.log(Level::Fatal, message);
    }

    pub fn panic(&self, message: impl Into<String>) {
        self.log(Level::Panic, message);
    }

    /// Whether an entry at `level` would currently be emitted.
    pub fn enabled(&self, level: Level) -> bool {
        level.passes(self.emitter().settings.load().level)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Accumulated static fields.
    pub fn fields(&self) -> &Fields {
        &self.inner.fields
    }

    pub fn level(&self) -> Level {
        self.emitter().settings.load().level
    }

    /// The configuration currently applied to this logger's emitter.
    pub fn config(&self) -> ConfigNode {
        self.emitter().settings.load().config.clone()
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Arc<Settings> {
        self.emitter().settings.load_full()
    }

    /// How this logger currently comes by its emitter. May change on reload.
    pub fn derivation(&self) -> Derivation {
        self.inner.binding.load().derivation.clone()
    }

    pub fn is_owned(&self) -> bool {
        self.inner.binding.load().derivation == Derivation::Owned
    }

    /// Path of the logger that owns this logger's emitter.
    pub fn owner(&self) -> String {
        match self.derivation() {
            Derivation::Owned => self.inner.path.clone(),
            Derivation::Shared { owner } => owner,
        }
    }

    pub fn shares_emitter_with(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.emitter(), &other.emitter())
    }

    /// Identity comparison.
    pub fn ptr_eq(a: &Logger, b: &Logger) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Address of the shared state, stable for the logger's lifetime.
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("path", &self.inner.path)
            .field("derivation", &self.derivation())
            .field("level", &self.level())
            .field("fields", &self.inner.fields)
            .finish()
    }
}
