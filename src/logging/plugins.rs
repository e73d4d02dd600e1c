//! Name-indexed plugin registries for formatters, writers and hooks.
//!
//! # Design Decisions
//! - Names are case-insensitive; the last registration for a name wins
//! - Registration never fails
//! - Factories run outside the map guard, so a factory may itself register
//!   plugins
//! - One `Plugins` value is constructed at startup and shared by the logger
//!   registry; there is no process-global registry

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ConfigNode;
use crate::logging::formatter::{Formatter, JsonFormatter, TextFormatter};
use crate::logging::hook::{hook_descriptors, hook_name, Hook};
use crate::logging::writer::{DiscardWriter, LogWriter, StderrWriter, StdoutWriter};

/// Builds a plugin from a configuration fragment.
pub type Factory<T> = Arc<dyn Fn(&ConfigNode) -> T + Send + Sync>;

/// A case-insensitive name → factory map.
pub struct PluginRegistry<T> {
    kind: &'static str,
    factories: DashMap<String, Factory<T>>,
}

impl<T> PluginRegistry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            factories: DashMap::new(),
        }
    }

    /// Store `factory` under the lowercased `name`, replacing any previous one.
    pub fn register<F>(&self, name: &str, factory: F)
    where
        F: Fn(&ConfigNode) -> T + Send + Sync + 'static,
    {
        let key = name.to_lowercase();
        tracing::debug!(kind = self.kind, name = %key, "registering plugin");
        self.factories.insert(key, Arc::new(factory));
    }

    /// Build the plugin registered under `name`, if any.
    pub fn build(&self, name: &str, cfg: &ConfigNode) -> Option<T> {
        let factory = self
            .factories
            .get(&name.to_lowercase())
            .map(|entry| Arc::clone(entry.value()))?;
        Some(factory(cfg))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    /// Registered names, sorted.
    pub fn known_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl<T> fmt::Debug for PluginRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("kind", &self.kind)
            .field("names", &self.known_names())
            .finish()
    }
}

pub type FormatterRegistry = PluginRegistry<Arc<dyn Formatter>>;
pub type WriterRegistry = PluginRegistry<Arc<dyn LogWriter>>;
pub type HookRegistry = PluginRegistry<Arc<dyn Hook>>;

/// The formatter, writer and hook registries used to build loggers.
#[derive(Debug)]
pub struct Plugins {
    formatters: FormatterRegistry,
    writers: WriterRegistry,
    hooks: HookRegistry,
}

impl Plugins {
    /// Registries pre-loaded with the built-in formatters and writers.
    pub fn new() -> Self {
        let plugins = Self::empty();

        plugins.register_formatter("json", JsonFormatter::from_config);
        plugins.register_formatter("text", TextFormatter::from_config);

        plugins.register_writer("stdout", |_| StdoutWriter);
        plugins.register_writer("stderr", |_| StderrWriter);
        plugins.register_writer("discard", |_| DiscardWriter);

        plugins
    }

    /// Registries without any built-ins.
    pub fn empty() -> Self {
        Self {
            formatters: PluginRegistry::new("formatter"),
            writers: PluginRegistry::new("writer"),
            hooks: PluginRegistry::new("hook"),
        }
    }

    pub fn formatters(&self) -> &FormatterRegistry {
        &self.formatters
    }

    pub fn writers(&self) -> &WriterRegistry {
        &self.writers
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn register_formatter<F, T>(&self, name: &str, factory: F)
    where
        F: Fn(&ConfigNode) -> T + Send + Sync + 'static,
        T: Formatter + 'static,
    {
        self.formatters
            .register(name, move |cfg| Arc::new(factory(cfg)) as Arc<dyn Formatter>);
    }

    pub fn register_writer<F, T>(&self, name: &str, factory: F)
    where
        F: Fn(&ConfigNode) -> T + Send + Sync + 'static,
        T: LogWriter + 'static,
    {
        self.writers
            .register(name, move |cfg| Arc::new(factory(cfg)) as Arc<dyn LogWriter>);
    }

    pub fn register_hook<F, T>(&self, name: &str, factory: F)
    where
        F: Fn(&ConfigNode) -> T + Send + Sync + 'static,
        T: Hook + 'static,
    {
        self.hooks
            .register(name, move |cfg| Arc::new(factory(cfg)) as Arc<dyn Hook>);
    }

    /// Resolve a formatter; empty or unknown names give the text formatter.
    /// The flag reports whether `name` was found.
    pub fn resolve_formatter(&self, name: &str, cfg: &ConfigNode) -> (Arc<dyn Formatter>, bool) {
        match self.formatters.build(name, cfg) {
            Some(formatter) => (formatter, true),
            None => {
                if !name.is_empty() {
                    tracing::debug!(formatter = %name, "unknown formatter, falling back to default");
                }
                (Arc::new(TextFormatter::from_config(cfg)), false)
            }
        }
    }

    /// Resolve a writer; empty or unknown names give standard error.
    pub fn resolve_writer(&self, name: &str, cfg: &ConfigNode) -> (Arc<dyn LogWriter>, bool) {
        match self.writers.build(name, cfg) {
            Some(writer) => (writer, true),
            None => {
                if !name.is_empty() {
                    tracing::debug!(writer = %name, "unknown writer, falling back to stderr");
                }
                (Arc::new(StderrWriter), false)
            }
        }
    }

    /// Resolve a hook; unknown names give no hook at all.
    pub fn resolve_hook(&self, name: &str, cfg: &ConfigNode) -> Option<Arc<dyn Hook>> {
        let hook = self.hooks.build(name, cfg);
        if hook.is_none() {
            tracing::debug!(hook = %name, "unknown hook, skipping");
        }
        hook
    }

    /// Build every hook described under the `hooks` key of `cfg`, in order.
    /// Each factory receives its own descriptor.
    pub fn build_hooks(&self, cfg: &ConfigNode) -> Vec<Arc<dyn Hook>> {
        hook_descriptors(cfg)
            .iter()
            .filter_map(|descriptor| {
                let name = hook_name(descriptor)?;
                self.resolve_hook(&name, descriptor)
            })
            .collect()
    }
}

impl Default for Plugins {
    fn default() -> Self {
        Self::new()
    }
}
