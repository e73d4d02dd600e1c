//! The logger tree.
//!
//! # Data Flow
//! ```text
//! ConfigNode ──► LoggerRegistry::new ──► one owned logger per top-level subtree
//!                                        + the root logger
//! Logger::new(child) ──► RegistryShared::derive ──► cache hit, or
//!                                                   owned (dedicated subtree) /
//!                                                   shared (parent's emitter)
//! ConfigNode ──► LoggerRegistry::reload ──► per cached logger, parents first:
//!                                            configure (still owned)
//!                                            promote   (gained a subtree)
//!                                            follow    (shared, or lost its subtree)
//! ```
//!
//! # Design Decisions
//! - One mutex guards the stored config and the path → logger cache; it is
//!   held for child creation and for the whole reload sweep, never by emit
//! - Every emitter is built or configured once per reload; shared loggers
//!   are rebound to their nearest ancestor's emitter
//! - When the root has no subtree of its own, the flat node stands in for
//!   it, so `root.<child>` resolves against top-level keys
//! - Plugin factories run while the registry lock is held, so they must not
//!   derive loggers themselves

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Weak};

use crate::config::ConfigNode;
use crate::logging::entry::Fields;
use crate::logging::logger::Logger;
use crate::logging::merge::{self, add_logging_defaults, find_effective_config, logger_keys, Resolved};
use crate::logging::plugins::Plugins;

/// Name of the root logger unless configured otherwise.
pub const DEFAULT_ROOT_NAME: &str = "root";

/// Top-level key that, when present, holds the logger tree.
pub const LOGGING_KEY: &str = "logging";

/// Construction options for [`LoggerRegistry`].
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub root_name: String,
    pub plugins: Arc<Plugins>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            plugins: Arc::new(Plugins::new()),
        }
    }
}

/// Owns every named logger and keeps them in sync with the configuration.
///
/// Clones share the same tree.
#[derive(Clone)]
pub struct LoggerRegistry {
    shared: Arc<RegistryShared>,
}

pub(crate) struct RegistryShared {
    root_name: String,
    root_fields: Fields,
    plugins: Arc<Plugins>,
    state: Mutex<RegistryState>,
}

struct RegistryState {
    config: ConfigNode,
    loggers: HashMap<String, Logger>,
    root: Logger,
}

impl LoggerRegistry {
    /// Build the tree with the default root name and built-in plugins.
    pub fn new(cfg: &ConfigNode, root_fields: Fields) -> Self {
        Self::with_options(cfg, root_fields, RegistryOptions::default())
    }

    pub fn with_options(cfg: &ConfigNode, root_fields: Fields, options: RegistryOptions) -> Self {
        let cfg = logging_tree(cfg);
        let root_name = options.root_name.to_lowercase();

        let shared = Arc::new_cyclic(|weak: &Weak<RegistryShared>| {
            let mut loggers = HashMap::new();
            for key in logger_keys(&cfg) {
                if let Some(logger) = build_top_level(&key, &cfg, &root_fields, &options.plugins, weak) {
                    loggers.insert(key, logger);
                }
            }

            let root = match loggers.get(&root_name) {
                Some(root) => root.clone(),
                None => {
                    let mut fields = root_fields.clone();
                    fields.insert("module".into(), Value::String(root_name.clone()));
                    let root = Logger::owned(
                        &root_name,
                        &root_name,
                        fields,
                        &flat_root(&cfg),
                        Arc::clone(&options.plugins),
                        weak.clone(),
                    );
                    loggers.insert(root_name.clone(), root.clone());
                    root
                }
            };

            tracing::debug!(root = %root_name, loggers = loggers.len(), "logger tree built");

            RegistryShared {
                root_name: root_name.clone(),
                root_fields: root_fields.clone(),
                plugins: Arc::clone(&options.plugins),
                state: Mutex::new(RegistryState {
                    config: cfg.clone(),
                    loggers,
                    root,
                }),
            }
        });

        Self { shared }
    }

    /// Case-insensitive lookup of a cached logger.
    pub fn get(&self, path: &str) -> Option<Logger> {
        self.shared.state.lock().loggers.get(&path.to_lowercase()).cloned()
    }

    pub fn root(&self) -> Logger {
        self.shared.state.lock().root.clone()
    }

    pub fn root_name(&self) -> &str {
        &self.shared.root_name
    }

    /// Insert or replace the logger cached under `path`.
    pub fn register(&self, path: &str, logger: Logger) {
        let path = path.to_lowercase();
        let mut state = self.shared.state.lock();
        if path == self.shared.root_name {
            state.root = logger.clone();
        }
        state.loggers.insert(path, logger);
    }

    /// Apply a new configuration snapshot to the whole tree in place.
    ///
    /// Every cached logger is resolved again against `cfg`, parents before
    /// children. A logger with a dedicated subtree (or any top-level logger)
    /// gets its emitter reconfigured, or a fresh one if it was shared until
    /// now. Any other logger shares its nearest cached ancestor's emitter.
    /// Top-level subtrees that are new in `cfg` get loggers.
    pub fn reload(&self, cfg: &ConfigNode) {
        let cfg = logging_tree(cfg);
        let shared = &self.shared;
        let mut guard = shared.state.lock();
        let state = &mut *guard;
        state.config = cfg.clone();

        let root_fallback = resolve(&shared.root_name, &cfg, &shared.root_name)
            .map(|resolved| resolved.config)
            .unwrap_or_else(|| flat_root(&cfg));

        let mut paths: Vec<String> = state.loggers.keys().cloned().collect();
        paths.sort_by(|a, b| depth(a).cmp(&depth(b)).then_with(|| a.cmp(b)));

        let mut seen = HashSet::new();
        let (mut configured, mut promoted, mut demoted) = (0, 0, 0);
        for path in &paths {
            let Some(logger) = state.loggers.get(path).cloned() else {
                continue;
            };
            if !seen.insert(logger.id()) {
                continue;
            }

            let top_level = depth(path) == 0;
            let own_config = match resolve(path, &cfg, &shared.root_name) {
                Some(resolved) if top_level || resolved.is_exact(path) => Some(resolved.config),
                None if top_level => {
                    tracing::debug!(logger = %path, "no configuration for logger, using root");
                    Some(root_fallback.clone())
                }
                _ => None,
            };

            match own_config {
                Some(config) if logger.is_owned() => {
                    logger.configure(&config);
                    configured += 1;
                }
                Some(config) => {
                    logger.promote(&config);
                    configured += 1;
                    promoted += 1;
                }
                None => {
                    if logger.is_owned() {
                        demoted += 1;
                    }
                    let owner = nearest_ancestor(&state.loggers, path).unwrap_or_else(|| state.root.clone());
                    logger.follow(&owner);
                }
            }
        }

        let weak = Arc::downgrade(shared);
        for key in logger_keys(&cfg) {
            if state.loggers.contains_key(&key) {
                continue;
            }
            if let Some(logger) = build_top_level(&key, &cfg, &shared.root_fields, &shared.plugins, &weak) {
                state.loggers.insert(key, logger);
                configured += 1;
            }
        }

        tracing::info!(
            configured,
            promoted,
            demoted,
            loggers = state.loggers.len(),
            "logger tree reloaded"
        );
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached logger paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.shared.state.lock().loggers.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// The logger tree configuration currently in effect.
    pub fn config(&self) -> ConfigNode {
        self.shared.state.lock().config.clone()
    }

    pub fn plugins(&self) -> &Arc<Plugins> {
        &self.shared.plugins
    }
}

impl fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("root_name", &self.shared.root_name)
            .field("paths", &self.paths())
            .finish()
    }
}

impl RegistryShared {
    /// Return the cached logger at `path`, or create it as a child of `parent`.
    pub(crate) fn derive(self: &Arc<Self>, parent: &Logger, name: &str, path: &str, mut fields: Fields) -> Logger {
        let mut state = self.state.lock();
        if let Some(existing) = state.loggers.get(path) {
            return existing.clone();
        }

        let dedicated = resolve(path, &state.config, &self.root_name).filter(|resolved| resolved.is_exact(path));
        let logger = match dedicated {
            Some(resolved) => {
                let display = resolved.config.get_str(merge::NAME).unwrap_or(name).to_string();
                fields.insert("module".into(), Value::String(display));
                Logger::owned(
                    name,
                    path,
                    fields,
                    &resolved.config,
                    Arc::clone(&self.plugins),
                    Arc::downgrade(self),
                )
            }
            None => {
                fields.insert("module".into(), Value::String(name.to_string()));
                Logger::shared(parent, name, path, fields)
            }
        };

        tracing::debug!(logger = %path, owner = %logger.owner(), "derived logger");
        state.loggers.insert(path.to_string(), logger.clone());
        logger
    }
}

/// The logger tree inside a snapshot: its `logging` table when present,
/// otherwise the snapshot itself.
fn logging_tree(cfg: &ConfigNode) -> ConfigNode {
    cfg.sub(LOGGING_KEY).unwrap_or_else(|| cfg.clone())
}

/// Root configuration when no subtree is dedicated to the root logger.
fn flat_root(cfg: &ConfigNode) -> ConfigNode {
    let mut node = cfg.clone();
    add_logging_defaults(&mut node);
    node
}

/// Effective configuration for `path`. Paths under the root resolve against
/// the flat node when `cfg` has no `root_name` subtree.
fn resolve(path: &str, cfg: &ConfigNode, root_name: &str) -> Option<Resolved> {
    let under_root = path
        .strip_prefix(root_name)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'));
    if under_root && cfg.sub(root_name).is_none() {
        let mut tree = ConfigNode::new();
        tree.set(root_name, flat_root(cfg).to_value());
        return find_effective_config(path, &tree);
    }
    find_effective_config(path, cfg)
}

fn depth(path: &str) -> usize {
    path.matches('.').count()
}

/// The closest cached logger above `path`.
fn nearest_ancestor(loggers: &HashMap<String, Logger>, path: &str) -> Option<Logger> {
    let mut current = path;
    while let Some((parent, _)) = current.rsplit_once('.') {
        if let Some(logger) = loggers.get(parent) {
            return Some(logger.clone());
        }
        current = parent;
    }
    None
}

fn build_top_level(
    key: &str,
    cfg: &ConfigNode,
    root_fields: &Fields,
    plugins: &Arc<Plugins>,
    registry: &Weak<RegistryShared>,
) -> Option<Logger> {
    let resolved = find_effective_config(key, cfg)?;
    let display = resolved.config.get_str(merge::NAME).unwrap_or(key).to_string();
    let mut fields = root_fields.clone();
    fields.insert("module".into(), Value::String(display));
    Some(Logger::owned(
        key,
        key,
        fields,
        &resolved.config,
        Arc::clone(plugins),
        registry.clone(),
    ))
}
