//! End-to-end behaviour of the configured logger tree.

use std::sync::Arc;

use app_context::logging::{Derivation, Fields, Level, LoggerRegistry, RegistryOptions};
use app_context::{fields, ConfigNode, Logger, Plugins};

mod common;

const TREE: &str = r#"
[logging.root]
level = "debug"
format = "json"
writer = "memory"
disable_timestamp = true
hooks = [{ name = "a" }, { name = "b", target = "parent" }]

[logging.root.child1]
level = "warn"
name = "FirstChild"
hooks = [{ name = "B", target = "child" }, { name = "c" }]

[logging.alerts]
level = "error"
writer = "memory"
format = "text"
disable_timestamp = true
"#;

fn registry(plugins: Arc<Plugins>) -> LoggerRegistry {
    let cfg = ConfigNode::from_toml(TREE).unwrap();
    let options = RegistryOptions {
        plugins,
        ..Default::default()
    };
    LoggerRegistry::with_options(&cfg, fields! { "app" => "tree" }, options)
}

#[test]
fn test_root_exists_for_any_config() {
    for src in ["", "level = \"warn\"", "[logging]", "[other]\nkey = 1"] {
        let cfg = ConfigNode::from_toml(src).unwrap();
        let registry = LoggerRegistry::new(&cfg, Fields::new());
        let root = registry.root();
        assert_eq!(root.path(), "root", "config {src:?}");
        assert!(registry.get("root").is_some());
    }
}

#[test]
fn test_preregistered_top_level_loggers() {
    let (plugins, _writer) = common::memory_plugins();
    let registry = registry(plugins);
    assert_eq!(registry.paths(), vec!["alerts", "root"]);
    assert!(registry.get("Alerts").unwrap().is_owned());
    assert_eq!(registry.root().fields(), &fields! { "app" => "tree", "module" => "root" });
}

#[test]
fn test_merge_inherits_and_overrides() {
    let (plugins, writer) = common::memory_plugins();
    let registry = registry(plugins);
    let child1 = registry.root().new("child1", Fields::new());

    assert_eq!(child1.level(), Level::Warn);
    assert_eq!(child1.settings().formatter().name(), "json");
    assert_eq!(child1.settings().writer().name(), "memory");

    child1.info("filtered");
    child1.warn("kept");
    let lines = writer.lines();
    assert_eq!(lines.len(), 1);
    let entry: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(entry["msg"], "kept");
    assert_eq!(entry["logger"], "root.child1");
    assert_eq!(entry["module"], "FirstChild");
    assert_eq!(entry["app"], "tree");
}

#[test]
fn test_hooks_are_additive_down_the_tree() {
    let (plugins, _writer) = common::memory_plugins();
    let fired = common::register_recording_hooks(&plugins, &["a", "b", "c"]);
    let registry = registry(plugins);

    let child1 = registry.root().new("child1", Fields::new());
    child1.error("boom");
    assert_eq!(*fired.lock(), vec!["b:child", "c:-", "a:-"]);

    fired.lock().clear();
    registry.root().info("root only");
    assert_eq!(*fired.lock(), vec!["a:-", "b:parent"]);
}

#[test]
fn test_children_are_cached_by_path() {
    let (plugins, _writer) = common::memory_plugins();
    let registry = registry(plugins);
    let root = registry.root();
    let before = registry.len();

    let a = root.new("Jobs", fields! { "queue" => "default" });
    let b = root.new("jobs", Fields::new());
    assert!(Logger::ptr_eq(&a, &b));
    assert_eq!(registry.len(), before + 1);

    let nested = a.new("retry", Fields::new());
    assert_eq!(nested.path(), "root.jobs.retry");
    assert_eq!(nested.fields()["queue"], "default");
    assert_eq!(registry.len(), before + 2);
}

#[test]
fn test_unconfigured_paths_fall_back_to_nearest_ancestor() {
    let (plugins, _writer) = common::memory_plugins();
    let registry = registry(plugins);
    let root = registry.root();
    let child1 = root.new("child1", Fields::new());

    let grandchild = child1.new("grandchild", Fields::new());
    assert_eq!(grandchild.derivation(), Derivation::Shared { owner: "root.child1".into() });
    assert!(ConfigNode::ptr_eq(&grandchild.config(), &child1.config()));
    assert_eq!(grandchild.level(), Level::Warn);

    let unrelated = root.new("unrelated", Fields::new());
    assert!(unrelated.shares_emitter_with(&root));
    assert!(ConfigNode::ptr_eq(&unrelated.config(), &root.config()));
}

#[test]
fn test_reload_reaches_shared_children_through_owner() {
    let (plugins, _writer) = common::memory_plugins();
    let registry = registry(plugins);
    let root = registry.root();
    let worker = root.new("worker", Fields::new());
    assert_eq!(worker.level(), Level::Debug);

    let updated = TREE.replacen("level = \"debug\"", "level = \"error\"", 1);
    registry.reload(&ConfigNode::from_toml(&updated).unwrap());

    assert_eq!(root.level(), Level::Error);
    assert_eq!(worker.level(), Level::Error);
    assert!(Logger::ptr_eq(&registry.get("root.worker").unwrap(), &worker));
    assert_eq!(registry.root().new("child1", Fields::new()).level(), Level::Warn);
}

#[test]
fn test_reload_twice_is_stable() {
    let (plugins, _writer) = common::memory_plugins();
    let registry = registry(plugins);
    let root = registry.root();
    root.new("child1", Fields::new());
    root.new("worker", Fields::new());

    let cfg = ConfigNode::from_toml(TREE).unwrap();
    let describe = |registry: &LoggerRegistry| -> Vec<String> {
        registry
            .paths()
            .iter()
            .map(|path| {
                let s = registry.get(path).unwrap().settings();
                format!("{path} {} {} {}", s.level(), s.formatter().name(), s.writer().name())
            })
            .collect()
    };

    registry.reload(&cfg);
    let once = describe(&registry);
    registry.reload(&cfg);
    assert_eq!(describe(&registry), once);
    assert_eq!(
        once,
        vec![
            "alerts error text memory",
            "root debug json memory",
            "root.child1 warn json memory",
            "root.worker debug json memory",
        ]
    );
}

#[test]
fn test_plugin_override_waits_for_reconfiguration() {
    let (plugins, writer) = common::memory_plugins();
    let registry = registry(Arc::clone(&plugins));
    let alerts = registry.get("alerts").unwrap();

    plugins.register_formatter("text", |_| app_context::logging::JsonFormatter {
        disable_timestamp: true,
    });
    alerts.error("still text");
    assert!(writer.lines()[0].starts_with("level=error"));

    registry.reload(&ConfigNode::from_toml(TREE).unwrap());
    writer.clear();
    alerts.error("now json");
    let entry: serde_json::Value = serde_json::from_str(&writer.lines()[0]).unwrap();
    assert_eq!(entry["msg"], "now json");
}

#[test]
fn test_fatal_and_panic_do_not_abort() {
    let (plugins, writer) = common::memory_plugins();
    let registry = registry(plugins);
    let alerts = registry.get("alerts").unwrap();
    alerts.fatal("still here");
    alerts.panic("and here");
    assert_eq!(writer.lines().len(), 2);
}
