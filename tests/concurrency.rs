//! Emitting, deriving and reloading from many threads at once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use app_context::logging::{Fields, Level, LoggerRegistry, RegistryOptions};
use app_context::{fields, ConfigNode};

mod common;

const THREADS: usize = 8;
const EMITS: usize = 200;

fn config(level: &str, format: &str) -> ConfigNode {
    ConfigNode::from_toml(&format!(
        "[root]\nlevel = \"{level}\"\nformat = \"{format}\"\nwriter = \"memory\"\ndisable_timestamp = true\n"
    ))
    .unwrap()
}

#[test]
fn test_no_entry_lost_or_torn_during_reloads() {
    let (plugins, writer) = common::memory_plugins();
    let options = RegistryOptions {
        plugins,
        ..Default::default()
    };
    let registry = LoggerRegistry::with_options(&config("info", "json"), Fields::new(), options);
    let done = AtomicUsize::new(0);

    thread::scope(|scope| {
        for t in 0..THREADS {
            let registry = registry.clone();
            let done = &done;
            scope.spawn(move || {
                let logger = registry.root().new(&format!("worker{t}"), fields! { "thread" => t });
                for i in 0..EMITS {
                    logger.emit(Level::Info, "tick", fields! { "i" => i });
                }
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        scope.spawn(|| {
            let mut flip = false;
            while done.load(Ordering::SeqCst) < THREADS {
                let format = if flip { "json" } else { "text" };
                let level = if flip { "debug" } else { "info" };
                registry.reload(&config(level, format));
                flip = !flip;
            }
        });
    });

    let lines = writer.lines();
    assert_eq!(lines.len(), THREADS * EMITS);
    for line in &lines {
        let whole_json = line.starts_with('{') && serde_json::from_str::<serde_json::Value>(line).is_ok();
        let whole_text = line.starts_with("level=info logger=root.worker");
        assert!(whole_json || whole_text, "torn line: {line}");
    }
    assert_eq!(registry.len(), THREADS + 1);
}

#[test]
fn test_concurrent_derivation_yields_one_logger_per_path() {
    let registry = LoggerRegistry::new(&ConfigNode::new(), Fields::new());
    let created: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let registry = registry.clone();
                scope.spawn(move || registry.root().new("shared", Fields::new()))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(registry.len(), 2);
    for logger in &created[1..] {
        assert!(app_context::Logger::ptr_eq(&created[0], logger));
    }
}
