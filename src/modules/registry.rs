//! Type-checked, name-indexed service container.

use parking_lot::Mutex;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ModuleError;

struct Slot {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// Shared instances keyed by name.
///
/// Values are stored behind an `Arc`; `get` clones the value out, while
/// `get_shared` hands back the shared instance itself.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Mutex<HashMap<String, Slot>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `instance` under `key`, replacing any previous value.
    pub fn set<T>(&self, key: &str, instance: T)
    where
        T: Any + Send + Sync,
    {
        self.set_shared(key, Arc::new(instance));
    }

    /// Store an already shared instance under `key`.
    pub fn set_shared<T>(&self, key: &str, instance: Arc<T>)
    where
        T: Any + Send + Sync,
    {
        let slot = Slot {
            value: instance,
            type_name: type_name::<T>(),
        };
        if self.modules.lock().insert(key.to_string(), slot).is_some() {
            tracing::debug!(module = %key, "replaced module");
        }
    }

    /// A clone of the value stored under `key`.
    pub fn get<T>(&self, key: &str) -> Result<T, ModuleError>
    where
        T: Any + Send + Sync + Clone,
    {
        self.get_shared::<T>(key).map(|value| T::clone(&value))
    }

    /// The shared instance stored under `key`.
    pub fn get_shared<T>(&self, key: &str) -> Result<Arc<T>, ModuleError>
    where
        T: Any + Send + Sync,
    {
        let (value, actual) = {
            let modules = self.modules.lock();
            let slot = modules
                .get(key)
                .ok_or_else(|| ModuleError::Unknown(key.to_string()))?;
            (Arc::clone(&slot.value), slot.type_name)
        };

        value.downcast::<T>().map_err(|_| ModuleError::TypeMismatch {
            key: key.to_string(),
            expected: type_name::<T>(),
            actual,
        })
    }

    /// Copy the value stored under `key` into `out`.
    ///
    /// `out` is left untouched on error.
    pub fn get_into<T>(&self, key: &str, out: &mut T) -> Result<(), ModuleError>
    where
        T: Any + Send + Sync + Clone,
    {
        *out = self.get(key)?;
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.modules.lock().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> bool {
        self.modules.lock().remove(key).is_some()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.modules.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.modules.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.lock().is_empty()
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modules = self.modules.lock();
        let mut entries: Vec<(&String, &'static str)> =
            modules.iter().map(|(key, slot)| (key, slot.type_name)).collect();
        entries.sort();
        f.debug_map().entries(entries).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Database {
        url: String,
        pool: u32,
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Cache {
        ttl: u64,
    }

    #[test]
    fn test_set_then_get() {
        let modules = ModuleRegistry::new();
        let db = Database {
            url: "postgres://localhost".into(),
            pool: 4,
        };
        modules.set("db", db.clone());

        assert_eq!(modules.get::<Database>("db"), Ok(db.clone()));

        let mut out = Database::default();
        modules.get_into("db", &mut out).unwrap();
        assert_eq!(out, db);
    }

    #[test]
    fn test_unknown_key() {
        let modules = ModuleRegistry::new();
        assert_eq!(
            modules.get::<Database>("db"),
            Err(ModuleError::Unknown("db".into()))
        );
    }

    #[test]
    fn test_type_mismatch_leaves_target_untouched() {
        let modules = ModuleRegistry::new();
        modules.set("db", Database::default());

        let mut out = Cache { ttl: 30 };
        let err = modules.get_into("db", &mut out).unwrap_err();
        match err {
            ModuleError::TypeMismatch { key, expected, actual } => {
                assert_eq!(key, "db");
                assert!(expected.ends_with("Cache"));
                assert!(actual.ends_with("Database"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(out, Cache { ttl: 30 });
    }

    #[test]
    fn test_shared_instance_identity() {
        let modules = ModuleRegistry::new();
        let cache = Arc::new(Cache { ttl: 60 });
        modules.set_shared("cache", Arc::clone(&cache));

        let fetched = modules.get_shared::<Cache>("cache").unwrap();
        assert!(Arc::ptr_eq(&cache, &fetched));
    }

    #[test]
    fn test_set_replaces() {
        let modules = ModuleRegistry::new();
        modules.set("n", 1u32);
        modules.set("n", "now a string".to_string());
        assert_eq!(modules.len(), 1);
        assert_eq!(modules.get::<String>("n").unwrap(), "now a string");
        assert!(modules.get::<u32>("n").is_err());
    }

    #[test]
    fn test_keys_sorted() {
        let modules = ModuleRegistry::new();
        modules.set("b", 2u8);
        modules.set("a", 1u8);
        assert_eq!(modules.keys(), vec!["a", "b"]);
        assert!(modules.contains("a"));
        assert!(modules.remove("a"));
        assert!(!modules.contains("a"));
    }
}
