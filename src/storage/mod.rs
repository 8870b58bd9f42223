pub mod json_store;
pub mod memory_store;

use std::path::PathBuf;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use json_store::JsonFileStore;
use memory_store::MemoryStore;

/// Durable string storage for saved parameter bundles.
pub trait KeyValueStore {
    /// Stored text for `key`, or `None` if missing or unreadable.
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Forget `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Directory backing the store, if it lives on disk.
    fn location(&self) -> Option<PathBuf> {
        None
    }
}

/// Load `key`, shallow-merging the stored object's top-level fields over
/// `fallback`. Anything unreadable yields `fallback` unchanged.
pub fn load<T>(store: &dyn KeyValueStore, key: &str, fallback: T) -> T
where
    T: Serialize + DeserializeOwned,
{
    let Some(raw) = store.get(key) else {
        return fallback;
    };

    let stored = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            tracing::warn!(key, "stored bundle is not a JSON object, using defaults");
            return fallback;
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "stored bundle is not valid JSON, using defaults");
            return fallback;
        }
    };

    let mut merged = match serde_json::to_value(&fallback) {
        Ok(Value::Object(map)) => map,
        _ => return fallback,
    };
    for (field, value) in stored {
        merged.insert(field, value);
    }

    match serde_json::from_value(Value::Object(merged)) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "stored bundle does not match, using defaults");
            fallback
        }
    }
}

/// Serialize and store `value`. Failures are logged, never returned.
/// Returns whether the write succeeded.
pub fn save<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> bool {
    let data = match serde_json::to_string_pretty(value) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to serialize bundle");
            return false;
        }
    };
    match store.set(key, &data) {
        Ok(()) => {
            tracing::info!(key, "saved bundle");
            true
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to save bundle");
            false
        }
    }
}

/// File-backed store under `dir`, or the platform data directory. Falls back
/// to an in-memory store when neither is available.
pub fn default_store(dir: Option<PathBuf>) -> Box<dyn KeyValueStore> {
    match dir.or_else(json_store::default_dir) {
        Some(dir) => Box::new(JsonFileStore::new(dir)),
        None => {
            tracing::warn!("no data directory available, defaults will not persist");
            Box::new(MemoryStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Defaults {
        seats: f64,
        days: f64,
        label: String,
    }

    fn fallback() -> Defaults {
        Defaults {
            seats: 100.0,
            days: 22.0,
            label: "base".into(),
        }
    }

    #[test]
    fn missing_key_returns_fallback() {
        let store = MemoryStore::new();
        assert_eq!(load(&store, "seat-token", fallback()), fallback());
    }

    #[test]
    fn round_trip() {
        let mut store = MemoryStore::new();
        let saved = Defaults {
            seats: 7.0,
            days: 30.0,
            label: "saved".into(),
        };
        assert!(save(&mut store, "k", &saved));
        assert_eq!(load(&store, "k", fallback()), saved);
    }

    #[test]
    fn stored_fields_merge_over_fallback() {
        let mut store = MemoryStore::new();
        store.set("k", r#"{"seats": 12, "unknown": true}"#).unwrap();
        let loaded = load(&store, "k", fallback());
        assert_eq!(
            loaded,
            Defaults {
                seats: 12.0,
                ..fallback()
            }
        );
    }

    #[test]
    fn corrupt_data_returns_fallback() {
        let mut store = MemoryStore::new();
        for bad in ["{not json", "[1, 2, 3]", r#"{"seats": "many"}"#, "null"] {
            store.set("k", bad).unwrap();
            assert_eq!(load(&store, "k", fallback()), fallback(), "data {bad}");
        }
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            anyhow::bail!("quota exceeded")
        }

        fn remove(&mut self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_save_is_swallowed() {
        let mut store = BrokenStore;
        assert!(!save(&mut store, "k", &fallback()));
        assert_eq!(load(&store, "k", fallback()), fallback());
    }

    #[test]
    fn default_store_uses_given_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = default_store(Some(dir.path().to_path_buf()));
        assert_eq!(store.location(), Some(dir.path().to_path_buf()));
    }
}
