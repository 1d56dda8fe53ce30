//! Persistence gateway: durable string key-value storage.
//!
//! Durability is best-effort by contract. Failures (missing directory,
//! quota, corrupt data) never cross this boundary: callers observe an
//! absent value and the incident is logged.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Keys shared across the storefront domains. One writer per key.
pub mod keys {
    pub const CART: &str = "pinabakes_cart";
    pub const WISHLIST: &str = "pinabakes_wishlist";
    pub const USER: &str = "pinabakes_user";
    pub const SESSION: &str = "pinabakes_session";
    pub const ORDERS: &str = "pinabakes_orders";
    pub const COUPON: &str = "pinabakes_coupon";
}

pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// One file per key under the data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // keys are fixed constants today; keep the guard for host-supplied ones
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "storage read failed");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        let path = self.path_for(key);
        let result = fs::create_dir_all(&self.dir).and_then(|()| fs::write(&path, value));
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "storage write failed");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(e) = fs::remove_file(self.path_for(key)) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(key, error = %e, "storage remove failed");
            }
        }
    }
}

/// In-memory store for tests and storage-disabled environments.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Read and parse a persisted value. Corrupt data is logged and treated as
/// absent so it can never block boot.
pub fn load_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding corrupt persisted value");
            None
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(store: &dyn KvStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => store.set(key, &raw),
        Err(e) => tracing::warn!(key, error = %e, "failed to serialize value for storage"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_corrupt_value_reads_as_absent() {
        let store = MemoryStore::new();
        store.set(keys::CART, "{definitely not json");
        let lines: Option<Vec<u32>> = load_json(&store, keys::CART);
        assert!(lines.is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("pinabakes-store-{}", uuid::Uuid::now_v7()));
        let store = FileStore::new(&dir);
        assert_eq!(store.get(keys::CART), None);

        save_json(&store, keys::CART, &vec![1u32, 2, 3]);
        let restored: Option<Vec<u32>> = load_json(&store, keys::CART);
        assert_eq!(restored, Some(vec![1, 2, 3]));

        store.remove(keys::CART);
        assert_eq!(store.get(keys::CART), None);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_hostile_key_stays_inside_the_data_dir() {
        let dir = std::env::temp_dir().join(format!("pinabakes-keys-{}", uuid::Uuid::now_v7()));
        let store = FileStore::new(&dir);
        store.set("../escape", "v");
        assert_eq!(store.get("../escape").as_deref(), Some("v"));
        assert!(dir.join("___escape.json").exists());
        fs::remove_dir_all(&dir).ok();
    }
}
