// Persistence adapter - durable string keys mapped to JSON values
// Survives restarts when backed by SQLite; the in-memory store is for tests and `--no-persist` runs

#[cfg(feature = "persist")]
pub mod sqlite;

#[cfg(feature = "persist")]
pub use sqlite::SqliteStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::error::StoreError;

pub const FAVORITES_KEY: &str = "favorites";
pub const RECENTLY_VIEWED_KEY: &str = "recentlyViewed";
pub const THEME_KEY: &str = "theme";
pub const DISCS_KEY: &str = "discs";

/// Raw key/value access. Values are JSON text.
pub trait KeyValueStore: Send + Sync {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Typed JSON helpers on top of any `KeyValueStore`
pub trait JsonStoreExt {
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError>;
    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> JsonStoreExt for S {
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get_raw(key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)?;
        self.set_raw(key, &json)
    }
}

/// SQLite at `database_path` when persistence is wanted (and compiled in),
/// otherwise a throwaway in-memory store
pub fn open_store(database_path: &Path, persist: bool) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    #[cfg(feature = "persist")]
    if persist {
        info!("Opening ledger database at {}", database_path.display());
        if let Some(parent) = database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        return Ok(Arc::new(SqliteStore::new(database_path)?));
    }

    info!(
        "Persistence disabled (requested: {}); {} will not be touched",
        persist,
        database_path.display()
    );
    Ok(Arc::new(MemoryStore::new()))
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
