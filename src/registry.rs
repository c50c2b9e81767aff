//! Name and storage-key bookkeeping shared by stores.

use crate::error::{Result, StoreError};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};

static GLOBAL: OnceLock<Arc<StoreRegistry>> = OnceLock::new();

#[derive(Default)]
struct Entries {
    names: BTreeSet<String>,
    /// storage key -> owning store name
    storage_keys: HashMap<String, String>,
}

/// Set of live store names and storage keys.
///
/// Stores register on construction and unregister on destroy or drop. Tests
/// can inject their own registry through `StoreConfig::registry` to avoid
/// clashing with other stores in the process.
#[derive(Default)]
pub struct StoreRegistry {
    entries: Mutex<Entries>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Arc<StoreRegistry> {
        GLOBAL.get_or_init(|| Arc::new(StoreRegistry::new())).clone()
    }

    /// Claim `name` and, if given, `storage_key`. Nothing is claimed on error.
    pub fn register(&self, name: &str, storage_key: Option<&str>) -> Result<()> {
        let mut entries = self.entries.lock();
        if entries.names.contains(name) {
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        if let Some(key) = storage_key {
            if entries.storage_keys.contains_key(key) {
                return Err(StoreError::DuplicateStorageKey {
                    key: key.to_string(),
                    store: name.to_string(),
                });
            }
            entries.storage_keys.insert(key.to_string(), name.to_string());
        }
        entries.names.insert(name.to_string());
        Ok(())
    }

    /// Release `name` and any storage key it owns.
    pub fn unregister(&self, name: &str) {
        let mut entries = self.entries.lock();
        entries.names.remove(name);
        entries.storage_keys.retain(|_, owner| owner != name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.lock().names.contains(name)
    }

    /// Names of live stores, sorted.
    pub fn store_names(&self) -> Vec<String> {
        self.entries.lock().names.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().names.is_empty()
    }
}
