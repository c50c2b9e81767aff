//! In-process storage backends.

use super::StorageApi;
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

static LOCAL: OnceLock<Arc<MemoryStorage>> = OnceLock::new();
static SESSION: OnceLock<Arc<MemoryStorage>> = OnceLock::new();

/// String map guarded by a lock.
#[derive(Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide backend used by `StorageType::Local`.
    pub fn local() -> Arc<MemoryStorage> {
        LOCAL.get_or_init(|| Arc::new(MemoryStorage::new())).clone()
    }

    /// Process-wide backend used by `StorageType::Session`.
    pub fn session() -> Arc<MemoryStorage> {
        SESSION.get_or_init(|| Arc::new(MemoryStorage::new())).clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn clear(&self) {
        self.items.write().clear();
    }
}

impl StorageApi for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: String) -> Result<()> {
        self.items.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("k").unwrap(), None);

        storage.set_item("k", "v".into()).unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
        assert_eq!(storage.len(), 1);

        storage.remove_item("k").unwrap();
        assert!(storage.is_empty());
        // Removing a missing key is fine.
        storage.remove_item("k").unwrap();
    }

    #[test]
    fn test_local_and_session_are_distinct_singletons() {
        assert!(Arc::ptr_eq(&MemoryStorage::local(), &MemoryStorage::local()));
        assert!(!Arc::ptr_eq(&MemoryStorage::local(), &MemoryStorage::session()));
    }
}
