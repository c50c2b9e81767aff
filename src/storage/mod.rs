//! Key/value persistence for store values.
//!
//! A store configured with storage reads its persisted value once at
//! initialization and writes every later value back through a
//! [`Persister`] after a quiet period.

mod file;
mod memory;
mod persist;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub(crate) use persist::Persister;

use crate::error::Result;

/// Minimal string key/value backend.
pub trait StorageApi: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: String) -> Result<()>;

    fn remove_item(&self, key: &str) -> Result<()>;
}
