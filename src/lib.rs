//! # Snapstore
//!
//! A reactive, immutable state store. A store holds one value behind an
//! atomically swapped snapshot and broadcasts changes to any number of
//! query streams without ever handing out a mutable reference to its state.
//!
//! ## Core Concepts
//!
//! - **Values**: A dynamic object graph ([`Value`]) whose nodes can be frozen
//! - **Snapshots**: Immutable [`State`] records tagged with the [`Action`] that produced them
//! - **Queries**: Filtered, deduplicated streams created by [`Store::select_map`]
//! - **Persistence**: Debounced write-behind to a [`StorageApi`] backend
//!
//! ## Example
//!
//! ```ignore
//! use snapstore::{Store, StoreConfig, Value};
//! use serde_json::json;
//!
//! let store: Store = Store::new(None, StoreConfig::new("weather"))?;
//! let raining = store.select_map(|v| v.get("is_raining"));
//!
//! store.initialize(Value::from(json!({"is_raining": false})))?;
//! store.update(Value::from(json!({"is_raining": true})))?;
//!
//! assert_eq!(raining.recv()?, Some(Value::from(false)));
//! assert_eq!(raining.recv()?, Some(Value::from(true)));
//! ```

pub mod config;
pub mod devtools;
pub mod error;
pub mod helpers;
pub mod hooks;
pub mod query;
pub mod registry;
pub mod state;
pub mod storage;
pub mod store;
pub mod subject;
pub mod value;

// Re-exports
pub use config::{
    GlobalStoreConfig, InstanceFactory, Parse, ResolvedConfig, StorageType, StoreConfig,
    Stringify,
};
pub use devtools::{ChannelSink, DevToolsEvent, EventKind, EventSink, TracingSink};
pub use error::{AsyncInitError, Result, StoreError};
pub use helpers::{
    advanced_equals, compare, count_object_changes, deep_clone, deep_freeze, instance_handler,
    merge_objects, simple_clone, simple_equals, strict_equals, CloneMode, ObjectCompareType,
};
pub use hooks::{NoHooks, StoreHooks};
pub use query::{QueryHandle, QueryId, Selectable};
pub use registry::StoreRegistry;
pub use state::{Action, State, StatePatch, StoreTag};
pub use storage::{FileStorage, MemoryStorage, StorageApi};
pub use store::{ActionQuery, Store};
pub use subject::Watch;
pub use value::{Array, Date, Function, Object, Value};
