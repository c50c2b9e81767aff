//! Store configuration.
//!
//! Per-store options live in [`StoreConfig`]; anything left unset falls back
//! to the process-wide [`GlobalStoreConfig`]. The result is resolved once at
//! construction and never changes afterwards.

use crate::devtools::EventSink;
use crate::error::{Result, StoreError};
use crate::helpers::{instance_handler, CloneMode, ObjectCompareType};
use crate::registry::StoreRegistry;
use crate::storage::{MemoryStorage, StorageApi};
use crate::value::Value;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Serializes a value for storage.
pub type Stringify = Arc<dyn Fn(&Value) -> Result<String> + Send + Sync>;

/// Parses a stored item; `None` input means the key was absent.
pub type Parse = Arc<dyn Fn(Option<&str>) -> Result<Option<Value>> + Send + Sync>;

/// Re-hydrates plain data (second argument) using the store's initial value
/// (first argument) as a template.
pub type InstanceFactory = Arc<dyn Fn(&Value, Value) -> Value + Send + Sync>;

/// Default capacity of a query stream before its subscriber is dropped.
pub const DEFAULT_SCOPE_BUFFER_SIZE: usize = 1024;

/// Which backend persists the store value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    #[default]
    None,
    Local,
    Session,
    Custom,
}

impl StorageType {
    pub fn name(&self) -> &'static str {
        match self {
            StorageType::None => "None",
            StorageType::Local => "Local-Storage",
            StorageType::Session => "Session-Storage",
            StorageType::Custom => "Custom",
        }
    }
}

pub fn default_stringify() -> Stringify {
    Arc::new(|value: &Value| -> Result<String> { Ok(serde_json::to_string(value)?) })
}

pub fn default_parse() -> Parse {
    Arc::new(|text: Option<&str>| -> Result<Option<Value>> {
        match text {
            None => Ok(None),
            Some(text) => {
                let value: Value = serde_json::from_str(text)?;
                Ok((!value.is_null()).then_some(value))
            }
        }
    })
}

pub fn default_instance_factory() -> InstanceFactory {
    Arc::new(instance_handler)
}

/// Defaults shared by every store that does not override them.
#[derive(Clone)]
pub struct GlobalStoreConfig {
    pub is_resettable: bool,
    pub is_simple_cloning: bool,
    pub is_immutable: bool,
    pub object_compare_type: ObjectCompareType,
    pub storage_type: StorageType,
    pub storage_debounce: Duration,
    pub custom_storage: Option<Arc<dyn StorageApi>>,
    pub stringify: Stringify,
    pub parse: Parse,
    pub dev_tools: Option<Arc<dyn EventSink>>,
    pub scope_buffer_size: usize,
}

impl Default for GlobalStoreConfig {
    fn default() -> Self {
        Self {
            is_resettable: true,
            is_simple_cloning: false,
            is_immutable: true,
            object_compare_type: ObjectCompareType::Advanced,
            storage_type: StorageType::None,
            storage_debounce: Duration::from_millis(2000),
            custom_storage: None,
            stringify: default_stringify(),
            parse: default_parse(),
            dev_tools: None,
            scope_buffer_size: DEFAULT_SCOPE_BUFFER_SIZE,
        }
    }
}

static GLOBAL: OnceLock<RwLock<GlobalStoreConfig>> = OnceLock::new();

impl GlobalStoreConfig {
    fn cell() -> &'static RwLock<GlobalStoreConfig> {
        GLOBAL.get_or_init(|| RwLock::new(GlobalStoreConfig::default()))
    }

    /// Copy of the current process-wide defaults.
    pub fn current() -> GlobalStoreConfig {
        Self::cell().read().clone()
    }

    /// Replace the process-wide defaults. Stores already created keep the
    /// configuration they resolved.
    pub fn set(config: GlobalStoreConfig) {
        *Self::cell().write() = config;
    }

    /// Edit the process-wide defaults in place.
    pub fn update(edit: impl FnOnce(&mut GlobalStoreConfig)) {
        edit(&mut Self::cell().write());
    }
}

impl fmt::Debug for GlobalStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalStoreConfig")
            .field("is_resettable", &self.is_resettable)
            .field("is_simple_cloning", &self.is_simple_cloning)
            .field("is_immutable", &self.is_immutable)
            .field("object_compare_type", &self.object_compare_type)
            .field("storage_type", &self.storage_type)
            .field("storage_debounce", &self.storage_debounce)
            .field("scope_buffer_size", &self.scope_buffer_size)
            .finish_non_exhaustive()
    }
}

/// Options for one store. Only `name` is required.
#[derive(Clone, Default)]
pub struct StoreConfig {
    /// Unique store name.
    pub name: String,
    pub is_resettable: Option<bool>,
    /// Shallow instead of deep copies on every read and write.
    pub is_simple_cloning: Option<bool>,
    /// When false, values are neither frozen nor copied.
    pub is_immutable: Option<bool>,
    pub object_compare_type: Option<ObjectCompareType>,
    pub storage_type: Option<StorageType>,
    /// Defaults to the store name.
    pub storage_key: Option<String>,
    pub storage_debounce: Option<Duration>,
    /// Backend for `StorageType::Custom`.
    pub custom_storage: Option<Arc<dyn StorageApi>>,
    pub stringify: Option<Stringify>,
    pub parse: Option<Parse>,
    pub instance_factory: Option<InstanceFactory>,
    /// Defaults to [`StoreRegistry::global`].
    pub registry: Option<Arc<StoreRegistry>>,
    pub dev_tools: Option<Arc<dyn EventSink>>,
    pub scope_buffer_size: Option<usize>,
}

impl StoreConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn resettable(mut self, is_resettable: bool) -> Self {
        self.is_resettable = Some(is_resettable);
        self
    }

    pub fn simple_cloning(mut self, is_simple_cloning: bool) -> Self {
        self.is_simple_cloning = Some(is_simple_cloning);
        self
    }

    pub fn immutable(mut self, is_immutable: bool) -> Self {
        self.is_immutable = Some(is_immutable);
        self
    }

    pub fn compare(mut self, compare: ObjectCompareType) -> Self {
        self.object_compare_type = Some(compare);
        self
    }

    pub fn storage(mut self, storage_type: StorageType) -> Self {
        self.storage_type = Some(storage_type);
        self
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = Some(key.into());
        self
    }

    pub fn storage_debounce(mut self, debounce: Duration) -> Self {
        self.storage_debounce = Some(debounce);
        self
    }

    /// Use `storage` as a custom backend (sets the storage type to custom).
    pub fn custom_storage(mut self, storage: Arc<dyn StorageApi>) -> Self {
        self.storage_type = Some(StorageType::Custom);
        self.custom_storage = Some(storage);
        self
    }

    pub fn stringify<F>(mut self, stringify: F) -> Self
    where
        F: Fn(&Value) -> Result<String> + Send + Sync + 'static,
    {
        self.stringify = Some(Arc::new(stringify));
        self
    }

    pub fn parse<F>(mut self, parse: F) -> Self
    where
        F: Fn(Option<&str>) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.parse = Some(Arc::new(parse));
        self
    }

    pub fn instance_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Value, Value) -> Value + Send + Sync + 'static,
    {
        self.instance_factory = Some(Arc::new(factory));
        self
    }

    pub fn registry(mut self, registry: Arc<StoreRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn dev_tools(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.dev_tools = Some(sink);
        self
    }

    pub fn scope_buffer_size(mut self, size: usize) -> Self {
        self.scope_buffer_size = Some(size);
        self
    }

    /// Fill unset options from `global` and pick the storage backend.
    pub fn resolve(self, global: &GlobalStoreConfig) -> Result<ResolvedConfig> {
        let name = self.name;
        if name.trim().is_empty() {
            return Err(StoreError::InvalidConfig("store name must not be empty".into()));
        }

        let mut storage_type = self.storage_type.unwrap_or(global.storage_type);
        let custom = self.custom_storage.or_else(|| global.custom_storage.clone());
        let storage: Option<Arc<dyn StorageApi>> = match storage_type {
            StorageType::None => None,
            StorageType::Local => Some(MemoryStorage::local()),
            StorageType::Session => Some(MemoryStorage::session()),
            StorageType::Custom => match custom.clone() {
                Some(api) => Some(api),
                None => {
                    tracing::warn!(
                        "Store \"{}\" has storage type set to custom but no custom storage api was provided; storage disabled",
                        name
                    );
                    storage_type = StorageType::None;
                    None
                }
            },
        };
        if storage_type != StorageType::Custom && custom.is_some() {
            tracing::warn!(
                "Store \"{}\" was given a custom storage api but its storage type is {}; the api is ignored",
                name,
                storage_type.name()
            );
        }

        let storage_key = self.storage_key.unwrap_or_else(|| name.clone());
        let scope_buffer_size = self
            .scope_buffer_size
            .unwrap_or(global.scope_buffer_size)
            .max(1);

        Ok(ResolvedConfig {
            storage_key,
            is_resettable: self.is_resettable.unwrap_or(global.is_resettable),
            is_simple_cloning: self.is_simple_cloning.unwrap_or(global.is_simple_cloning),
            is_immutable: self.is_immutable.unwrap_or(global.is_immutable),
            object_compare_type: self
                .object_compare_type
                .unwrap_or(global.object_compare_type),
            storage_type,
            storage,
            storage_debounce: self.storage_debounce.unwrap_or(global.storage_debounce),
            stringify: self.stringify.unwrap_or_else(|| global.stringify.clone()),
            parse: self.parse.unwrap_or_else(|| global.parse.clone()),
            instance_factory: self
                .instance_factory
                .unwrap_or_else(default_instance_factory),
            registry: self.registry.unwrap_or_else(StoreRegistry::global),
            dev_tools: self.dev_tools.or_else(|| global.dev_tools.clone()),
            scope_buffer_size,
            name,
        })
    }
}

/// Configuration a store runs with.
#[derive(Clone)]
pub struct ResolvedConfig {
    pub name: String,
    pub is_resettable: bool,
    pub is_simple_cloning: bool,
    pub is_immutable: bool,
    pub object_compare_type: ObjectCompareType,
    pub storage_type: StorageType,
    pub storage: Option<Arc<dyn StorageApi>>,
    pub storage_key: String,
    pub storage_debounce: Duration,
    pub stringify: Stringify,
    pub parse: Parse,
    pub instance_factory: InstanceFactory,
    pub registry: Arc<StoreRegistry>,
    pub dev_tools: Option<Arc<dyn EventSink>>,
    pub scope_buffer_size: usize,
}

impl ResolvedConfig {
    /// How values are copied on the way in and out of the store.
    pub fn clone_mode(&self) -> CloneMode {
        if !self.is_immutable {
            CloneMode::None
        } else if self.is_simple_cloning {
            CloneMode::Simple
        } else {
            CloneMode::Deep
        }
    }

    /// Storage key, only when a backend is configured.
    pub fn active_storage_key(&self) -> Option<&str> {
        self.storage.as_ref().map(|_| self.storage_key.as_str())
    }
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("name", &self.name)
            .field("is_resettable", &self.is_resettable)
            .field("is_simple_cloning", &self.is_simple_cloning)
            .field("is_immutable", &self.is_immutable)
            .field("object_compare_type", &self.object_compare_type.name())
            .field("storage_type", &self.storage_type.name())
            .field("storage_key", &self.storage_key)
            .field("storage_debounce", &self.storage_debounce)
            .field("scope_buffer_size", &self.scope_buffer_size)
            .finish_non_exhaustive()
    }
}
