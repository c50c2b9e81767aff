//! Persistence tests: debounced writes, restore on init and cleanup.

use parking_lot::Mutex;
use serde_json::json;
use snapstore::{
    Date, FileStorage, MemoryStorage, StorageApi, StorageType, Store, StoreConfig, StoreError,
    StoreRegistry, Value,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const DEBOUNCE: Duration = Duration::from_millis(50);
const SETTLE: Duration = Duration::from_millis(300);

fn config(name: &str, storage: Arc<dyn StorageApi>) -> StoreConfig {
    StoreConfig::new(name)
        .registry(Arc::new(StoreRegistry::new()))
        .custom_storage(storage)
        .storage_debounce(DEBOUNCE)
}

fn weather() -> Value {
    Value::from(json!({"is_raining": false, "temperature": 20}))
}

fn stored(storage: &dyn StorageApi, key: &str) -> Option<serde_json::Value> {
    storage
        .get_item(key)
        .unwrap()
        .map(|text| serde_json::from_str(&text).unwrap())
}

/// Records every write it receives.
#[derive(Default)]
struct RecordingStorage {
    inner: MemoryStorage,
    writes: Mutex<Vec<String>>,
}

impl StorageApi for RecordingStorage {
    fn get_item(&self, key: &str) -> snapstore::Result<Option<String>> {
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: String) -> snapstore::Result<()> {
        self.writes.lock().push(value.clone());
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> snapstore::Result<()> {
        self.inner.remove_item(key)
    }
}

/// Rejects every write.
struct ReadOnlyStorage;

impl StorageApi for ReadOnlyStorage {
    fn get_item(&self, _key: &str) -> snapstore::Result<Option<String>> {
        Ok(None)
    }

    fn set_item(&self, _key: &str, _value: String) -> snapstore::Result<()> {
        Err(StoreError::Storage("read-only".into()))
    }

    fn remove_item(&self, _key: &str) -> snapstore::Result<()> {
        Err(StoreError::Storage("read-only".into()))
    }
}

// --- Debounced Writes ---

#[test]
fn test_writes_are_debounced() {
    let storage = Arc::new(RecordingStorage::default());
    let store: Store = Store::new(Some(weather()), config("weather", storage.clone())).unwrap();

    for t in 21..=25 {
        store.update(Value::from(json!({"temperature": t}))).unwrap();
    }
    thread::sleep(SETTLE);

    assert_eq!(storage.writes.lock().len(), 1);
    assert_eq!(
        stored(&*storage, "weather"),
        Some(json!({"is_raining": false, "temperature": 25}))
    );
}

#[test]
fn test_writes_after_each_quiet_period() {
    let storage = Arc::new(RecordingStorage::default());
    let store: Store = Store::new(Some(weather()), config("weather", storage.clone())).unwrap();

    thread::sleep(SETTLE);
    store.update(Value::from(json!({"is_raining": true}))).unwrap();
    thread::sleep(SETTLE);

    let writes = storage.writes.lock();
    assert_eq!(writes.len(), 2);
    assert!(writes[1].contains("\"is_raining\":true"));
}

#[test]
fn test_storage_key_override() {
    let storage = Arc::new(MemoryStorage::new());
    let _store: Store = Store::new(
        Some(weather()),
        config("weather", storage.clone()).storage_key("app/weather"),
    )
    .unwrap();
    thread::sleep(SETTLE);

    assert!(storage.get_item("weather").unwrap().is_none());
    assert_eq!(stored(&*storage, "app/weather"), Some(weather().to_json()));
}

#[test]
fn test_storage_key_with_nul_byte() {
    let storage = Arc::new(MemoryStorage::new());
    let store: Store = Store::new(
        Some(weather()),
        config("weather", storage.clone()).storage_key("a\0b"),
    )
    .unwrap();
    store.update(Value::from(json!({"temperature": 5}))).unwrap();
    thread::sleep(SETTLE);

    assert_eq!(
        stored(&*storage, "a\0b"),
        Some(json!({"is_raining": false, "temperature": 5}))
    );
}

#[test]
fn test_write_failures_do_not_break_the_store() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let store: Store =
        Store::new(Some(weather()), config("weather", Arc::new(ReadOnlyStorage))).unwrap();
    store.update(Value::from(json!({"temperature": 1}))).unwrap();
    thread::sleep(SETTLE);

    store.update(Value::from(json!({"temperature": 2}))).unwrap();
    assert_eq!(store.value().unwrap().get("temperature"), Some(Value::from(2)));
}

// --- Restore ---

#[test]
fn test_restore_on_init() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set_item("weather", r#"{"is_raining":true,"temperature":12}"#.into())
        .unwrap();

    let store: Store = Store::new(Some(weather()), config("weather", storage.clone())).unwrap();
    assert_eq!(
        store.value(),
        Some(Value::from(json!({"is_raining": true, "temperature": 12})))
    );
    // The stored value also becomes the reset target.
    store.update(Value::from(json!({"temperature": 0}))).unwrap();
    store.reset().unwrap();
    assert_eq!(store.value().unwrap().get("temperature"), Some(Value::from(12)));
}

#[test]
fn test_restore_rehydrates_dates_and_classes() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set_item(
            "weather",
            r#"{"observed":"2024-03-01T06:30:00.000Z","temperature":4}"#.into(),
        )
        .unwrap();

    let initial = snapstore::Object::with_class("Observation");
    initial.set("observed", Date::from_millis(0)).unwrap();
    initial.set("temperature", 0).unwrap();

    let store: Store = Store::new(
        Some(Value::Object(initial)),
        config("weather", storage.clone()),
    )
    .unwrap();

    let value = store.value().unwrap();
    assert_eq!(value.class().as_deref(), Some("Observation"));
    let observed = value.get("observed").unwrap();
    let observed = observed.as_date().unwrap();
    assert_eq!(observed.get_utc_full_year(), 2024);
    assert_eq!(observed.get_utc_month(), 2);
    assert_eq!(observed.get_utc_hours(), 6);
}

#[test]
fn test_simple_cloning_skips_rehydration() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set_item("weather", r#"{"observed":"2024-03-01T06:30:00.000Z"}"#.into())
        .unwrap();

    let initial = Value::object();
    initial.set("observed", Date::from_millis(0)).unwrap();
    let store: Store = Store::new(
        Some(initial),
        config("weather", storage.clone()).simple_cloning(true),
    )
    .unwrap();

    assert_eq!(
        store.value().unwrap().get("observed"),
        Some(Value::from("2024-03-01T06:30:00.000Z"))
    );
}

#[test]
fn test_stored_null_is_ignored() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item("weather", "null".into()).unwrap();

    let store: Store = Store::new(Some(weather()), config("weather", storage.clone())).unwrap();
    assert_eq!(store.value(), Some(weather()));
}

#[tokio::test]
async fn test_restore_on_async_init() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set_item("weather", r#"{"is_raining":true,"temperature":12}"#.into())
        .unwrap();

    let store: Store = Store::new(None, config("weather", storage.clone())).unwrap();
    store
        .initialize_async(async { Ok::<_, String>(weather()) })
        .await
        .unwrap();
    assert_eq!(store.value().unwrap().get("temperature"), Some(Value::from(12)));
}

#[test]
fn test_custom_codec() {
    let storage = Arc::new(MemoryStorage::new());
    let codec_config = |name: &str| {
        config(name, storage.clone())
            .stringify(|value: &Value| -> snapstore::Result<String> {
                Ok(format!("v1:{}", serde_json::to_string(value)?))
            })
            .parse(|text: Option<&str>| -> snapstore::Result<Option<Value>> {
                match text.and_then(|t| t.strip_prefix("v1:")) {
                    Some(body) => Ok(Some(serde_json::from_str(body)?)),
                    None => Ok(None),
                }
            })
    };

    let store: Store = Store::new(Some(weather()), codec_config("weather")).unwrap();
    store.update(Value::from(json!({"temperature": 7}))).unwrap();
    thread::sleep(SETTLE);
    assert!(storage.get_item("weather").unwrap().unwrap().starts_with("v1:"));

    drop(store);
    thread::sleep(SETTLE);
    let restored: Store = Store::new(Some(weather()), codec_config("weather")).unwrap();
    assert_eq!(restored.value().unwrap().get("temperature"), Some(Value::from(7)));
}

// --- Cleanup ---

#[tokio::test]
async fn test_hard_reset_removes_stored_value() {
    let storage = Arc::new(RecordingStorage::default());
    let store: Store = Store::new(Some(weather()), config("weather", storage.clone())).unwrap();
    thread::sleep(SETTLE);
    assert!(storage.get_item("weather").unwrap().is_some());

    // Pending write is discarded by the reset.
    store.update(Value::from(json!({"temperature": 1}))).unwrap();
    store.hard_reset().await.unwrap();
    thread::sleep(SETTLE);

    assert!(storage.get_item("weather").unwrap().is_none());
    assert_eq!(storage.writes.lock().len(), 1);
}

#[tokio::test]
async fn test_persistence_resumes_after_reinitialize() {
    let storage = Arc::new(MemoryStorage::new());
    let store: Store = Store::new(Some(weather()), config("weather", storage.clone())).unwrap();
    store.hard_reset().await.unwrap();

    store
        .initialize(Value::from(json!({"temperature": 3})))
        .unwrap();
    thread::sleep(SETTLE);
    assert_eq!(stored(&*storage, "weather"), Some(json!({"temperature": 3})));
}

#[tokio::test]
async fn test_destroy_removes_stored_value() {
    let storage = Arc::new(MemoryStorage::new());
    let store: Store = Store::new(Some(weather()), config("weather", storage.clone())).unwrap();
    thread::sleep(SETTLE);

    store.destroy().await;
    thread::sleep(SETTLE);
    assert!(storage.is_empty());
}

// --- Built-in Backends ---

#[test]
fn test_local_storage_type() {
    let store: Store = Store::new(
        Some(weather()),
        StoreConfig::new("weather")
            .registry(Arc::new(StoreRegistry::new()))
            .storage(StorageType::Local)
            .storage_key("persistence-test/local")
            .storage_debounce(DEBOUNCE),
    )
    .unwrap();
    assert_eq!(store.config().storage_type, StorageType::Local);
    thread::sleep(SETTLE);

    assert_eq!(
        stored(&*MemoryStorage::local(), "persistence-test/local"),
        Some(weather().to_json())
    );
    assert!(MemoryStorage::session()
        .get_item("persistence-test/local")
        .unwrap()
        .is_none());
}

#[test]
fn test_custom_type_without_backend_disables_storage() {
    let store: Store = Store::new(
        Some(weather()),
        StoreConfig::new("weather")
            .registry(Arc::new(StoreRegistry::new()))
            .storage(StorageType::Custom),
    )
    .unwrap();
    assert_eq!(store.config().storage_type, StorageType::None);
    assert!(store.config().storage.is_none());
}

#[test]
fn test_file_storage_round_trip() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(FileStorage::open(dir.path().join("state")).unwrap());

    let store: Store = Store::new(Some(weather()), config("weather", storage.clone())).unwrap();
    store.update(Value::from(json!({"is_raining": true}))).unwrap();
    thread::sleep(SETTLE);
    assert!(storage.item_path("weather").exists());

    drop(store);
    let restored: Store = Store::new(None, config("weather", storage.clone())).unwrap();
    restored.initialize(weather()).unwrap();
    assert_eq!(
        restored.value().unwrap().get("is_raining"),
        Some(Value::from(true))
    );
}

#[test]
fn test_file_storage_is_exclusive() {
    let dir = TempDir::new().unwrap();
    let _first = FileStorage::open(dir.path()).unwrap();
    assert!(matches!(
        FileStorage::open(dir.path()),
        Err(StoreError::Locked)
    ));
}
