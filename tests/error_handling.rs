//! Error handling and edge case tests.

use serde_json::json;
use snapstore::{
    AsyncInitError, MemoryStorage, Store, StoreConfig, StoreError, StoreRegistry, StoreTag, Value,
};
use std::sync::Arc;

fn config(name: &str) -> StoreConfig {
    StoreConfig::new(name).registry(Arc::new(StoreRegistry::new()))
}

fn weather() -> Value {
    Value::from(json!({"is_raining": false, "temperature": 20}))
}

// --- Lifecycle Errors ---

#[test]
fn test_initialize_twice() {
    let store: Store = Store::new(Some(weather()), config("weather")).unwrap();
    let result = store.initialize(weather());
    assert!(matches!(result, Err(StoreError::AlreadyInitialized(ref name)) if name == "weather"));
}

#[tokio::test]
async fn test_initialize_async_after_initialize() {
    let store: Store = Store::new(Some(weather()), config("weather")).unwrap();
    let result = store
        .initialize_async(async { Ok::<_, String>(weather()) })
        .await;
    assert!(matches!(
        result,
        Err(AsyncInitError::Store(StoreError::AlreadyInitialized(_)))
    ));
    // The value is untouched.
    assert_eq!(store.value(), Some(weather()));
}

#[tokio::test]
async fn test_initialize_while_async_init_pending() {
    let store: Store = Store::new(None, config("weather")).unwrap();
    let pending = store.initialize_async(async { Ok::<_, String>(weather()) });

    // The synchronous path wins; the async result is then refused.
    store
        .initialize(Value::from(json!({"is_raining": true})))
        .unwrap();
    let result = pending.await;
    assert!(matches!(
        result,
        Err(AsyncInitError::Store(StoreError::AlreadyInitialized(_)))
    ));
    assert_eq!(
        store.value().unwrap().get("is_raining"),
        Some(Value::from(true))
    );
}

#[test]
fn test_mutations_before_initialize() {
    let store: Store = Store::new(None, config("weather")).unwrap();

    assert!(matches!(
        store.update(weather()),
        Err(StoreError::NotInitialized(_))
    ));
    assert!(matches!(
        store.override_value(weather()),
        Err(StoreError::NotInitialized(_))
    ));
    assert!(matches!(store.reset(), Err(StoreError::NotInitialized(_))));
    assert!(store.value().is_none());
}

#[tokio::test]
async fn test_mutations_after_hard_reset() {
    let store: Store = Store::new(Some(weather()), config("weather")).unwrap();
    store.hard_reset().await.unwrap();
    assert!(matches!(
        store.update(weather()),
        Err(StoreError::NotInitialized(_))
    ));
}

#[test]
fn test_paused_before_initialize_is_silent() {
    let store: Store = Store::new(None, config("weather")).unwrap();
    store.set_paused(true);
    assert!(store.update(weather()).is_ok());
    assert!(store.value().is_none());
}

#[tokio::test]
async fn test_not_resettable() {
    let store: Store =
        Store::new(Some(weather()), config("weather").resettable(false)).unwrap();
    store.update(Value::from(json!({"temperature": 30}))).unwrap();

    assert!(matches!(store.reset(), Err(StoreError::NotResettable(_))));
    assert!(matches!(
        store.hard_reset().await,
        Err(StoreError::NotResettable(_))
    ));
    assert_eq!(
        store.value().unwrap().get("temperature"),
        Some(Value::from(30))
    );
    assert_eq!(store.store_tag(), StoreTag::Active);
}

#[tokio::test]
async fn test_destroyed_store() {
    let store: Store = Store::new(None, config("weather")).unwrap();
    store.destroy().await;

    assert!(matches!(
        store.initialize(weather()),
        Err(StoreError::Destroyed(_))
    ));
    let result = store
        .initialize_async(async { Ok::<_, String>(weather()) })
        .await;
    assert!(matches!(
        result,
        Err(AsyncInitError::Store(StoreError::Destroyed(_)))
    ));

    // Mutations and a second teardown are quiet.
    assert!(store.update(weather()).is_ok());
    assert!(store.reset().is_ok());
    assert!(store.hard_reset().await.is_ok());
    store.destroy().await;
    assert_eq!(store.store_tag(), StoreTag::Destroyed);
}

#[tokio::test]
async fn test_select_on_destroyed_store() {
    let store: Store = Store::new(Some(weather()), config("weather")).unwrap();
    store.destroy().await;

    let handle = store.select();
    assert!(handle.try_recv().is_err());
    assert!(handle.recv().is_err());
    assert_eq!(store.query_scope_count(), 0);
}

// --- Async Errors ---

#[tokio::test]
async fn test_async_init_rejected() {
    let store: Store = Store::new(None, config("weather")).unwrap();
    let result = store
        .initialize_async(async { Err::<Value, _>("station offline".to_string()) })
        .await;

    match result {
        Err(AsyncInitError::Rejected(error)) => assert_eq!(error, "station offline"),
        other => panic!("expected rejection, got {:?}", other),
    }
    // Still waiting for a value; a later initialize works.
    assert!(store.is_loading());
    store.initialize(weather()).unwrap();
}

#[tokio::test]
async fn test_async_init_custom_error_type() {
    #[derive(Clone, Debug, PartialEq)]
    enum FetchError {
        Timeout,
    }

    let store: Store<FetchError> = Store::new(None, config("weather")).unwrap();
    store.set_error(Some(FetchError::Timeout));
    let result = store
        .initialize_async(async { Err::<Value, _>(FetchError::Timeout) })
        .await;

    assert!(matches!(
        result,
        Err(AsyncInitError::Rejected(FetchError::Timeout))
    ));
    assert_eq!(store.error(), Some(FetchError::Timeout));
}

// --- Configuration Errors ---

#[test]
fn test_empty_name() {
    let result: snapstore::Result<Store> = Store::new(None, config("  "));
    assert!(matches!(result, Err(StoreError::InvalidConfig(_))));
}

#[test]
fn test_duplicate_name() {
    let registry = Arc::new(StoreRegistry::new());
    let first: Store =
        Store::new(None, StoreConfig::new("weather").registry(registry.clone())).unwrap();

    let second: snapstore::Result<Store> =
        Store::new(None, StoreConfig::new("weather").registry(registry.clone()));
    assert!(matches!(second, Err(StoreError::DuplicateName(ref name)) if name == "weather"));

    // The failed attempt leaves the first registration in place.
    assert!(registry.contains("weather"));
    drop(first);
    assert!(!registry.contains("weather"));
}

#[test]
fn test_duplicate_storage_key() {
    let registry = Arc::new(StoreRegistry::new());
    let storage = Arc::new(MemoryStorage::new());

    let _first: Store = Store::new(
        None,
        StoreConfig::new("weather")
            .registry(registry.clone())
            .custom_storage(storage.clone())
            .storage_key("shared"),
    )
    .unwrap();

    let second: snapstore::Result<Store> = Store::new(
        None,
        StoreConfig::new("forecast")
            .registry(registry.clone())
            .custom_storage(storage.clone())
            .storage_key("shared"),
    );
    match second {
        Err(StoreError::DuplicateStorageKey { key, store }) => {
            assert_eq!(key, "shared");
            assert_eq!(store, "forecast");
        }
        other => panic!("expected duplicate storage key, got {:?}", other.err()),
    }
    assert!(!registry.contains("forecast"));
}

#[test]
fn test_storage_key_unused_without_storage() {
    let registry = Arc::new(StoreRegistry::new());
    let _first: Store = Store::new(
        None,
        StoreConfig::new("weather")
            .registry(registry.clone())
            .storage_key("shared"),
    )
    .unwrap();
    let _second: Store = Store::new(
        None,
        StoreConfig::new("forecast")
            .registry(registry.clone())
            .storage_key("shared"),
    )
    .unwrap();
    assert_eq!(registry.len(), 2);
}

// --- Storage Errors ---

#[test]
fn test_corrupt_stored_value() {
    let storage = Arc::new(MemoryStorage::new());
    snapstore::StorageApi::set_item(&*storage, "weather", "{not json".to_string()).unwrap();

    let result: snapstore::Result<Store> = Store::new(
        Some(weather()),
        config("weather").custom_storage(storage.clone()),
    );
    assert!(matches!(result, Err(StoreError::Deserialization(_))));
}

// --- Value Errors ---

#[test]
fn test_frozen_snapshot_rejects_mutation() {
    let store: Store = Store::new(Some(weather()), config("weather")).unwrap();
    let snapshot = store.snapshot();
    let value = snapshot.value.as_ref().unwrap();

    let result = value.set("temperature", 0);
    assert!(matches!(result, Err(StoreError::ImmutableMutation(_))));
    assert_eq!(value.get("temperature"), Some(Value::from(20)));
}

#[test]
fn test_set_on_primitive() {
    let value = Value::from(3);
    assert!(matches!(
        value.set("field", 1),
        Err(StoreError::TypeMismatch { expected: "object", .. })
    ));
}
