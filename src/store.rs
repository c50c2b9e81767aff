//! The store: one immutable snapshot plus the lifecycle around it.

use crate::config::{GlobalStoreConfig, ResolvedConfig, StoreConfig};
use crate::devtools::{DevToolsEvent, EventKind};
use crate::error::{AsyncInitError, Result, StoreError};
use crate::helpers::{count_object_changes, deep_freeze, merge_objects};
use crate::hooks::{NoHooks, StoreHooks};
use crate::query::{Emission, Policy, QueryHandle, QueryId, ScopeRegistry, Selectable};
use crate::state::{Action, State, StatePatch, StoreTag};
use crate::storage::Persister;
use crate::subject::{Subject, Watch};
use crate::value::Value;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Bookkeeping for one outstanding `initialize_async`.
#[derive(Default)]
struct AsyncInitScope {
    cancelled: AtomicBool,
    settled: AtomicBool,
}

/// Mutable part of a store, swapped under `StoreInner::cell`.
struct Cell<E> {
    state: Arc<State<E>>,
    last_action: Action,
    /// Frozen copy of the first value, used by `reset`.
    initial_value: Option<Value>,
    is_destroyed: bool,
}

struct StoreInner<E> {
    config: ResolvedConfig,
    hooks: Arc<dyn StoreHooks<E>>,
    cell: RwLock<Cell<E>>,

    /// Serializes every state transition.
    write_lock: Mutex<()>,

    scopes: ScopeRegistry,
    loading: Subject<bool>,
    paused: Subject<bool>,
    error: Subject<Option<E>>,
    persister: Mutex<Option<Persister>>,
    async_init: Mutex<Option<Arc<AsyncInitScope>>>,
}

/// A reactive, immutable state container.
///
/// Holds a single value behind an atomically swapped snapshot. Every
/// published value is deep-frozen; readers get copies. `Store` is a cheap
/// handle: clones share the same underlying store.
///
/// ```ignore
/// use snapstore::{Store, StoreConfig, Value};
/// use serde_json::json;
///
/// let store: Store = Store::new(
///     Some(Value::from(json!({"is_raining": false}))),
///     StoreConfig::new("weather"),
/// )?;
/// let raining = store.select_map(|v| v.get("is_raining"));
/// store.update(Value::from(json!({"is_raining": true})))?;
/// ```
pub struct Store<E = String> {
    inner: Arc<StoreInner<E>>,
}

impl<E> Clone for Store<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Store<E>
where
    E: Clone + Send + Sync + fmt::Debug + 'static,
{
    /// Create a store without hooks.
    ///
    /// With `initial == None` the store starts in loading state and waits
    /// for `initialize` or `initialize_async`.
    pub fn new(initial: Option<Value>, config: StoreConfig) -> Result<Self> {
        Self::with_hooks(initial, config, NoHooks)
    }

    /// Create a store with lifecycle hooks.
    pub fn with_hooks<H>(initial: Option<Value>, config: StoreConfig, hooks: H) -> Result<Self>
    where
        H: StoreHooks<E> + 'static,
    {
        let config = config.resolve(&GlobalStoreConfig::current())?;
        config
            .registry
            .register(&config.name, config.active_storage_key())?;

        // From here on dropping `inner` releases the registration.
        let inner = Arc::new(StoreInner {
            hooks: Arc::new(hooks),
            cell: RwLock::new(Cell {
                state: Arc::new(State::default()),
                last_action: Action::Loading,
                initial_value: None,
                is_destroyed: false,
            }),
            write_lock: Mutex::new(()),
            scopes: ScopeRegistry::new(),
            loading: Subject::new(false, |a: &bool, b: &bool| a == b),
            paused: Subject::new(false, |a: &bool, b: &bool| a == b),
            error: Subject::new(None, |a: &Option<E>, b: &Option<E>| {
                a.is_none() && b.is_none()
            }),
            persister: Mutex::new(None),
            async_init: Mutex::new(None),
            config,
        });

        {
            let _lock = inner.write_lock.lock();
            match initial {
                None => {
                    inner.publish(StatePatch::new().loading(true), Action::Loading);
                    inner.emit(EventKind::Loading, None);
                }
                Some(value) => inner.initialize_store(value, false)?,
            }
        }

        tracing::debug!(
            "Created store \"{}\" ({})",
            inner.config.name,
            inner.config.storage_type.name()
        );
        Ok(Self { inner })
    }

    // --- Initialization ---

    /// Initialize a store created without a value.
    pub fn initialize(&self, value: Value) -> Result<()> {
        let _lock = self.inner.write_lock.lock();
        self.inner.check_initializable()?;
        self.inner.initialize_store(value, false)
    }

    /// Initialize from the result of `future`.
    ///
    /// Fails immediately, with no side effects, if the store is already
    /// initialized. If the store is hard reset or destroyed while `future` is
    /// pending, its result is discarded and the returned future resolves
    /// `Ok(())`. A failed `future` is passed through `on_async_init_error`;
    /// whatever error remains is returned as [`AsyncInitError::Rejected`].
    pub fn initialize_async<F>(
        &self,
        future: F,
    ) -> impl Future<Output = std::result::Result<(), AsyncInitError<E>>> + Send + 'static
    where
        F: Future<Output = std::result::Result<Value, E>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let scope = {
            let _lock = inner.write_lock.lock();
            inner.check_initializable().map(|()| {
                let scope = Arc::new(AsyncInitScope::default());
                *inner.async_init.lock() = Some(Arc::clone(&scope));
                scope
            })
        };

        async move {
            let scope = match scope {
                Ok(scope) => scope,
                Err(e) => return Err(AsyncInitError::Store(e)),
            };
            let outcome = future.await;
            inner.finish_async_init(&scope, outcome)
        }
    }

    // --- Mutations ---

    /// Deep-merge `partial` into the current value.
    ///
    /// A no-op while paused. Fails with `NotInitialized` before the first
    /// value or while loading.
    pub fn update(&self, partial: Value) -> Result<()> {
        self.inner.update(move |_| partial, Action::Update)
    }

    /// Like [`update`](Self::update), tagging the snapshot with a custom
    /// action name.
    ///
    /// The name is always a [`Action::Custom`] tag, even when it spells a
    /// built-in action such as `"init"`.
    pub fn update_as(&self, partial: Value, action: impl Into<String>) -> Result<()> {
        self.inner
            .update(move |_| partial, Action::Custom(action.into()))
    }

    /// Merge the partial value computed from the current (frozen) value.
    pub fn update_with<F>(&self, partial: F) -> Result<()>
    where
        F: FnOnce(&Value) -> Value,
    {
        self.inner.update(partial, Action::Update)
    }

    /// [`update_with`](Self::update_with) under a custom action name.
    pub fn update_with_as<F>(&self, partial: F, action: impl Into<String>) -> Result<()>
    where
        F: FnOnce(&Value) -> Value,
    {
        self.inner.update(partial, Action::Custom(action.into()))
    }

    /// Replace the current value entirely.
    pub fn override_value(&self, value: Value) -> Result<()> {
        self.inner.override_value(value, Action::Override)
    }

    /// [`override_value`](Self::override_value) under a custom action name.
    pub fn override_as(&self, value: Value, action: impl Into<String>) -> Result<()> {
        self.inner
            .override_value(value, Action::Custom(action.into()))
    }

    /// Restore the initial value.
    ///
    /// A no-op while paused; fails with `NotInitialized` before the first
    /// value and with `NotResettable` on a non-resettable store.
    pub fn reset(&self) -> Result<()> {
        self.inner.reset(Action::Reset)
    }

    /// [`reset`](Self::reset) under a custom action name.
    pub fn reset_as(&self, action: impl Into<String>) -> Result<()> {
        self.inner.reset(Action::Custom(action.into()))
    }

    /// Return the store to loading state, forgetting everything.
    ///
    /// Publishes a hard-resetting snapshot, yields once, then atomically
    /// cancels a pending async initialization, stops persistence and removes
    /// the stored item, and clears value, error, pause and initial value.
    /// Every live query delivers the next value even if it equals the last.
    pub async fn hard_reset(&self) -> Result<Self> {
        let inner = &self.inner;
        if !inner.config.is_resettable {
            return Err(StoreError::NotResettable(inner.config.name.clone()));
        }

        {
            let _lock = inner.write_lock.lock();
            if inner.is_destroyed() {
                return Ok(self.clone());
            }
            inner.publish(StatePatch::new().hard_resetting(true), Action::HardResetting);
        }

        tokio::task::yield_now().await;

        {
            let _lock = inner.write_lock.lock();
            if !inner.is_destroyed() {
                inner.cancel_pending_init();
                inner.stop_storage();
                inner.scopes.mark_hard_reset();
                inner.cell.write().initial_value = None;
                inner.publish(StatePatch::cleared(true), Action::Loading);
                inner.emit(EventKind::HardReset, None);
                tracing::debug!("Store \"{}\" hard reset", inner.config.name);
            }
        }

        Ok(self.clone())
    }

    /// Tear the store down.
    ///
    /// Disposes every query, completes the facet streams, removes the stored
    /// item and releases the store name and storage key. Later mutations are
    /// no-ops.
    pub async fn destroy(&self) {
        tokio::task::yield_now().await;

        let inner = &self.inner;
        let _lock = inner.write_lock.lock();
        if inner.is_destroyed() {
            return;
        }

        inner.cancel_pending_init();
        inner.stop_storage();
        inner.scopes.dispose_all();
        inner.cell.write().initial_value = None;
        inner.loading.complete();
        inner.paused.complete();
        inner.error.complete();
        inner.publish(StatePatch::cleared(false), Action::Destroy);
        inner.cell.write().is_destroyed = true;
        inner.config.registry.unregister(&inner.config.name);
        inner.emit(EventKind::Destroy, None);

        tracing::debug!("Store \"{}\" destroyed", inner.config.name);
    }

    /// Pause or resume the store.
    ///
    /// While paused, mutations are silent no-ops and queries receive nothing.
    pub fn set_paused(&self, is_paused: bool) {
        let _lock = self.inner.write_lock.lock();
        let action = if is_paused {
            Action::Paused
        } else {
            Action::Unpause
        };
        self.inner.publish(StatePatch::new().paused(is_paused), action);
    }

    /// Set or clear the error carried by the snapshot.
    pub fn set_error(&self, error: Option<E>) {
        let _lock = self.inner.write_lock.lock();
        self.inner.publish(StatePatch::new().error(error), Action::Error);
    }

    // --- Queries ---

    /// Stream of the store value.
    pub fn select(&self) -> QueryHandle<Value> {
        self.select_map(|value: &Value| value.clone())
    }

    /// Stream of `projection` applied to the store value.
    ///
    /// The current value is evaluated immediately. After that a result is
    /// delivered whenever it differs from the previously delivered one.
    /// `projection` runs on the publishing thread and must not call back
    /// into the store's mutating or querying methods.
    pub fn select_map<R, F>(&self, projection: F) -> QueryHandle<R>
    where
        R: Selectable,
        F: Fn(&Value) -> R + Send + Sync + 'static,
    {
        self.inner.register_query(None, projection)
    }

    /// Queries that only see snapshots produced by `action`.
    ///
    /// A string naming a built-in action binds to that action; use
    /// `Action::Custom` to follow a custom tag that shares its name.
    pub fn on_action(&self, action: impl Into<Action>) -> ActionQuery<E> {
        ActionQuery {
            store: self.clone(),
            action: action.into(),
        }
    }

    /// Stop and remove a query. Returns whether it was live.
    pub fn dispose_query_scope(&self, id: QueryId) -> bool {
        self.inner.scopes.dispose(id)
    }

    /// Number of live query scopes.
    pub fn query_scope_count(&self) -> usize {
        self.inner.scopes.len()
    }

    /// Loading flag changes, starting with the current flag.
    pub fn watch_loading(&self) -> Watch<bool> {
        self.inner.loading.watch()
    }

    /// Paused flag changes, starting with the current flag.
    pub fn watch_paused(&self) -> Watch<bool> {
        self.inner.paused.watch()
    }

    /// Error changes; consecutive `None`s are collapsed.
    pub fn watch_error(&self) -> Watch<Option<E>> {
        self.inner.error.watch()
    }

    // --- Accessors ---

    /// Unique store name.
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Configuration the store runs with.
    pub fn config(&self) -> &ResolvedConfig {
        &self.inner.config
    }

    /// Copy of the current value.
    pub fn value(&self) -> Option<Value> {
        let value = self.inner.cell.read().state.value.clone();
        value.map(|v| self.inner.copy(&v))
    }

    /// The current snapshot itself (value frozen, not copied).
    pub fn snapshot(&self) -> Arc<State<E>> {
        Arc::clone(&self.inner.cell.read().state)
    }

    /// Copy of the current snapshot.
    pub fn state(&self) -> State<E> {
        let snapshot = self.snapshot();
        State {
            value: snapshot.value.as_ref().map(|v| self.inner.copy(v)),
            error: snapshot.error.clone(),
            is_loading: snapshot.is_loading,
            is_paused: snapshot.is_paused,
            is_hard_resetting: snapshot.is_hard_resetting,
        }
    }

    /// The frozen initial value.
    pub fn initial_value(&self) -> Option<Value> {
        self.inner.cell.read().initial_value.clone()
    }

    /// Clone of the current error.
    pub fn error(&self) -> Option<E> {
        self.inner.cell.read().state.error.clone()
    }

    /// Whether the store is waiting for a value.
    pub fn is_loading(&self) -> bool {
        self.inner.cell.read().state.is_loading
    }

    /// Whether the store is paused.
    pub fn is_paused(&self) -> bool {
        self.inner.cell.read().state.is_paused
    }

    /// Whether a hard reset is in progress.
    pub fn is_hard_resetting(&self) -> bool {
        self.inner.cell.read().state.is_hard_resetting
    }

    /// Whether [`destroy`](Self::destroy) has completed.
    pub fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed()
    }

    /// Action that produced the current snapshot.
    pub fn last_action(&self) -> Action {
        self.inner.cell.read().last_action.clone()
    }

    /// Coarse lifecycle label; a destroyed store reports `Destroyed`.
    pub fn store_tag(&self) -> StoreTag {
        let cell = self.inner.cell.read();
        if cell.is_destroyed {
            StoreTag::Destroyed
        } else {
            cell.state.tag()
        }
    }
}

impl<E> fmt::Debug for Store<E>
where
    E: Clone + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name())
            .field("tag", &self.store_tag())
            .field("last_action", &self.last_action())
            .finish()
    }
}

/// Selector bound to one action, from [`Store::on_action`].
pub struct ActionQuery<E> {
    store: Store<E>,
    action: Action,
}

impl<E> ActionQuery<E>
where
    E: Clone + Send + Sync + fmt::Debug + 'static,
{
    /// Stream of the store value for snapshots produced by the bound action.
    pub fn select(&self) -> QueryHandle<Value> {
        self.select_map(|value: &Value| value.clone())
    }

    /// Stream of `projection` for snapshots produced by the bound action.
    pub fn select_map<R, F>(&self, projection: F) -> QueryHandle<R>
    where
        R: Selectable,
        F: Fn(&Value) -> R + Send + Sync + 'static,
    {
        self.store
            .inner
            .register_query(Some(self.action.clone()), projection)
    }
}

impl<E> StoreInner<E>
where
    E: Clone + Send + Sync + fmt::Debug + 'static,
{
    fn is_destroyed(&self) -> bool {
        self.cell.read().is_destroyed
    }

    fn copy(&self, value: &Value) -> Value {
        self.config.clone_mode().apply(value)
    }

    fn policy(&self) -> Policy {
        Policy {
            compare: self.config.object_compare_type,
            clone: self.config.clone_mode(),
        }
    }

    fn rehydrate(&self, template: &Value, value: Value) -> Value {
        (self.config.instance_factory)(template, value)
    }

    fn emit(&self, kind: EventKind, value: Option<Value>) {
        if let Some(sink) = &self.config.dev_tools {
            sink.on_event(DevToolsEvent {
                store_name: self.config.name.clone(),
                kind,
                value,
            });
        }
    }

    /// Swap in the next snapshot and notify every observer.
    ///
    /// Caller holds `write_lock`. Returns `None` on a destroyed store.
    fn publish(&self, patch: StatePatch<E>, action: Action) -> Option<Arc<State<E>>> {
        if self.config.is_immutable {
            if let Some(Some(value)) = &patch.value {
                deep_freeze(value);
            }
        }

        let snapshot = {
            let mut cell = self.cell.write();
            if cell.is_destroyed {
                return None;
            }
            let next = Arc::new(cell.state.apply(patch));
            cell.state = Arc::clone(&next);
            cell.last_action = action.clone();
            next
        };

        self.loading.publish(snapshot.is_loading);
        self.paused.publish(snapshot.is_paused);
        self.error.publish(snapshot.error.clone());

        if let Some(value) = &snapshot.value {
            if let Some(persister) = self.persister.lock().as_ref() {
                persister.push(value.clone());
            }
        }

        let emission = Emission {
            value: snapshot.value.as_ref(),
            is_loading: snapshot.is_loading,
            is_paused: snapshot.is_paused,
            action: &action,
        };
        self.scopes.broadcast(&emission, self.policy());

        tracing::debug!("Store \"{}\" published \"{}\"", self.config.name, action);
        Some(snapshot)
    }

    fn check_initializable(&self) -> Result<()> {
        let cell = self.cell.read();
        if cell.is_destroyed {
            return Err(StoreError::Destroyed(self.config.name.clone()));
        }
        if cell.state.is_loading && cell.initial_value.is_none() && cell.state.value.is_none() {
            Ok(())
        } else {
            Err(StoreError::AlreadyInitialized(self.config.name.clone()))
        }
    }

    /// Caller holds `write_lock` and has checked the store is initializable.
    fn initialize_store(&self, mut initial: Value, is_async: bool) -> Result<()> {
        let config = &self.config;
        let mut from_storage = false;

        if let Some(storage) = &config.storage {
            let stored = storage.get_item(&config.storage_key)?;
            if let Some(stored) = (config.parse)(stored.as_deref())? {
                initial = if config.is_simple_cloning {
                    stored
                } else {
                    self.rehydrate(&initial, stored)
                };
                from_storage = true;
                tracing::debug!(
                    "Store \"{}\" restored its value from storage key \"{}\"",
                    config.name,
                    config.storage_key
                );
            }

            let persister = Persister::spawn(
                Arc::clone(storage),
                config.storage_key.clone(),
                config.storage_debounce,
                Arc::clone(&config.stringify),
            )?;
            *self.persister.lock() = Some(persister);
        }

        if let Some(modified) = self.hooks.on_before_init(self.copy(&initial)) {
            initial = self.copy(&modified);
            from_storage = false;
        }

        let initial = if from_storage {
            initial
        } else {
            self.copy(&initial)
        };
        let initial = if config.is_immutable {
            deep_freeze(&initial)
        } else {
            initial
        };
        self.cell.write().initial_value = Some(initial.clone());

        let action = if is_async {
            Action::InitAsync
        } else {
            Action::Init
        };
        let snapshot = self.publish(
            StatePatch::new()
                .value(Some(self.copy(&initial)))
                .loading(false),
            action,
        );
        let current = snapshot.and_then(|s| s.value.clone());
        self.emit(EventKind::Init, current.clone());

        if let Some(current) = current {
            if let Some(modified) = self.hooks.on_after_init(self.copy(&current)) {
                self.publish(
                    StatePatch::new().value(Some(self.copy(&modified))),
                    Action::AfterInitUpdate,
                );
            }
        }

        tracing::debug!("Store \"{}\" initialized", config.name);
        Ok(())
    }

    fn finish_async_init(
        &self,
        scope: &AsyncInitScope,
        outcome: std::result::Result<Value, E>,
    ) -> std::result::Result<(), AsyncInitError<E>> {
        let _lock = self.write_lock.lock();
        scope.settled.store(true, Ordering::SeqCst);
        if scope.cancelled.load(Ordering::SeqCst) {
            tracing::debug!(
                "Store \"{}\" discarded a cancelled async initialization",
                self.config.name
            );
            return Ok(());
        }

        match outcome {
            Ok(result) => {
                self.check_initializable()?;
                let result = self
                    .hooks
                    .on_async_init_success(result.clone())
                    .unwrap_or(result);
                self.initialize_store(result, true)?;
                Ok(())
            }
            Err(error) => match self.hooks.on_async_init_error(error) {
                Some(error) => Err(AsyncInitError::Rejected(error)),
                None => Ok(()),
            },
        }
    }

    /// Caller holds `write_lock`.
    fn cancel_pending_init(&self) {
        let pending = self.async_init.lock().take();
        if let Some(scope) = pending {
            if !scope.settled.load(Ordering::SeqCst) {
                scope.cancelled.store(true, Ordering::SeqCst);
                tracing::debug!(
                    "Store \"{}\" cancelled a pending async initialization",
                    self.config.name
                );
            }
        }
    }

    /// Stop the persister (dropping pending writes) and remove the stored item.
    fn stop_storage(&self) {
        let persister = self.persister.lock().take();
        if let Some(mut persister) = persister {
            persister.stop();
        }
        if let Some(storage) = &self.config.storage {
            if let Err(e) = storage.remove_item(&self.config.storage_key) {
                tracing::warn!(
                    "Store \"{}\" failed to remove storage key \"{}\": {}",
                    self.config.name,
                    self.config.storage_key,
                    e
                );
            }
        }
    }

    /// Current and initial value when a mutation may proceed; `Ok(None)`
    /// when it is a silent no-op (paused or destroyed).
    fn mutable_parts(&self) -> Result<Option<(Value, Value)>> {
        let cell = self.cell.read();
        if cell.is_destroyed || cell.state.is_paused {
            return Ok(None);
        }
        match (&cell.state.value, &cell.initial_value) {
            (Some(value), Some(initial)) if !cell.state.is_loading => {
                Ok(Some((value.clone(), initial.clone())))
            }
            _ => Err(StoreError::NotInitialized(self.config.name.clone())),
        }
    }

    fn update<F>(&self, partial: F, action: Action) -> Result<()>
    where
        F: FnOnce(&Value) -> Value,
    {
        let _lock = self.write_lock.lock();
        let Some((current, initial)) = self.mutable_parts()? else {
            return Ok(());
        };

        let partial = partial(&current);
        let mut next = merge_objects(&self.copy(&current), &self.copy(&partial));
        if !self.config.is_simple_cloning {
            next = self.rehydrate(&initial, next);
        }
        if let Some(modified) = self.hooks.on_update(self.copy(&next), &current) {
            next = self.copy(&modified);
        }

        let changes = match self.config.dev_tools {
            Some(_) => count_object_changes(&current, &next),
            None => 0,
        };
        let custom = action.is_custom().then(|| action.to_string());
        let snapshot = self.publish(StatePatch::new().value(Some(next)), action);
        self.emit(
            EventKind::Update {
                action: custom,
                changes,
            },
            snapshot.and_then(|s| s.value.clone()),
        );
        Ok(())
    }

    fn override_value(&self, value: Value, action: Action) -> Result<()> {
        let _lock = self.write_lock.lock();
        let Some((current, initial)) = self.mutable_parts()? else {
            return Ok(());
        };

        let is_simple = self.config.is_simple_cloning;
        let mut value = value;
        if !is_simple {
            value = self.rehydrate(&initial, self.copy(&value));
        }
        let modified = self.hooks.on_override(self.copy(&value), &current);
        // Every path except simple cloning without a hook already copied.
        let is_copied = !is_simple || modified.is_some();
        if let Some(modified) = modified {
            value = self.copy(&modified);
        }
        let value = if is_copied { value } else { self.copy(&value) };

        let snapshot = self.publish(StatePatch::new().value(Some(value)), action);
        self.emit(EventKind::Override, snapshot.and_then(|s| s.value.clone()));
        Ok(())
    }

    fn reset(&self, action: Action) -> Result<()> {
        let _lock = self.write_lock.lock();
        let Some((current, initial)) = self.mutable_parts()? else {
            return Ok(());
        };
        if !self.config.is_resettable {
            return Err(StoreError::NotResettable(self.config.name.clone()));
        }

        let next = match self.hooks.on_reset(self.copy(&initial), &current) {
            Some(modified) => self.copy(&modified),
            None => self.copy(&initial),
        };
        let snapshot = self.publish(StatePatch::new().value(Some(next)), action);
        self.emit(EventKind::Reset, snapshot.and_then(|s| s.value.clone()));
        Ok(())
    }

    fn register_query<R, F>(&self, action: Option<Action>, projection: F) -> QueryHandle<R>
    where
        R: Selectable,
        F: Fn(&Value) -> R + Send + Sync + 'static,
    {
        let _lock = self.write_lock.lock();
        let (snapshot, last_action, is_destroyed) = {
            let cell = self.cell.read();
            (
                Arc::clone(&cell.state),
                cell.last_action.clone(),
                cell.is_destroyed,
            )
        };
        let current = Emission {
            value: snapshot.value.as_ref(),
            is_loading: snapshot.is_loading,
            is_paused: snapshot.is_paused,
            action: &last_action,
        };
        self.scopes.register(
            action,
            projection,
            self.config.scope_buffer_size,
            (!is_destroyed).then_some(&current),
            self.policy(),
        )
    }
}

impl<E> Drop for StoreInner<E> {
    fn drop(&mut self) {
        if !self.cell.get_mut().is_destroyed {
            self.config.registry.unregister(&self.config.name);
        }
    }
}
