//! Query scope bookkeeping and the per-snapshot delivery pipeline.

use super::types::{QueryHandle, QueryId, Selectable};
use crate::helpers::{CloneMode, ObjectCompareType};
use crate::state::Action;
use crate::value::Value;
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// What a scope sees of one published snapshot.
pub(crate) struct Emission<'a> {
    pub(crate) value: Option<&'a Value>,
    pub(crate) is_loading: bool,
    pub(crate) is_paused: bool,
    pub(crate) action: &'a Action,
}

/// Store-wide comparison and copy settings.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Policy {
    pub(crate) compare: ObjectCompareType,
    pub(crate) clone: CloneMode,
}

enum Outcome {
    Delivered,
    Skipped,
    Overflow,
    Closed,
}

/// Type-erased scope so scopes with different output types share a registry.
trait Scope: Send {
    fn offer(&mut self, emission: &Emission<'_>, policy: Policy) -> Outcome;

    fn mark_hard_reset(&mut self);
}

type Projection<R> = Box<dyn Fn(&Value) -> R + Send + Sync>;

struct QueryScope<R> {
    /// Only snapshots produced by this action pass.
    action: Option<Action>,
    projection: Projection<R>,
    /// Last projected value that was delivered.
    last: Option<R>,
    /// Forces the next value through duplicate suppression once.
    was_hard_reset: bool,
    sender: Sender<R>,
}

impl<R: Selectable> Scope for QueryScope<R> {
    fn offer(&mut self, emission: &Emission<'_>, policy: Policy) -> Outcome {
        if emission.is_loading && self.action.as_ref() != Some(&Action::Loading) {
            return Outcome::Skipped;
        }
        if emission.is_paused {
            return Outcome::Skipped;
        }
        if let Some(action) = &self.action {
            if action != emission.action {
                return Outcome::Skipped;
            }
        }
        let Some(value) = emission.value else {
            return Outcome::Skipped;
        };

        let projected = (self.projection)(value);
        if !self.was_hard_reset {
            if let Some(previous) = &self.last {
                if projected.is_same(previous, policy.compare) {
                    return Outcome::Skipped;
                }
            }
        }
        self.was_hard_reset = false;

        let delivered = projected.isolate(policy.clone);
        self.last = Some(projected);
        match self.sender.try_send(delivered) {
            Ok(()) => Outcome::Delivered,
            Err(TrySendError::Full(_)) => Outcome::Overflow,
            Err(TrySendError::Disconnected(_)) => Outcome::Closed,
        }
    }

    fn mark_hard_reset(&mut self) {
        self.was_hard_reset = true;
    }
}

/// Live query scopes of one store.
pub(crate) struct ScopeRegistry {
    scopes: Mutex<HashMap<QueryId, Box<dyn Scope>>>,
    next_id: AtomicU64,
}

impl ScopeRegistry {
    pub(crate) fn new() -> Self {
        Self {
            scopes: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a scope and immediately offer it `current`.
    ///
    /// `current` is `None` for a destroyed store; the handle is then returned
    /// already disconnected.
    pub(crate) fn register<R, F>(
        &self,
        action: Option<Action>,
        projection: F,
        buffer_size: usize,
        current: Option<&Emission<'_>>,
        policy: Policy,
    ) -> QueryHandle<R>
    where
        R: Selectable,
        F: Fn(&Value) -> R + Send + Sync + 'static,
    {
        let id = QueryId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(buffer_size);
        let handle = QueryHandle { id, receiver };

        let Some(current) = current else {
            return handle;
        };

        let mut scope = QueryScope {
            action,
            projection: Box::new(projection),
            last: None,
            was_hard_reset: false,
            sender,
        };
        match scope.offer(current, policy) {
            Outcome::Delivered | Outcome::Skipped => {
                self.scopes.lock().insert(id, Box::new(scope));
            }
            Outcome::Overflow | Outcome::Closed => {}
        }
        handle
    }

    /// Run one snapshot through every scope, dropping scopes that overflowed
    /// or whose handle is gone.
    pub(crate) fn broadcast(&self, emission: &Emission<'_>, policy: Policy) {
        let mut scopes = self.scopes.lock();
        scopes.retain(|id, scope| match scope.offer(emission, policy) {
            Outcome::Delivered | Outcome::Skipped => true,
            Outcome::Overflow => {
                tracing::warn!("{} fell behind and was dropped", id);
                false
            }
            Outcome::Closed => {
                tracing::debug!("{} handle dropped, removing scope", id);
                false
            }
        });
    }

    /// Remove one scope. Returns whether it existed.
    pub(crate) fn dispose(&self, id: QueryId) -> bool {
        self.scopes.lock().remove(&id).is_some()
    }

    pub(crate) fn dispose_all(&self) {
        self.scopes.lock().clear();
    }

    pub(crate) fn mark_hard_reset(&self) {
        for scope in self.scopes.lock().values_mut() {
            scope.mark_hard_reset();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.scopes.lock().len()
    }
}
