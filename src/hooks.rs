//! Lifecycle hooks.
//!
//! Every hook receives a private copy of the value it may replace. Returning
//! `Some` substitutes the value, `None` keeps it. Hooks run while the store
//! holds its writer lock and must not call back into mutating store methods.

use crate::value::Value;

pub trait StoreHooks<E>: Send + Sync {
    /// Before the initial value is frozen and published.
    fn on_before_init(&self, _next: Value) -> Option<Value> {
        None
    }

    /// After the first snapshot was published; a returned value is published
    /// as an `after_init_update`.
    fn on_after_init(&self, _current: Value) -> Option<Value> {
        None
    }

    /// Async initialization resolved with `result`.
    fn on_async_init_success(&self, _result: Value) -> Option<Value> {
        None
    }

    /// Async initialization failed. Returning `None` swallows the error.
    fn on_async_init_error(&self, error: E) -> Option<E> {
        Some(error)
    }

    fn on_update(&self, _next: Value, _current: &Value) -> Option<Value> {
        None
    }

    fn on_override(&self, _next: Value, _previous: &Value) -> Option<Value> {
        None
    }

    fn on_reset(&self, _next: Value, _current: &Value) -> Option<Value> {
        None
    }
}

/// Hooks that change nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl<E> StoreHooks<E> for NoHooks {}
