//! The immutable state record.

use super::StoreTag;
use crate::value::Value;

/// One published snapshot of a store.
///
/// While `is_loading` is set `value` is `None`. `error` is independent of
/// `value`.
#[derive(Clone, Debug)]
pub struct State<E> {
    pub value: Option<Value>,
    pub error: Option<E>,
    pub is_loading: bool,
    pub is_paused: bool,
    pub is_hard_resetting: bool,
}

impl<E> Default for State<E> {
    fn default() -> Self {
        Self {
            value: None,
            error: None,
            is_loading: false,
            is_paused: false,
            is_hard_resetting: false,
        }
    }
}

impl<E: Clone> State<E> {
    /// Produce the next snapshot: fields present in `patch` replace ours.
    pub fn apply(&self, patch: StatePatch<E>) -> State<E> {
        State {
            value: patch.value.unwrap_or_else(|| self.value.clone()),
            error: patch.error.unwrap_or_else(|| self.error.clone()),
            is_loading: patch.is_loading.unwrap_or(self.is_loading),
            is_paused: patch.is_paused.unwrap_or(self.is_paused),
            is_hard_resetting: patch.is_hard_resetting.unwrap_or(self.is_hard_resetting),
        }
    }
}

impl<E> State<E> {
    /// Lifecycle label, not counting destruction (tracked by the store).
    pub fn tag(&self) -> StoreTag {
        if self.is_hard_resetting {
            StoreTag::HardResetting
        } else if self.is_loading {
            StoreTag::Loading
        } else if self.is_paused {
            StoreTag::Paused
        } else if self.value.is_some() {
            StoreTag::Active
        } else if self.error.is_some() {
            StoreTag::Error
        } else {
            StoreTag::Resolving
        }
    }
}

/// Partial snapshot. Unset fields carry over from the previous snapshot.
#[derive(Clone, Debug)]
pub struct StatePatch<E> {
    pub value: Option<Option<Value>>,
    pub error: Option<Option<E>>,
    pub is_loading: Option<bool>,
    pub is_paused: Option<bool>,
    pub is_hard_resetting: Option<bool>,
}

impl<E> Default for StatePatch<E> {
    fn default() -> Self {
        Self {
            value: None,
            error: None,
            is_loading: None,
            is_paused: None,
            is_hard_resetting: None,
        }
    }
}

impl<E> StatePatch<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, value: Option<Value>) -> Self {
        self.value = Some(value);
        self
    }

    pub fn error(mut self, error: Option<E>) -> Self {
        self.error = Some(error);
        self
    }

    pub fn loading(mut self, is_loading: bool) -> Self {
        self.is_loading = Some(is_loading);
        self
    }

    pub fn paused(mut self, is_paused: bool) -> Self {
        self.is_paused = Some(is_paused);
        self
    }

    pub fn hard_resetting(mut self, is_hard_resetting: bool) -> Self {
        self.is_hard_resetting = Some(is_hard_resetting);
        self
    }

    /// Patch that clears value, error and every flag except `is_loading`.
    pub fn cleared(is_loading: bool) -> Self {
        Self::new()
            .value(None)
            .error(None)
            .paused(false)
            .hard_resetting(false)
            .loading(is_loading)
    }
}
