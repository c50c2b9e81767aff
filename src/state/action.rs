//! Action tags and store tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label of the operation that produced a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    Loading,
    Init,
    InitAsync,
    AfterInitUpdate,
    Update,
    Override,
    Reset,
    HardResetting,
    Paused,
    Unpause,
    Error,
    Destroy,
    /// Caller-supplied name passed to `update_as`, `override_as` or `reset_as`.
    Custom(String),
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Loading => "loading",
            Action::Init => "init",
            Action::InitAsync => "init_async",
            Action::AfterInitUpdate => "after_init_update",
            Action::Update => "update",
            Action::Override => "override",
            Action::Reset => "reset",
            Action::HardResetting => "hard_resetting",
            Action::Paused => "paused",
            Action::Unpause => "unpause",
            Action::Error => "error",
            Action::Destroy => "destroy",
            Action::Custom(name) => name,
        }
    }

    /// Whether this is a caller-supplied tag.
    pub fn is_custom(&self) -> bool {
        matches!(self, Action::Custom(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in names map to their variant; anything else becomes `Custom`.
///
/// `Store::update_as` and its siblings skip this mapping and always tag
/// snapshots `Custom`.
impl From<&str> for Action {
    fn from(name: &str) -> Self {
        match name {
            "loading" => Action::Loading,
            "init" => Action::Init,
            "init_async" => Action::InitAsync,
            "after_init_update" => Action::AfterInitUpdate,
            "update" => Action::Update,
            "override" => Action::Override,
            "reset" => Action::Reset,
            "hard_resetting" => Action::HardResetting,
            "paused" => Action::Paused,
            "unpause" => Action::Unpause,
            "error" => Action::Error,
            "destroy" => Action::Destroy,
            other => Action::Custom(other.to_string()),
        }
    }
}

impl From<String> for Action {
    fn from(name: String) -> Self {
        Action::from(name.as_str())
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        match action {
            Action::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

/// Coarse lifecycle label derived from a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreTag {
    Destroyed,
    HardResetting,
    Loading,
    Paused,
    Active,
    Error,
    /// No value and no error while not loading.
    Resolving,
}

impl StoreTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreTag::Destroyed => "destroyed",
            StoreTag::HardResetting => "hard_resetting",
            StoreTag::Loading => "loading",
            StoreTag::Paused => "paused",
            StoreTag::Active => "active",
            StoreTag::Error => "error",
            StoreTag::Resolving => "resolving",
        }
    }
}

impl fmt::Display for StoreTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
