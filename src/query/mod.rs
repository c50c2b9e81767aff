//! Filtered, deduplicated query streams over a store.
//!
//! Each `select` creates a scope fed from the store's publish path. A scope
//! holds back snapshots while the store is loading or paused, applies its
//! projection, suppresses consecutive duplicates and pushes the result into a
//! bounded channel.

mod manager;
mod types;

pub(crate) use manager::{Emission, Policy, ScopeRegistry};
pub use types::{QueryHandle, QueryId, Selectable};
