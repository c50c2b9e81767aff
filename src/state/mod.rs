//! Store snapshots and the actions that produce them.
//!
//! A store holds exactly one authoritative [`State`] at a time. Every change
//! builds a new snapshot from the previous one plus a [`StatePatch`] and
//! tags it with the [`Action`] that produced it.

mod action;
mod snapshot;

pub use action::{Action, StoreTag};
pub use snapshot::{State, StatePatch};
