//! Pure value utilities: cloning, freezing, comparison and merging.
//!
//! These functions give stores their isolation and change-detection
//! guarantees. None of them support cyclic graphs: a cycle recurses without
//! bound.

mod clone;
mod compare;
mod freeze;
mod merge;

pub use clone::{deep_clone, simple_clone, CloneMode};
pub use compare::{
    advanced_equals, compare, count_object_changes, simple_equals, strict_equals,
    ObjectCompareType,
};
pub use freeze::deep_freeze;
pub use merge::{instance_handler, merge_objects};
