//! Equality strategies and change counting.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Strategy used to decide whether two object-like results are the same.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectCompareType {
    /// Identity only.
    Reference,
    /// Same keys, each field identical (shallow).
    Simple,
    /// Deep structural equality.
    #[default]
    Advanced,
}

impl ObjectCompareType {
    pub fn name(self) -> &'static str {
        match self {
            ObjectCompareType::Reference => "Reference",
            ObjectCompareType::Simple => "Simple",
            ObjectCompareType::Advanced => "Advanced",
        }
    }
}

/// Compare two values with the given strategy.
pub fn compare(strategy: ObjectCompareType, a: &Value, b: &Value) -> bool {
    match strategy {
        ObjectCompareType::Reference => strict_equals(a, b),
        ObjectCompareType::Simple => simple_equals(a, b),
        ObjectCompareType::Advanced => advanced_equals(a, b),
    }
}

/// `===` semantics: primitives by value, nodes by identity.
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        _ => a.ptr_eq(b),
    }
}

/// Shallow equality: same key set (or length) and identical members.
pub fn simple_equals(a: &Value, b: &Value) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => {
            let (x, y) = (x.fields(), y.fields());
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| strict_equals(v, other)))
        }
        (Value::Array(x), Value::Array(y)) => {
            let (x, y) = (x.to_vec(), y.to_vec());
            x.len() == y.len() && x.iter().zip(&y).all(|(v, w)| strict_equals(v, w))
        }
        (Value::Date(x), Value::Date(y)) => x.get_time() == y.get_time(),
        _ => strict_equals(a, b),
    }
}

/// Deep structural equality.
///
/// Dates are equal when their epoch milliseconds match. Any two functions
/// are considered equal regardless of identity; a function never equals a
/// non-function.
pub fn advanced_equals(a: &Value, b: &Value) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => {
            let (x, y) = (x.fields(), y.fields());
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| advanced_equals(v, other)))
        }
        (Value::Array(x), Value::Array(y)) => {
            let (x, y) = (x.to_vec(), y.to_vec());
            x.len() == y.len() && x.iter().zip(&y).all(|(v, w)| advanced_equals(v, w))
        }
        (Value::Date(x), Value::Date(y)) => x.get_time() == y.get_time(),
        (Value::Function(_), Value::Function(_)) => true,
        (Value::Function(_), _) | (_, Value::Function(_)) => false,
        _ => strict_equals(a, b),
    }
}

/// Count how many leaves differ between `a` and `b`.
///
/// Used for human-readable change summaries only.
pub fn count_object_changes(a: &Value, b: &Value) -> usize {
    if a.is_null() || b.is_null() {
        return usize::from(!strict_equals(a, b));
    }
    if let (Value::Date(x), Value::Date(y)) = (a, b) {
        return usize::from(x.get_time() != y.get_time());
    }
    if matches!(a, Value::Date(_)) || matches!(b, Value::Date(_)) {
        return 1;
    }
    match (a, b) {
        (Value::Array(x), Value::Array(y)) => {
            let (x, y) = (x.to_vec(), y.to_vec());
            let mut changes = x
                .iter()
                .enumerate()
                .map(|(i, item)| leaf_changes(item, y.get(i)))
                .sum();
            if y.len() > x.len() {
                changes += y.len() - x.len();
            }
            changes
        }
        (Value::Array(_), _) => 1,
        (Value::Object(x), Value::Object(y)) => {
            let (x, y) = (x.fields(), y.fields());
            let keys: BTreeSet<&String> = x.keys().collect();
            let mut changes: usize = x.iter().map(|(k, v)| leaf_changes(v, y.get(k))).sum();
            changes += y.keys().filter(|k| !keys.contains(k)).count();
            changes
        }
        _ => usize::from(!strict_equals(a, b)),
    }
}

fn leaf_changes(x: &Value, y: Option<&Value>) -> usize {
    match y {
        None => 1,
        Some(y) if x.is_object_like() => {
            if y.is_object_like() {
                count_object_changes(x, y)
            } else {
                1
            }
        }
        Some(y) if matches!(x, Value::Function(_)) || matches!(y, Value::Function(_)) => {
            usize::from(matches!(x, Value::Function(_)) != matches!(y, Value::Function(_)))
        }
        Some(y) => usize::from(!strict_equals(x, y)),
    }
}
