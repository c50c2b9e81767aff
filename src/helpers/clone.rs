//! Deep and shallow cloning.

use crate::value::{Array, Date, Object, Value};

/// How a store isolates values handed to consumers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloneMode {
    /// Hand out the stored handles themselves.
    None,
    /// Copy the top level only.
    Simple,
    /// Copy the whole graph.
    Deep,
}

impl CloneMode {
    pub fn apply(self, value: &Value) -> Value {
        match self {
            CloneMode::None => value.clone(),
            CloneMode::Simple => simple_clone(value),
            CloneMode::Deep => deep_clone(value),
        }
    }
}

/// Produce a structurally independent copy of `value`.
///
/// Objects keep their class tag. Functions are shared rather than copied.
/// The copy is never frozen, even when the source is.
pub fn deep_clone(value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            let fields = obj
                .entries()
                .into_iter()
                .map(|(k, v)| (k, deep_clone(&v)))
                .collect();
            Value::Object(Object::from_parts(obj.class(), fields))
        }
        Value::Array(arr) => {
            Value::Array(Array::from_vec(arr.to_vec().iter().map(deep_clone).collect()))
        }
        Value::Date(date) => Value::Date(Date::from_millis(date.get_time())),
        other => other.clone(),
    }
}

/// Copy only the top level of `value`; nested nodes stay shared.
pub fn simple_clone(value: &Value) -> Value {
    match value {
        Value::Object(obj) => Value::Object(Object::from_parts(obj.class(), obj.fields())),
        Value::Array(arr) => Value::Array(Array::from_vec(arr.to_vec())),
        Value::Date(date) => Value::Date(Date::from_millis(date.get_time())),
        other => other.clone(),
    }
}
