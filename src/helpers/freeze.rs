//! Recursive freezing.

use crate::value::Value;

/// Freeze every object, array and date reachable from `value`.
///
/// Returns the same handle that was passed in. Freezing an already frozen
/// graph is a no-op. Functions are opaque and stay unfrozen.
pub fn deep_freeze(value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            obj.freeze();
            for (_, field) in obj.entries() {
                deep_freeze(&field);
            }
        }
        Value::Array(arr) => {
            arr.freeze();
            for item in arr.to_vec() {
                deep_freeze(&item);
            }
        }
        Value::Date(date) => date.freeze(),
        _ => {}
    }
    value.clone()
}
