//! Merging partial updates and re-hydrating plain data.

use crate::value::{Array, Date, Object, Value};

/// Merge `source` into `target`, producing a new graph.
///
/// Nested plain objects present on both sides merge key by key; arrays,
/// dates and primitives from `source` replace what `target` holds. The result
/// keeps `target`'s class tag. Neither input is modified.
pub fn merge_objects(target: &Value, source: &Value) -> Value {
    match (target, source) {
        (Value::Object(t), Value::Object(s)) => {
            let mut fields = t.fields();
            for (key, incoming) in s.entries() {
                let merged = match fields.get(&key) {
                    Some(existing) if existing.is_plain_object() && incoming.is_plain_object() => {
                        merge_objects(existing, &incoming)
                    }
                    _ => incoming,
                };
                fields.insert(key, merged);
            }
            Value::Object(Object::from_parts(t.class(), fields))
        }
        (_, source) => source.clone(),
    }
}

/// Re-hydrate plain `value` into the shape of `template`.
///
/// Class tags from template objects are copied onto the matching objects of
/// `value`, arrays are handled element-wise (falling back to the template's
/// first element), and strings or numbers sitting where the template holds a
/// date are turned back into dates. Data absent from the template is kept
/// as is.
pub fn instance_handler(template: &Value, value: Value) -> Value {
    match (template, value) {
        (Value::Object(t), Value::Object(v)) => {
            let class = t.class().or_else(|| v.class());
            let fields = v
                .entries()
                .into_iter()
                .map(|(key, field)| {
                    let field = match t.get(&key) {
                        Some(shape) => instance_handler(&shape, field),
                        None => field,
                    };
                    (key, field)
                })
                .collect();
            Value::Object(Object::from_parts(class, fields))
        }
        (Value::Array(t), Value::Array(v)) => {
            let shapes = t.to_vec();
            let items = v
                .to_vec()
                .into_iter()
                .enumerate()
                .map(|(i, item)| match shapes.get(i).or_else(|| shapes.first()) {
                    Some(shape) => instance_handler(shape, item),
                    None => item,
                })
                .collect();
            Value::Array(Array::from_vec(items))
        }
        (Value::Date(_), Value::String(s)) => match Date::parse_rfc3339(&s) {
            Some(date) => Value::Date(date),
            None => Value::String(s),
        },
        (Value::Date(_), Value::Number(n)) if n.is_finite() => {
            Value::Date(Date::from_millis(n as i64))
        }
        (_, value) => value,
    }
}
