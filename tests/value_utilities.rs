//! Property tests for the clone, freeze, compare and merge utilities.

use proptest::prelude::*;
use serde_json::json;
use snapstore::{
    advanced_equals, compare, count_object_changes, deep_clone, deep_freeze, instance_handler,
    merge_objects, simple_clone, simple_equals, strict_equals, Date, ObjectCompareType, Value,
};

fn arb_json() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::Bool),
        (-1000i64..1000).prop_map(|n| json!(n)),
        "[a-z]{0,8}".prop_map(serde_json::Value::String),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
        ]
    })
}

fn arb_object() -> impl Strategy<Value = serde_json::Value> {
    prop::collection::btree_map("[a-z]{1,4}", arb_json(), 0..5)
        .prop_map(|m| serde_json::Value::Object(m.into_iter().collect()))
}

/// Every node reachable from `value`.
fn nodes(value: &Value) -> Vec<Value> {
    let mut out = Vec::new();
    let mut stack = vec![value.clone()];
    while let Some(next) = stack.pop() {
        match &next {
            Value::Object(o) => stack.extend(o.entries().into_iter().map(|(_, v)| v)),
            Value::Array(a) => stack.extend(a.to_vec()),
            _ => {}
        }
        if next.is_object_like() {
            out.push(next);
        }
    }
    out
}

proptest! {
    #[test]
    fn test_json_round_trip(json in arb_json()) {
        prop_assert_eq!(Value::from(json.clone()).to_json(), json);
    }

    #[test]
    fn test_deep_clone_is_equal_and_disjoint(json in arb_json()) {
        let original = Value::from(json);
        let copy = deep_clone(&original);

        prop_assert!(advanced_equals(&original, &copy));
        prop_assert_eq!(count_object_changes(&original, &copy), 0);
        for a in nodes(&original) {
            for b in nodes(&copy) {
                prop_assert!(!a.ptr_eq(&b));
            }
        }
    }

    #[test]
    fn test_deep_freeze_reaches_every_node(json in arb_json()) {
        let value = Value::from(json);
        let frozen = deep_freeze(&value);

        prop_assert!(frozen.ptr_eq(&value));
        for node in nodes(&value) {
            prop_assert!(node.is_frozen());
        }
        // Copies of a frozen graph are mutable again.
        for node in nodes(&deep_clone(&value)) {
            prop_assert!(!node.is_frozen());
        }
    }

    #[test]
    fn test_compare_strategies_are_ordered(json in arb_json()) {
        let value = Value::from(json);
        let shallow = simple_clone(&value);
        let deep = deep_clone(&value);

        for strategy in [
            ObjectCompareType::Reference,
            ObjectCompareType::Simple,
            ObjectCompareType::Advanced,
        ] {
            prop_assert!(compare(strategy, &value, &value));
        }
        // A shallow copy shares children, so only the top level differs.
        prop_assert!(simple_equals(&value, &shallow));
        prop_assert!(advanced_equals(&value, &deep));
        if value.is_object_like() {
            prop_assert!(!strict_equals(&value, &shallow));
        }
    }

    #[test]
    fn test_merge_with_empty_is_identity(json in arb_object()) {
        let value = Value::from(json);
        let merged = merge_objects(&value, &Value::object());
        prop_assert!(advanced_equals(&merged, &value));
        prop_assert!(!merged.ptr_eq(&value));
    }

    #[test]
    fn test_merge_with_self_is_identity(json in arb_object()) {
        let value = Value::from(json);
        prop_assert!(advanced_equals(&merge_objects(&value, &value), &value));
    }

    #[test]
    fn test_merge_keeps_every_key(a in arb_object(), b in arb_object()) {
        let (target, source) = (Value::from(a), Value::from(b));
        let merged = merge_objects(&target, &source);
        let merged = merged.as_object().unwrap();

        for key in target.as_object().unwrap().keys() {
            prop_assert!(merged.contains_key(&key));
        }
        for (key, incoming) in source.as_object().unwrap().entries() {
            if !incoming.is_plain_object() {
                prop_assert!(advanced_equals(&merged.get(&key).unwrap(), &incoming));
            }
        }
    }

    #[test]
    fn test_instance_handler_keeps_plain_data(json in arb_json()) {
        let value = Value::from(json);
        let template = deep_clone(&value);
        prop_assert!(advanced_equals(&instance_handler(&template, deep_clone(&value)), &value));
    }
}

// --- Examples ---

#[test]
fn test_dates_compare_by_time() {
    let a = Value::from(Date::from_millis(1_000));
    let b = Value::from(Date::from_millis(1_000));
    assert!(!strict_equals(&a, &b));
    assert!(simple_equals(&a, &b));
    assert!(advanced_equals(&a, &b));
}

#[test]
fn test_merge_does_not_touch_inputs() {
    let target = deep_freeze(&Value::from(json!({"wind": {"speed": 5}, "tags": ["a"]})));
    let source = Value::from(json!({"wind": {"gusts": 9}, "tags": ["b", "c"]}));

    let merged = merge_objects(&target, &source);
    assert_eq!(
        merged,
        Value::from(json!({"wind": {"speed": 5, "gusts": 9}, "tags": ["b", "c"]}))
    );
    assert_eq!(
        target,
        Value::from(json!({"wind": {"speed": 5}, "tags": ["a"]}))
    );
    assert!(!merged.is_frozen());
}

#[test]
fn test_count_object_changes() {
    let a = Value::from(json!({"a": 1, "b": {"c": 2, "d": 3}, "e": [1, 2]}));
    let b = Value::from(json!({"a": 1, "b": {"c": 5, "d": 3}, "e": [1, 2, 3], "f": true}));
    assert_eq!(count_object_changes(&a, &b), 3);
}

#[test]
fn test_instance_handler_restores_dates_in_arrays() {
    let template = Value::from(vec![Value::from(Date::from_millis(0))]);
    let plain = Value::from(json!(["1970-01-01T00:00:01.000Z", 2000]));

    let hydrated = instance_handler(&template, plain);
    let first = hydrated.at(0).unwrap();
    let second = hydrated.at(1).unwrap();
    assert_eq!(first.as_date().unwrap().get_time(), 1_000);
    assert_eq!(second.as_date().unwrap().get_time(), 2_000);
}
