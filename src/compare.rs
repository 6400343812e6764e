use serde_json::{Map, Number, Value};

use crate::types::Status;

/// Compare generated arguments to the expected ones. Any missing, extra or unequal
/// key fails the whole comparison.
pub fn compare_arguments(generated: &Map<String, Value>, expected: &Map<String, Value>) -> Status {
    Status::from_bool(maps_equal(generated, expected))
}

/// Type-aware deep equality.
///
/// Numbers compare by value across integer and float representations, strings compare
/// trimmed and case-sensitive, mappings ignore key order, sequences respect order.
pub fn values_equal(generated: &Value, expected: &Value) -> bool {
    match (generated, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::String(a), Value::String(b)) => a.trim() == b.trim(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => maps_equal(a, b),
        _ => false,
    }
}

fn maps_equal(generated: &Map<String, Value>, expected: &Map<String, Value>) -> bool {
    if generated.len() != expected.len() {
        return false;
    }
    expected.iter().all(|(key, want)| {
        generated
            .get(key)
            .is_some_and(|got| values_equal(got, want))
    })
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    // Exact integer path first so large values don't lose precision through f64.
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cmp(generated: Value, expected: Value) -> Status {
        compare_arguments(
            generated.as_object().unwrap(),
            expected.as_object().unwrap(),
        )
    }

    #[test]
    fn integer_equals_float_of_same_value() {
        assert_eq!(cmp(json!({"x": 5}), json!({"x": 5.0})), Status::Passed);
        assert_eq!(cmp(json!({"x": 5}), json!({"x": 5.5})), Status::Failed);
    }

    #[test]
    fn sequence_order_matters() {
        assert_eq!(cmp(json!({"x": [1, 2]}), json!({"x": [2, 1]})), Status::Failed);
        assert_eq!(cmp(json!({"x": [1, 2]}), json!({"x": [1, 2]})), Status::Passed);
        assert_eq!(cmp(json!({"x": [1]}), json!({"x": [1, 1]})), Status::Failed);
    }

    #[test]
    fn mapping_order_does_not_matter() {
        assert_eq!(
            cmp(json!({"x": {"a": 1, "b": 2}}), json!({"x": {"b": 2, "a": 1}})),
            Status::Passed
        );
    }

    #[test]
    fn strings_are_trimmed_but_case_sensitive() {
        assert_eq!(cmp(json!({"city": " Paris\n"}), json!({"city": "Paris"})), Status::Passed);
        assert_eq!(cmp(json!({"city": "paris"}), json!({"city": "Paris"})), Status::Failed);
    }

    #[test]
    fn missing_or_extra_keys_fail() {
        assert_eq!(cmp(json!({}), json!({"a": 1})), Status::Failed);
        assert_eq!(cmp(json!({"a": 1, "b": 2}), json!({"a": 1})), Status::Failed);
        assert_eq!(cmp(json!({"b": 1}), json!({"a": 1})), Status::Failed);
    }

    #[test]
    fn kinds_never_coerce() {
        assert_eq!(cmp(json!({"a": "5"}), json!({"a": 5})), Status::Failed);
        assert_eq!(cmp(json!({"a": null}), json!({"a": ""})), Status::Failed);
        assert_eq!(cmp(json!({"a": 1}), json!({"a": true})), Status::Failed);
    }

    #[test]
    fn large_integers_compare_exactly() {
        assert!(!values_equal(&json!(9007199254740993_i64), &json!(9007199254740992_i64)));
        assert!(values_equal(&json!(u64::MAX), &json!(u64::MAX)));
        assert!(values_equal(&json!(-3), &json!(-3.0)));
    }

    #[test]
    fn empty_maps_are_equal() {
        assert_eq!(cmp(json!({}), json!({})), Status::Passed);
    }
}
