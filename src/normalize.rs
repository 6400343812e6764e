use serde_json::{Map, Value};

use crate::types::RawToolCall;

const NAME_KEY: &str = "name";
const ARGUMENTS_KEY: &str = "arguments";

/// Reshape any mapping into a `{name, arguments}` record.
///
/// Depth-first over nested mappings (not sequences), in key order. The first `name`
/// key claims the name; the first `arguments` key claims the arguments while they are
/// still empty. Models that nest the call inside a wrapper, or flatten parameters next
/// to the name, end up in the same canonical shape.
pub fn normalize(data: &Map<String, Value>) -> RawToolCall {
    let mut name: Option<Value> = None;
    let mut arguments = Value::Object(Map::new());

    let mut stack = vec![data.iter()];
    while let Some(entries) = stack.last_mut() {
        let Some((key, value)) = entries.next() else {
            stack.pop();
            continue;
        };

        if key == NAME_KEY && name.is_none() {
            name = Some(value.clone()).filter(|v| !v.is_null());
        } else if key == ARGUMENTS_KEY && is_empty(&arguments) {
            arguments = value.clone();
        } else if let Value::Object(nested) = value {
            stack.push(nested.iter());
        }

        if name.is_some() && !is_empty(&arguments) {
            break;
        }
    }

    if name.is_none() {
        if let Value::Object(args) = &mut arguments {
            if let Some(inner_name) = args.shift_remove(NAME_KEY) {
                name = Some(inner_name).filter(|v| !v.is_null());
            }
        }
    }

    if is_empty(&arguments) {
        arguments = Value::Object(
            data.iter()
                .filter(|(k, _)| k.as_str() != NAME_KEY && k.as_str() != ARGUMENTS_KEY)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );
    }

    RawToolCall { name, arguments }
}

/// Emptiness in the loose sense models rely on: null, false, zero, "" and empty containers.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
