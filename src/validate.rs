use serde_json::Value;

use crate::parse::kind_of;
use crate::types::{Collected, RawToolCall, ToolCall};

/// Keep the records whose name is a non-empty string and whose arguments are a mapping.
/// Candidates carry the index of the block they were parsed from; every rejected
/// record leaves a diagnostic naming that block.
pub fn validate_tool_calls(
    candidates: impl IntoIterator<Item = (usize, RawToolCall)>,
) -> Collected<ToolCall> {
    let mut collected = Collected::default();

    for (block, candidate) in candidates {
        match into_tool_call(candidate) {
            Ok(call) => collected.push_item(call),
            Err(reason) => collected.push_diagnostic(format!("block {block} dropped: {reason}")),
        }
    }

    collected
}

fn into_tool_call(candidate: RawToolCall) -> Result<ToolCall, String> {
    let name = match candidate.name {
        Some(Value::String(name)) if !name.trim().is_empty() => name,
        Some(Value::String(_)) => return Err("name is empty".to_string()),
        Some(other) => return Err(format!("name is a {}, not a string", kind_of(&other))),
        None => return Err("name is missing".to_string()),
    };

    match candidate.arguments {
        Value::Object(arguments) => Ok(ToolCall::new(name, arguments)),
        other => Err(format!(
            "arguments for '{name}' are a {}, not a mapping",
            kind_of(&other)
        )),
    }
}
