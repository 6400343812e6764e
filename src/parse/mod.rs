//! Multi-stage recovery of structured values from candidate blocks.
//!
//! Stages run in a fixed order and the first success wins: strict JSON and the
//! permissive literal parser on the block as written, then cleanup followed by
//! strict JSON, permissive literal and quote repair on the cleaned text.

mod literal;

use serde_json::{Map, Value};

use crate::errors::ParseError;

pub use literal::parse_literal;

/// A single fallback strategy.
pub type ParseStage = fn(&str) -> Result<Value, ParseError>;

/// Strategies tried on the block before any cleanup, so string values keep
/// their escapes and inner whitespace.
pub const RAW_STAGES: &[(&str, ParseStage)] = &[
    ("strict", parse_strict),
    ("literal", parse_permissive),
];

/// Strategies tried after cleanup, in order.
pub const STAGES: &[(&str, ParseStage)] = &[
    ("strict", parse_strict),
    ("literal", parse_permissive),
    ("quote-repair", parse_quote_repaired),
];

/// Drop literal `\\n` and `\n` escape text and squeeze whitespace runs to one space.
pub fn clean_block(raw: &str) -> String {
    let without_escapes = raw.replace("\\\\n", "").replace("\\n", "");
    without_escapes.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn parse_strict(text: &str) -> Result<Value, ParseError> {
    Ok(serde_json::from_str(text)?)
}

/// Literal parse restricted to containers at the top level. Bare scalars such as
/// `'hello'` are left for the quote-repair stage.
pub fn parse_permissive(text: &str) -> Result<Value, ParseError> {
    let value = parse_literal(text)?;
    match value {
        Value::Object(_) | Value::Array(_) => Ok(value),
        other => Err(ParseError::Literal {
            offset: 0,
            message: format!("top-level {} literal is not a container", kind_of(&other)),
        }),
    }
}

pub fn parse_quote_repaired(text: &str) -> Result<Value, ParseError> {
    let inner = text
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .ok_or(ParseError::NotQuoted)?;
    parse_strict(&format!("\"{inner}\""))
}

/// Run the raw stages, then clean `raw` and run every stage until one succeeds.
/// The error of the first strict attempt is reported when all of them fail.
pub fn parse_block(raw: &str) -> Result<Value, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut first_err = None;
    for (_, stage) in RAW_STAGES {
        match stage(trimmed) {
            Ok(value) => return Ok(value),
            Err(err) => {
                first_err.get_or_insert(err);
            }
        }
    }

    let cleaned = clean_block(raw);
    if cleaned.is_empty() {
        return Err(ParseError::Empty);
    }
    for (_, stage) in STAGES {
        if let Ok(value) = stage(&cleaned) {
            return Ok(value);
        }
    }
    Err(first_err.unwrap_or(ParseError::Empty))
}

/// `parse_block`, keeping only mapping-shaped results.
pub fn parse_tool_call_value(raw: &str) -> Result<Map<String, Value>, ParseError> {
    match parse_block(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(ParseError::NotAMapping(kind_of(&other))),
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
