use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolName(String);

impl ToolName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ToolName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ToolName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleId(String);

impl SampleId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record straight out of the normalizer. Neither field has been type-checked yet.
#[derive(Clone, Debug, PartialEq)]
pub struct RawToolCall {
    pub name: Option<Value>,
    pub arguments: Value,
}

impl RawToolCall {
    /// Same `{name, arguments}` object the normalizer would accept as input.
    pub fn to_value(&self) -> Value {
        let mut record = Map::new();
        record.insert(
            "name".to_string(),
            self.name.clone().unwrap_or(Value::Null),
        );
        record.insert("arguments".to_string(), self.arguments.clone());
        Value::Object(record)
    }
}

/// Canonical, structurally valid tool call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: ToolName,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: ToolName::new(name),
            arguments,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "name": self.name.as_str(),
            "arguments": Value::Object(self.arguments.clone()),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Passed,
    Failed,
}

impl Status {
    pub fn is_passed(self) -> bool {
        self == Status::Passed
    }

    pub fn from_bool(passed: bool) -> Self {
        if passed { Status::Passed } else { Status::Failed }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Passed => f.write_str("passed"),
            Status::Failed => f.write_str("failed"),
        }
    }
}

/// Valid items plus a diagnostic for every item that was dropped along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected<T> {
    pub items: Vec<T>,
    pub diagnostics: Vec<String>,
}

impl<T> Default for Collected<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

impl<T> Collected<T> {
    pub fn push_item(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn push_diagnostic(&mut self, diagnostic: impl Into<String>) {
        self.diagnostics.push(diagnostic.into());
    }
}
