use serde_json::{Map, Value};

use crate::errors::EvalError;
use crate::parse::kind_of;
use crate::types::ToolCall;

/// Type category a parameter value must fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
    Any,
}

impl ParamType {
    /// JSON-schema names plus the Python spellings tool specs are often written with.
    pub fn from_type_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => ParamType::String,
            "number" | "float" | "double" => ParamType::Number,
            "integer" | "int" => ParamType::Integer,
            "boolean" | "bool" => ParamType::Boolean,
            "array" | "list" | "tuple" => ParamType::Array,
            "object" | "dict" => ParamType::Object,
            "null" | "none" => ParamType::Null,
            _ => ParamType::Any,
        }
    }

    pub fn matches(self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Integer => match value {
                Value::Number(n) => {
                    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
                }
                _ => false,
            },
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
            ParamType::Null => value.is_null(),
            ParamType::Any => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
            ParamType::Null => "null",
            ParamType::Any => "any",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    /// Accepted categories; a union type lists several.
    pub types: Vec<ParamType>,
    pub required: bool,
}

impl ParamSpec {
    pub fn accepts(&self, value: &Value) -> bool {
        self.types.is_empty() || self.types.iter().any(|ty| ty.matches(value))
    }

    /// Declared categories as written in diagnostics, e.g. `string or null`.
    pub fn expected(&self) -> String {
        if self.types.is_empty() {
            return ParamType::Any.as_str().to_string();
        }
        self.types
            .iter()
            .map(|ty| ty.as_str())
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSchema {
    pub params: Vec<ParamSpec>,
    pub additional_properties: bool,
}

impl Default for ParameterSchema {
    fn default() -> Self {
        Self {
            params: Vec::new(),
            additional_properties: true,
        }
    }
}

impl ParameterSchema {
    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Accepts JSON-schema objects (`properties`/`required`) and flat
    /// `{param: {type, required}}` maps.
    pub fn from_value(tool: &str, value: &Value) -> Result<Self, EvalError> {
        let obj = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(obj) => obj,
            _ => {
                return Err(EvalError::InvalidToolSpec(format!(
                    "parameters of '{tool}' must be a mapping"
                )));
            }
        };

        if let Some(properties) = obj.get("properties") {
            return Self::from_json_schema(tool, obj, properties);
        }
        if obj.get("type").and_then(Value::as_str) == Some("object") {
            return Self::from_json_schema(tool, obj, &Value::Object(Map::new()));
        }
        Self::from_flat(tool, obj)
    }

    fn from_json_schema(
        tool: &str,
        schema: &Map<String, Value>,
        properties: &Value,
    ) -> Result<Self, EvalError> {
        let properties = properties.as_object().ok_or_else(|| {
            EvalError::InvalidToolSpec(format!("properties of '{tool}' must be a mapping"))
        })?;

        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut params = Vec::new();
        for (name, prop) in properties {
            let prop = prop.as_object().ok_or_else(|| {
                EvalError::InvalidToolSpec(format!("property '{name}' of '{tool}' must be a mapping"))
            })?;
            let flagged = prop.get("required").and_then(Value::as_bool).unwrap_or(false);
            params.push(ParamSpec {
                name: name.clone(),
                types: declared_types(prop),
                required: flagged || required.contains(&name.as_str()),
            });
        }

        // Required names without a property entry still have to be present.
        for name in required {
            if !properties.contains_key(name) {
                params.push(ParamSpec {
                    name: name.to_string(),
                    types: Vec::new(),
                    required: true,
                });
            }
        }

        let additional_properties = schema
            .get("additionalProperties")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        Ok(Self {
            params,
            additional_properties,
        })
    }

    fn from_flat(tool: &str, obj: &Map<String, Value>) -> Result<Self, EvalError> {
        let mut params = Vec::new();
        for (name, prop) in obj {
            let prop = prop.as_object().ok_or_else(|| {
                EvalError::InvalidToolSpec(format!("parameter '{name}' of '{tool}' must be a mapping"))
            })?;
            params.push(ParamSpec {
                name: name.clone(),
                types: declared_types(prop),
                required: prop.get("required").and_then(Value::as_bool).unwrap_or(false),
            });
        }
        Ok(Self {
            params,
            additional_properties: true,
        })
    }
}

fn declared_types(prop: &Map<String, Value>) -> Vec<ParamType> {
    let types: Vec<ParamType> = match prop.get("type") {
        Some(Value::String(name)) => vec![ParamType::from_type_name(name)],
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .map(ParamType::from_type_name)
            .collect(),
        _ => Vec::new(),
    };
    if types.contains(&ParamType::Any) {
        return Vec::new();
    }
    types
}

/// A callable tool as offered to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    pub parameters: ParameterSchema,
}

impl ToolSpec {
    /// Accepts `{name, parameters}` or the `{"type": "function", "function": {..}}` wrapper.
    pub fn from_value(value: &Value) -> Result<Self, EvalError> {
        let obj = value
            .as_object()
            .ok_or_else(|| EvalError::InvalidToolSpec("tool spec must be a mapping".to_string()))?;

        let obj = match obj.get("function") {
            Some(Value::Object(function)) => function,
            _ => obj,
        };

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| EvalError::InvalidToolSpec("tool spec is missing a name".to_string()))?
            .to_string();

        let description = obj
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);

        let parameters =
            ParameterSchema::from_value(&name, obj.get("parameters").unwrap_or(&Value::Null))?;

        Ok(Self {
            name,
            description,
            parameters,
        })
    }
}

/// Parse a tool list given as an array, a single spec, or a JSON-encoded string of either.
pub fn parse_tool_specs(value: &Value) -> Result<Vec<ToolSpec>, EvalError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(encoded) => {
            if encoded.trim().is_empty() {
                return Ok(Vec::new());
            }
            let decoded: Value = serde_json::from_str(encoded)?;
            if decoded.is_string() {
                return Err(EvalError::InvalidToolSpec(
                    "tool list is doubly encoded".to_string(),
                ));
            }
            parse_tool_specs(&decoded)
        }
        Value::Array(items) => items.iter().map(ToolSpec::from_value).collect(),
        Value::Object(_) => Ok(vec![ToolSpec::from_value(value)?]),
        _ => Err(EvalError::InvalidToolSpec(
            "tool list must be an array of mappings".to_string(),
        )),
    }
}

/// Outcome of checking one call against the available tool specs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaCheck {
    pub valid: bool,
    pub reason: Option<String>,
}

impl SchemaCheck {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn failed(reasons: Vec<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reasons.join("; ")),
        }
    }
}

pub fn validate_call(call: &ToolCall, specs: &[ToolSpec]) -> SchemaCheck {
    let Some(spec) = specs.iter().find(|s| call.name == s.name.as_str()) else {
        return SchemaCheck::failed(vec![format!("unknown tool: {}", call.name)]);
    };

    let schema = &spec.parameters;
    let mut reasons = Vec::new();

    for param in schema.params.iter().filter(|p| p.required) {
        if !call.arguments.contains_key(&param.name) {
            reasons.push(format!("missing required parameter {}", param.name));
        }
    }

    for (name, value) in &call.arguments {
        match schema.get(name) {
            Some(param) if !param.accepts(value) => {
                reasons.push(format!(
                    "type mismatch on {name}: expected {}, got {}",
                    param.expected(),
                    kind_of(value)
                ));
            }
            Some(_) => {}
            None if !schema.additional_properties => {
                reasons.push(format!("unexpected parameter {name}"));
            }
            None => {}
        }
    }

    if reasons.is_empty() {
        SchemaCheck::ok()
    } else {
        SchemaCheck::failed(reasons)
    }
}
