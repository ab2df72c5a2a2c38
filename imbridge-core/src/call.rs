//! MethodCall — one invocation received from the UI channel.

use serde_json::{Map, Value};

use crate::error::{BridgeError, Result};

/// Key carrying the caller's operation identifier.
pub const OPERATION_ID: &str = "operationID";

/// A named method invocation with its string-keyed arguments.
///
/// Built fresh for every call; nothing here outlives the dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub arguments: Map<String, Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// Parse the argument map from JSON text.
    ///
    /// Empty input and `null` both mean "no arguments". Anything other than
    /// a JSON object is rejected.
    pub fn from_json(method: impl Into<String>, args_json: &str) -> Result<Self> {
        let method = method.into();
        let trimmed = args_json.trim();
        if trimmed.is_empty() {
            return Ok(Self::new(method, Map::new()));
        }
        let parsed: Value = serde_json::from_str(trimmed)
            .map_err(|e| BridgeError::invalid("arguments", format!("invalid JSON: {e}")))?;
        match parsed {
            Value::Null => Ok(Self::new(method, Map::new())),
            Value::Object(arguments) => Ok(Self::new(method, arguments)),
            other => Err(BridgeError::invalid(
                "arguments",
                format!("expected an object, got {}", type_name(&other)),
            )),
        }
    }

    /// Required string argument, borrowed verbatim.
    pub fn value(&self, key: &str) -> Result<&str> {
        match self.arguments.get(key) {
            None | Some(Value::Null) => Err(BridgeError::MissingArgument(key.to_string())),
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(BridgeError::invalid(
                key,
                format!("expected a string, got {}", type_name(other)),
            )),
        }
    }

    /// Required argument as JSON text.
    ///
    /// A string is taken to be JSON already and passed through untouched;
    /// any other value is serialized.
    pub fn json_value(&self, key: &str) -> Result<String> {
        match self.arguments.get(key) {
            None | Some(Value::Null) => Err(BridgeError::MissingArgument(key.to_string())),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Ok(other.to_string()),
        }
    }

    /// The whole argument map serialized as a JSON object.
    pub fn arguments_json(&self) -> String {
        Value::Object(self.arguments.clone()).to_string()
    }

    pub fn operation_id(&self) -> Result<&str> {
        self.value(OPERATION_ID)
    }

    pub fn has(&self, key: &str) -> bool {
        !matches!(self.arguments.get(key), None | Some(Value::Null))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
