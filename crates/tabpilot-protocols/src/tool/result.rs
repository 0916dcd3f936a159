//! Tool execution result types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of a tool execution.
///
/// Always carries an outcome indicator. Tool-specific fields are flattened
/// next to it so the serialized form is a single JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the execution was successful.
    pub success: bool,

    /// Error message if execution failed.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,

    /// Tool-specific payload.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl ToolResult {
    /// Create an empty successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
            data: Map::new(),
        }
    }

    /// Create a successful result from a JSON payload. Non-object payloads
    /// are stored under `result`.
    pub fn success_json(payload: Value) -> Self {
        let data = match payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                map
            }
        };
        Self {
            success: true,
            error: None,
            data,
        }
    }

    /// Create an error result.
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: Map::new(),
        }
    }

    /// Add a field to the payload.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Get a payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Get a payload field as a string slice.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    /// Serialize to a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({"success": false, "error": format!("unserializable result: {}", e)})
        })
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
