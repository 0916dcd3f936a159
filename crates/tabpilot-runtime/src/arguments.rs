//! Defensive parsing of model-supplied tool arguments.

use serde_json::{Map, Value};
use tracing::debug;

/// Normalize an argument payload into an object.
///
/// Objects pass through. Strings holding a JSON object (possibly encoded
/// twice) are decoded. Anything else degrades to an empty object.
pub fn parse_arguments(raw: &Value) -> Map<String, Value> {
    match raw {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        Value::String(s) => parse_encoded(s, 2),
        other => {
            debug!("Ignoring non-object tool arguments: {}", other);
            Map::new()
        }
    }
}

fn parse_encoded(s: &str, depth: u8) -> Map<String, Value> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => map,
        Ok(Value::String(inner)) if depth > 1 => parse_encoded(&inner, depth - 1),
        Ok(_) | Err(_) => {
            debug!("Malformed tool arguments degraded to empty set: {}", trimmed);
            Map::new()
        }
    }
}
