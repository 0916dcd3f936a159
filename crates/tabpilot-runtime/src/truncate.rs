//! Size bounds for tool results re-entering model context.
//!
//! Every elision leaves a marker stating how much was cut. Output already
//! within bounds passes through unchanged, so truncation is idempotent.

use serde_json::{Map, Value};

use tabpilot_config::{TruncationConfig, MIN_TRUNCATION_STRING_CHARS};

/// Key added to objects that lost keys.
pub const OMITTED_KEYS_FIELD: &str = "_omitted_keys";

/// Keys kept first when an object is cut, so the outcome indicator survives.
const PRIORITY_KEYS: &[&str] = &["success", "ok", "error"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationLimits {
    pub max_string_chars: usize,
    pub max_array_items: usize,
    pub max_object_keys: usize,
}

impl Default for TruncationLimits {
    fn default() -> Self {
        Self::from(&TruncationConfig::default())
    }
}

impl From<&TruncationConfig> for TruncationLimits {
    fn from(config: &TruncationConfig) -> Self {
        Self {
            max_string_chars: config.max_string_chars.max(MIN_TRUNCATION_STRING_CHARS),
            max_array_items: config.max_array_items.max(1),
            max_object_keys: config.max_object_keys.max(1),
        }
    }
}

/// Bound every string, array and object inside `value`.
pub fn truncate_value(value: &Value, limits: &TruncationLimits) -> Value {
    match value {
        Value::String(s) => Value::String(truncate_str(s, limits.max_string_chars)),
        Value::Array(items) => truncate_array(items, limits),
        Value::Object(map) => truncate_object(map, limits),
        other => other.clone(),
    }
}

/// Cut `s` to at most `max_chars` characters, marker included. Limits below
/// [`MIN_TRUNCATION_STRING_CHARS`] are raised to it so a marker always fits.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    let max_chars = max_chars.max(MIN_TRUNCATION_STRING_CHARS);
    let total = s.chars().count();
    if total <= max_chars {
        return s.to_string();
    }

    // Size the marker for the worst case so the final one never overflows.
    let reserve = marker(total).chars().count();
    let keep = max_chars.saturating_sub(reserve);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(&marker(total - keep));
    out
}

fn marker(cut: usize) -> String {
    format!("…[truncated {} chars]", cut)
}

fn truncate_array(items: &[Value], limits: &TruncationLimits) -> Value {
    if items.len() <= limits.max_array_items {
        return Value::Array(items.iter().map(|v| truncate_value(v, limits)).collect());
    }

    let keep = limits.max_array_items - 1;
    let mut out: Vec<Value> = items[..keep]
        .iter()
        .map(|v| truncate_value(v, limits))
        .collect();
    let note = format!("[{} more items omitted]", items.len() - keep);
    out.push(Value::String(note));
    Value::Array(out)
}

fn truncate_object(map: &Map<String, Value>, limits: &TruncationLimits) -> Value {
    if map.len() <= limits.max_object_keys {
        return Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), truncate_value(v, limits)))
                .collect(),
        );
    }

    let keep = limits.max_object_keys - 1;
    let is_priority = |k: &String| PRIORITY_KEYS.contains(&k.as_str());
    let ordered = map
        .iter()
        .filter(|(k, _)| is_priority(*k))
        .chain(map.iter().filter(|(k, _)| !is_priority(*k)));

    let mut out = Map::new();
    for (key, value) in ordered.take(keep) {
        out.insert(key.clone(), truncate_value(value, limits));
    }
    let note = format!("{} keys omitted", map.len() - keep);
    out.insert(OMITTED_KEYS_FIELD.to_string(), Value::String(note));
    Value::Object(out)
}
