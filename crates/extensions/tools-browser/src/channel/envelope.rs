//! Typed envelope for page agent requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Page channel errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChannelError {
    /// No reply within the bound.
    #[error("page did not answer '{op}' within {ms} ms")]
    Timeout { op: String, ms: u64 },

    /// The surface has no live agent (closed tab, navigation in flight,
    /// permission denied).
    #[error("page unavailable: {0}")]
    Unavailable(String),

    /// The agent ran the op and reported a failure.
    #[error("{0}")]
    Script(String),

    /// The reply did not match the envelope.
    #[error("malformed page reply: {0}")]
    Protocol(String),
}

/// Request sent to the page agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    pub op: String,
    #[serde(default)]
    pub args: Value,
}

impl PageRequest {
    pub fn new(op: impl Into<String>, args: Value) -> Self {
        Self {
            op: op.into(),
            args,
        }
    }

    /// Request without arguments.
    pub fn op(op: impl Into<String>) -> Self {
        Self::new(op, Value::Object(Default::default()))
    }
}

/// Reply from the page agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResponse {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Marker the injected wrapper returns when `window.__tabpilot` is gone.
pub(crate) const UNAVAILABLE_MARKER: &str = "__tabpilot_unavailable__";

impl PageResponse {
    /// Parse a raw evaluation value into the result payload.
    pub fn into_result(value: Value) -> Result<Value, ChannelError> {
        let response: PageResponse = serde_json::from_value(value)
            .map_err(|e| ChannelError::Protocol(e.to_string()))?;
        if response.ok {
            return Ok(response.result.unwrap_or(Value::Null));
        }
        match response.error {
            Some(e) if e == UNAVAILABLE_MARKER => {
                Err(ChannelError::Unavailable("page agent not loaded".to_string()))
            }
            Some(e) => Err(ChannelError::Script(e)),
            None => Err(ChannelError::Script("page action failed".to_string())),
        }
    }
}
