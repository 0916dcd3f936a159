//! Completion response types.

use serde::{Deserialize, Serialize};

use crate::types::{Message, Metadata, StopReason, ToolCall, Usage};

/// Response from a completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Unique ID for this completion.
    pub id: String,

    /// Backend identifier that produced the answer.
    pub model: String,

    /// The assistant's response message.
    pub message: Message,

    /// Reason for stopping.
    pub stop_reason: StopReason,

    /// Token usage.
    pub usage: Usage,

    /// Additional metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

impl CompletionResponse {
    /// Free text of the answer.
    pub fn text(&self) -> &str {
        &self.message.content
    }

    /// Structured tool-call requests in the answer.
    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.message.tool_calls
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
