//! Approval gate protocol.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::ToolCall;

/// A batch of proposed tool calls awaiting a human decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Identifier recorded in session state while the decision is pending.
    pub id: String,
    pub calls: Vec<ToolCall>,
}

impl ApprovalRequest {
    pub fn new(id: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            id: id.into(),
            calls,
        }
    }

    /// One line per call, for display.
    pub fn describe(&self) -> String {
        self.calls
            .iter()
            .map(|c| format!("{}({})", c.name, c.arguments))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Pause point where a human confirms a batch of tool calls.
///
/// Implementations must bound their wait and treat a timeout as a decline.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    async fn request_approval(&self, request: &ApprovalRequest) -> bool;
}
