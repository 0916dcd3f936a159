//! Tool invocation errors.

use thiserror::Error;

/// Raised while validating a tool call at the dispatch boundary. Never
/// surfaces to the session driver: dispatchers turn it into an error result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Missing required argument '{argument}' for {tool}")]
    MissingArgument { tool: String, argument: String },

    #[error("Invalid argument '{argument}' for {tool}: {message}")]
    InvalidArgument {
        tool: String,
        argument: String,
        message: String,
    },

    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Tool execution timed out after {0} ms")]
    Timeout(u64),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("No active surface")]
    NoSurface,
}
