//! # tabpilot runtime
//!
//! The model session driver: budget compression, backend fallback with
//! retry, defensive argument parsing, loop detection, approval and
//! sequential tool execution under a round budget.

pub mod approval;
pub mod arguments;
pub mod compression;
pub mod loop_detector;
pub mod retry;
pub mod session_driver;
pub mod state;
pub mod truncate;

pub use approval::{
    AutoApprove, ChannelApprovalGate, PendingApproval, PromptApprovalGate, TimeoutGate,
};
pub use arguments::parse_arguments;
pub use compression::{
    CompressionConfig, Compressed, ContextCompressor, LLMSummarizer, Summarizer, SUMMARY_LABEL,
};
pub use loop_detector::{call_signature, LoopPolicy, LoopVerdict};
pub use retry::{BackendFallback, RetryConfig};
pub use session_driver::{SessionDriver, SessionOutcome, DEFAULT_SYSTEM_PROMPT};
pub use state::{DriverState, SessionState};
pub use truncate::{truncate_value, TruncationLimits};
