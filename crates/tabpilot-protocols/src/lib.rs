//! # Tabpilot Protocols
//!
//! Core protocol definitions shared by the session runtime, the generation
//! backends and the browser tools. Contains only interface definitions and
//! plain data types.
//!
//! ## Core Traits
//!
//! - [`LLMProvider`] - A generation backend
//! - [`ToolExecutor`] - Something that executes model-requested tool calls
//! - [`ApprovalGate`] - Human confirmation of a batch of tool calls
//! - [`PermissionPolicy`] - Per-origin grant decisions for page access

pub mod approval;
pub mod error;
pub mod permission;
pub mod provider;
pub mod tool;
pub mod types;

pub use approval::{ApprovalGate, ApprovalRequest};
pub use error::{ProviderError, SessionError, ToolError};
pub use permission::{PermissionDecision, PermissionPolicy};
pub use provider::{CompletionRequest, CompletionResponse, LLMProvider};
pub use tool::{DispatchOutcome, SurfaceId, ToolDeclaration, ToolExecutor, ToolResult};
pub use types::*;
