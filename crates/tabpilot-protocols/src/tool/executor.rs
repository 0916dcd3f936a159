//! Tool executor trait.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ToolDeclaration, ToolResult};

/// Handle to an addressable page/tab that surface-local tools act upon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub String);

impl SurfaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a dispatch plus an optional surface reassignment.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub result: ToolResult,
    /// Set when the tool created or switched to another surface. The caller
    /// must address subsequent calls to it.
    pub surface: Option<SurfaceId>,
}

impl DispatchOutcome {
    pub fn new(result: ToolResult) -> Self {
        Self {
            result,
            surface: None,
        }
    }

    pub fn with_surface(mut self, surface: SurfaceId) -> Self {
        self.surface = Some(surface);
        self
    }
}

impl From<ToolResult> for DispatchOutcome {
    fn from(result: ToolResult) -> Self {
        Self::new(result)
    }
}

/// Executes model-requested tool calls.
///
/// Implementations never fail: every problem is reported as an error
/// [`ToolResult`].
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// The immutable tool catalog.
    fn declarations(&self) -> &[ToolDeclaration];

    /// The surface a new session should start on, if any.
    async fn initial_surface(&self) -> Option<SurfaceId>;

    /// Execute one tool call against the target surface.
    async fn dispatch(
        &self,
        name: &str,
        args: &Map<String, Value>,
        target: Option<&SurfaceId>,
    ) -> DispatchOutcome;
}
