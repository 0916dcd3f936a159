//! Per-origin permission protocol.

use async_trait::async_trait;

/// Decision for one origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDecision {
    Granted,
    Denied,
}

impl PermissionDecision {
    pub fn is_granted(self) -> bool {
        matches!(self, PermissionDecision::Granted)
    }
}

/// Decides whether the page agent may be injected into an origin.
#[async_trait]
pub trait PermissionPolicy: Send + Sync {
    /// `origin` is `scheme://host[:port]`.
    async fn decide(&self, origin: &str) -> PermissionDecision;
}
