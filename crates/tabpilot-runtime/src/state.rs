//! Per-process session state.

use tabpilot_protocols::SurfaceId;

/// Phases of the session driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    AwaitingModel,
    ToolsRequested,
    FinalAnswer,
    ApprovalPending,
    ExecutingTools,
    Done,
    Failed,
}

impl DriverState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DriverState::Done | DriverState::Failed)
    }
}

/// Mutable state of the single active session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Set while an approval request awaits a decision.
    pub pending_approval_id: Option<String>,
    pub last_call_signature: Option<String>,
    pub repeat_count: u32,
    /// The surface page-local tools are addressed to.
    pub current_target_surface: Option<SurfaceId>,
}

impl SessionState {
    /// Reset at the start of a user turn. The target surface carries over.
    pub fn reset_for_turn(&mut self) {
        self.pending_approval_id = None;
        self.last_call_signature = None;
        self.repeat_count = 0;
    }

    /// Record a round's call signature and return the repeat count.
    pub fn record_signature(&mut self, signature: String) -> u32 {
        if self.last_call_signature.as_deref() == Some(signature.as_str()) {
            self.repeat_count += 1;
        } else {
            self.repeat_count = 0;
            self.last_call_signature = Some(signature);
        }
        self.repeat_count
    }
}
