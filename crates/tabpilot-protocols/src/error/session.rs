//! Terminal session errors.

use thiserror::Error;

use super::ProviderError;

/// Errors that end a user turn. Everything more local than these is absorbed
/// by the component that hit it.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("The proposed actions were declined")]
    Declined,

    #[error("All backends failed after {attempts} attempts: {last}")]
    BackendsExhausted { attempts: u32, last: ProviderError },

    #[error("Backend error: {0}")]
    Provider(ProviderError),

    #[error("No answer after {rounds} rounds: {reason}")]
    RoundBudgetExhausted { rounds: u32, reason: String },

    #[error("The model returned an empty response")]
    EmptyResponse,
}

impl SessionError {
    /// Message suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Declined => "Okay, I did not run those actions.".to_string(),
            SessionError::BackendsExhausted { .. } => {
                "The model service is unavailable right now. Please try again later.".to_string()
            }
            SessionError::Provider(ProviderError::AuthenticationFailed(_)) => {
                "The API key was rejected. Check the provider api_key setting.".to_string()
            }
            other => other.to_string(),
        }
    }
}
