//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

mod schema_browser;
mod schema_policy;

pub use schema_browser::*;
pub use schema_policy::*;

/// Shared default helper used by submodules.
pub(crate) fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub truncation: TruncationConfig,

    #[serde(default)]
    pub loop_detection: LoopDetectionConfig,

    #[serde(default)]
    pub approval: ApprovalConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub permissions: PermissionsConfig,
}

/// Generation backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    /// Preferred backend identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Alternates tried in order when the preferred backend keeps failing.
    #[serde(default = "default_fallback_models")]
    pub fallback_models: Vec<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            fallback_models: default_fallback_models(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ProviderConfig {
    /// Preferred model followed by the fallbacks, without duplicates.
    pub fn backend_chain(&self) -> Vec<String> {
        let mut chain = vec![self.model.clone()];
        for model in &self.fallback_models {
            if !chain.contains(model) {
                chain.push(model.clone());
            }
        }
        chain
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_fallback_models() -> Vec<String> {
    vec!["gemini-1.5-flash".to_string(), "gemini-1.5-pro".to_string()]
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_top_p() -> f32 {
    0.95
}

fn default_max_output_tokens() -> u32 {
    2048
}

fn default_request_timeout() -> u64 {
    60
}

/// Backoff settings for transient backend failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: true,
        }
    }
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8000
}

/// Session driver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum tool-executing rounds per user turn.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Character budget for carried conversation content.
    #[serde(default = "default_context_char_budget")]
    pub context_char_budget: usize,

    /// Most recent messages kept verbatim on the first compression attempt.
    #[serde(default = "default_keep_recent_turns")]
    pub keep_recent_turns: usize,

    /// Upper bound on the compressed digest length.
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,

    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            context_char_budget: default_context_char_budget(),
            keep_recent_turns: default_keep_recent_turns(),
            summary_max_chars: default_summary_max_chars(),
            system_prompt: None,
        }
    }
}

fn default_max_rounds() -> u32 {
    10
}

fn default_context_char_budget() -> usize {
    11_000
}

fn default_keep_recent_turns() -> usize {
    6
}

fn default_summary_max_chars() -> usize {
    1_500
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
