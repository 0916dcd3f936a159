//! Truncation, loop-detection and approval policy settings.

use serde::{Deserialize, Serialize};

/// Smallest string limit that still leaves room for a truncation marker.
pub const MIN_TRUNCATION_STRING_CHARS: usize = 40;

/// Bounds applied to every tool result before it re-enters model context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruncationConfig {
    #[serde(default = "default_max_string_chars")]
    pub max_string_chars: usize,

    #[serde(default = "default_max_array_items")]
    pub max_array_items: usize,

    #[serde(default = "default_max_object_keys")]
    pub max_object_keys: usize,
}

impl Default for TruncationConfig {
    fn default() -> Self {
        Self {
            max_string_chars: default_max_string_chars(),
            max_array_items: default_max_array_items(),
            max_object_keys: default_max_object_keys(),
        }
    }
}

fn default_max_string_chars() -> usize {
    4_000
}

fn default_max_array_items() -> usize {
    40
}

fn default_max_object_keys() -> usize {
    40
}

/// Repeated-plan thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopDetectionConfig {
    /// Repeats tolerated when every call belongs to the browsing workflow.
    #[serde(default = "default_workflow_threshold")]
    pub workflow_threshold: u32,

    /// Repeats tolerated for anything else.
    #[serde(default = "default_threshold")]
    pub default_threshold: u32,

    #[serde(default = "default_workflow_tools")]
    pub workflow_tools: Vec<String>,
}

impl Default for LoopDetectionConfig {
    fn default() -> Self {
        Self {
            workflow_threshold: default_workflow_threshold(),
            default_threshold: default_threshold(),
            workflow_tools: default_workflow_tools(),
        }
    }
}

fn default_workflow_threshold() -> u32 {
    4
}

fn default_threshold() -> u32 {
    2
}

fn default_workflow_tools() -> Vec<String> {
    [
        "searchWeb",
        "getSearchResults",
        "clickSearchResultByDomain",
        "extractText",
        "autoExtractAfterNavigation",
        "navigate",
        "getLinksOnPage",
        "waitForSelector",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Human approval settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalConfig {
    #[serde(default)]
    pub auto_approve: bool,

    /// Seconds to wait for a decision before declining.
    #[serde(default = "default_approval_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            auto_approve: false,
            timeout_secs: default_approval_timeout(),
        }
    }
}

fn default_approval_timeout() -> u64 {
    120
}
