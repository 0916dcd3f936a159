//! Browser connection and page permission settings.

use serde::{Deserialize, Serialize};

use super::default_true;

/// Chrome connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    #[serde(default)]
    pub headless: bool,

    /// Profile directory for a launched Chrome. Accepts `~`.
    #[serde(default)]
    pub profile_dir: Option<String>,

    /// Timeout for a single page channel request.
    #[serde(default = "default_page_timeout")]
    pub page_timeout_secs: u64,

    /// Bound on post-action navigation reconciliation.
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,

    /// Launch Chrome when nothing listens on the debug port.
    #[serde(default = "default_true")]
    pub launch: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: default_debug_port(),
            headless: false,
            profile_dir: None,
            page_timeout_secs: default_page_timeout(),
            navigation_timeout_secs: default_navigation_timeout(),
            launch: true,
        }
    }
}

fn default_debug_port() -> u16 {
    9222
}

fn default_page_timeout() -> u64 {
    15
}

fn default_navigation_timeout() -> u64 {
    20
}

/// How origin grants are decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionMode {
    /// Grant every origin, logging a notice.
    #[default]
    Auto,
    /// Grant only listed origins.
    Allowlist,
}

/// Per-origin permission grants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionsConfig {
    #[serde(default)]
    pub mode: PermissionMode,

    #[serde(default)]
    pub origins: Vec<String>,

    #[serde(default)]
    pub denied_origins: Vec<String>,
}
