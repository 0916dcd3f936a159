//! Surface registry type definitions and configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use tabpilot_config::{BrowserConfig, ConfigLoader};
use tabpilot_protocols::SurfaceId;

use crate::cdp::CdpError;

/// Surface registry errors.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Surface not found: {0}")]
    SurfaceNotFound(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error("Browser not connected")]
    NotConnected,

    #[error("Chrome not found. Please install Google Chrome.")]
    ChromeNotFound,

    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),
}

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::ConnectionFailed(msg) => BrowserError::ConnectionFailed(msg),
            CdpError::ChromeNotAvailable(msg) => BrowserError::ConnectionFailed(msg),
            CdpError::NavigationFailed(msg) => BrowserError::NavigationFailed(msg),
            CdpError::JavaScript(msg) => BrowserError::ActionFailed(format!("JS error: {}", msg)),
            CdpError::Timeout(msg) => BrowserError::ActionFailed(format!("Timeout: {}", msg)),
            CdpError::SessionClosed => BrowserError::NotConnected,
            _ => BrowserError::ActionFailed(e.to_string()),
        }
    }
}

/// Status of one surface as shown to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceStatus {
    pub id: SurfaceId,
    pub url: String,
    pub title: String,
    pub ready_state: String,
}

impl SurfaceStatus {
    pub fn is_complete(&self) -> bool {
        self.ready_state == "complete"
    }
}

/// Browser connection configuration.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    /// Chrome debugging port.
    pub debug_port: u16,
    /// Profile directory for persistent login state.
    pub profile_dir: Option<PathBuf>,
    /// Whether to run Chrome in headless mode.
    pub headless: bool,
    /// Launch Chrome when the port is not answering.
    pub launch: bool,
    /// Bound on shell-level navigation.
    pub navigation_timeout: Duration,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self::from(&BrowserConfig::default())
    }
}

impl From<&BrowserConfig> for SurfaceConfig {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            debug_port: config.debug_port,
            profile_dir: config
                .profile_dir
                .as_deref()
                .map(|p| PathBuf::from(ConfigLoader::expand_path(p))),
            headless: config.headless,
            launch: config.launch,
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
        }
    }
}

impl SurfaceConfig {
    /// Get the profile directory, falling back to `~/.tabpilot/browser-profile`.
    pub fn get_profile_dir(&self) -> PathBuf {
        self.profile_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".tabpilot")
                .join("browser-profile")
        })
    }

    /// Get the CDP endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.debug_port)
    }
}
