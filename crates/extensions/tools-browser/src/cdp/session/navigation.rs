//! Navigation operations for CDP page session.

use std::time::{Duration, Instant};

use serde_json::json;
use tracing::debug;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::DocumentState;

use super::core::PageSession;

const DOCUMENT_STATE_JS: &str =
    "({url: location.href, title: document.title, readyState: document.readyState})";

impl PageSession {
    /// Navigate to URL and wait until the document is interactive.
    pub async fn navigate(&self, url: &str, timeout: Duration) -> Result<String, CdpError> {
        let result = self
            .call("Page.navigate", Some(json!({"url": url})))
            .await?;

        if let Some(error) = result.get("errorText").and_then(|e| e.as_str()) {
            return Err(CdpError::NavigationFailed(error.to_string()));
        }

        let frame_id = result["frameId"].as_str().unwrap_or("main").to_string();

        self.wait_for_load(timeout).await?;

        debug!("Navigated to {}", url);
        Ok(frame_id)
    }

    /// Poll `document.readyState` until interactive or complete.
    pub async fn wait_for_load(&self, timeout: Duration) -> Result<(), CdpError> {
        let start = Instant::now();

        loop {
            // Evaluation fails while the old context is being torn down.
            if let Ok(state) = self.document_state().await {
                if state.ready_state == "complete" || state.ready_state == "interactive" {
                    return Ok(());
                }
            }

            if start.elapsed() > timeout {
                return Err(CdpError::Timeout("Page load timeout".to_string()));
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Current URL, title and ready state of the document.
    pub async fn document_state(&self) -> Result<DocumentState, CdpError> {
        let value = self
            .evaluate_with_timeout(DOCUMENT_STATE_JS, Duration::from_secs(5))
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}
